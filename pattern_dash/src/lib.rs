//! Headless dashboard over the `patternscan` client: single-flight
//! refreshes, a live push feed, watchlist, filter presets, CSV export and
//! persisted state, all driven through one reducer.

pub mod app;
pub mod cli;
pub mod debug_hooks;
pub mod export;
pub mod feed;
pub mod persist;
pub mod presets;
pub mod refresh;
pub mod settings;
pub mod watchlist;
