//! Asynchronous client for a pattern-scan backend.
//!
//! [`PatternClient`] issues a filtered GET against the scan endpoint, bounds
//! every attempt with a timeout, classifies the outcome as transient or
//! terminal and retries transient failures with exponential backoff.
//!
//! ```no_run
//! use patternscan::{ClientConfig, PatternClient, PatternFilters};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_file("patternscan.toml").await?;
//! let client = PatternClient::http(&config)?;
//! let filters = PatternFilters::default()
//!     .with_universe("sp500")
//!     .with_symbols(["AAPL", "MSFT"]);
//! let patterns = client.fetch_patterns(&filters).await?;
//! println!("{} patterns", patterns.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod query;
pub mod retry;
mod telemetry;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, PatternsConfig};
pub use error::{ConfigError, FetchError, FetchErrorKind, TransientFailure, TransportError};
pub use fetch::PatternClient;
pub use query::PatternFilters;
pub use retry::{MalformedBodyPolicy, RetryPolicy};
pub use transport::{HttpTransport, RawResponse, Transport};
pub use types::PatternRecord;

/// URL type taken by [`Transport::get`].
pub use reqwest::Url;
