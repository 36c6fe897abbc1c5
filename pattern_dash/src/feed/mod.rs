pub mod frame;
pub mod live;

pub use frame::{parse_frame, LiveFrame};
pub use live::{install_rustls_provider, run_live_feed};
