//! Live price stream client
//!
//! One reconnecting WebSocket to the market push endpoint, shared by any
//! number of consumers through reference-counted symbol subscriptions.
//!
//! ```rust,ignore
//! let config = LiveFeedConfig::load("config/live_feed.yaml")?;
//! let shutdown = ShutdownManager::new();
//!
//! let stream = LiveStream::spawn(&config, shutdown.flag()).await?;
//! stream.subscribe(["TCS", "INFY"]);
//!
//! if let Some(entry) = stream.live_price("TCS") {
//!     println!("TCS {:.2}", entry.last_price);
//! }
//!
//! stream.shutdown().await?;
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod stream;

pub use application::App;
pub use config::{ConfigError, LiveFeedConfig, ReconnectConfig, ReconnectPolicy, WatchlistConfig};
pub use domain::{
    DashboardState, LivePriceBook, LivePriceEntry, PushedUpdate, SharedDashboard,
    SharedLivePrices, SymbolSubscriptions, UpdateKind, ViewScope,
};
pub use infrastructure::{init_tracing, resolve_ws_url, EndpointError, ErrorThrottle, ShutdownManager};
pub use stream::{log_client_event, LiveStream};
