//! Client core: builder, connection task, state machine
//!
//! ## Example
//!
//! ```rust,ignore
//! use hypersockets::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = hypersockets::builder()
//!         .url("wss://api.example.com/ws/market")
//!         .router(FeedRouter, |routing| {
//!             routing
//!                 .handler(Route::Ticks, TickHandler::new(prices))
//!                 .handler(Route::Updates, UpdateHandler::new(dashboard))
//!         })
//!         .session(SymbolSession::default())
//!         .reconnect_strategy(FixedDelay::new(Duration::from_secs(5), None))
//!         .build()
//!         .await?;
//!
//!     client.request(SessionRequest::Subscribe(vec!["TCS".into()]))?;
//!
//!     client.shutdown().await
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;

pub use builder::{states, RoutingBuilder, WebSocketClientBuilder};
pub use client::{ClientEvent, Metrics, WebSocketClient};
pub use config::ClientConfig;
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, Transition};

pub use crate::traits::*;

/// Start a new client builder
pub fn builder() -> WebSocketClientBuilder<states::NoUrl, states::NoRouter, NoSession> {
    WebSocketClientBuilder::new()
}
