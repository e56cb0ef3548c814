//! # HyperSockets
//!
//! A modular, reconnecting WebSocket client.
//!
//! ## Features
//!
//! - **Explicit lifecycle**: `Connecting → Open → Closed → Connecting`, terminal `Unmounted`
//! - **Session replay**: per-connection state is re-sent after every handshake
//! - **Type-state builder**: URL and router are enforced at compile time
//! - **Ordered routing**: frames are parsed in arrival order and handled per route on dedicated threads
//! - **Pluggable reconnection**: fixed delay, exponential backoff or none

pub mod core;
pub mod traits;

pub use traits::*;

pub use self::core::{
    builder, client, config, connection_state,
    builder::{states, RoutingBuilder, WebSocketClientBuilder},
    client::{ClientEvent, Metrics, WebSocketClient},
    config::ClientConfig,
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, Transition},
};
