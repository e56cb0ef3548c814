//! # HyperSockets Traits
//!
//! Core traits and types shared by the client, the builder and the
//! applications built on top of them:
//!
//! - **MessageRouter / MessageHandler**: parse inbound frames and process them per route
//! - **SessionHandler**: own per-connection subscription state and replay it on every open
//! - **ReconnectionStrategy**: control the delay between connection attempts
//!
//! ## Example
//!
//! ```rust,ignore
//! use hypersockets::*;
//!
//! struct EchoRouter;
//!
//! #[async_trait]
//! impl MessageRouter for EchoRouter {
//!     type Message = String;
//!     type RouteKey = ();
//!
//!     async fn parse(&self, message: WsMessage) -> Result<Vec<String>> {
//!         Ok(message.as_text().map(str::to_string).into_iter().collect())
//!     }
//!
//!     fn route_key(&self, _message: &String) {}
//! }
//! ```

pub mod error;
pub mod parser;
pub mod reconnect;
pub mod router;
pub mod session;

pub use error::{HyperSocketError, Result};
pub use parser::WsMessage;
pub use reconnect::{ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectionStrategy};
pub use router::{MessageHandler, MessageRouter};
pub use session::{NoSession, SessionHandler};
