//! Message Routing System
//!
//! Inbound frames are parsed on the connection task in the order the
//! transport delivers them, then handed to the handler thread that owns the
//! message's route key.
//!
//! ```text
//! WebSocket → Router::parse → Route Key → Channel → Handler Thread
//!                    │             ↓
//!              (empty: drop)   Ticks   → TickHandler     (sequential)
//!                               Updates → UpdateHandler   (sequential)
//! ```
//!
//! # Ordering Guarantees
//!
//! - **Per-Route Sequential**: messages sharing a route key are handled in arrival order
//! - **Cross-Route Parallel**: different routes are handled on different threads
//! - **No backpressure**: unbounded crossbeam channels between the loop and handlers

use crate::{Result, WsMessage};
use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;

/// Parses raw frames into typed messages and decides where they go
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// enum Route {
///     Ticks,
///     Updates,
/// }
///
/// struct FeedRouter;
///
/// #[async_trait]
/// impl MessageRouter for FeedRouter {
///     type Message = FeedMessage;
///     type RouteKey = Route;
///
///     async fn parse(&self, message: WsMessage) -> Result<Vec<FeedMessage>> {
///         let Some(text) = message.as_text() else { return Ok(Vec::new()) };
///         Ok(FeedMessage::from_json(text).into_iter().collect())
///     }
///
///     fn route_key(&self, message: &FeedMessage) -> Route {
///         match message {
///             FeedMessage::Tick(_) => Route::Ticks,
///             _ => Route::Updates,
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait MessageRouter: Send + Sync + 'static {
    /// The parsed message type
    type Message: Send + Debug + 'static;

    /// The route key type (determines which handler processes the message)
    type RouteKey: Hash + Eq + Clone + Send + Sync + Debug + 'static;

    /// Parse a raw frame into zero or more messages
    ///
    /// * `Ok(messages)` - route each message in order; an empty vec drops
    ///   the frame silently (keepalives, irrelevant updates)
    /// * `Err(_)` - drop the frame and log the error
    ///
    /// Runs inline on the connection task, so it must not block.
    async fn parse(&self, message: WsMessage) -> Result<Vec<Self::Message>>;

    /// Extract the route key from a parsed message
    fn route_key(&self, message: &Self::Message) -> Self::RouteKey;
}

/// Processes the messages of one route sequentially
///
/// Each handler runs on its own OS thread. Handlers for different routes
/// run in parallel.
///
/// **Important**: `handle` runs outside the async runtime. Do blocking work
/// directly, do not await.
pub trait MessageHandler<M>: Send + 'static
where
    M: Send + Debug + 'static,
{
    /// Handle a parsed message
    ///
    /// # Errors
    /// Errors are logged and the handler keeps processing subsequent messages.
    fn handle(&mut self, message: M) -> Result<()>;
}
