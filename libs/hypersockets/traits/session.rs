//! Session-owned connection state
//!
//! A [`SessionHandler`] lives inside the connection task and is the only
//! place where per-connection state (typically the set of subscriptions) is
//! mutated. Callers never write to the socket directly: they submit
//! requests through the client, the task applies them to the session, and
//! the session decides what goes on the wire.
//!
//! Because the session is consulted again on every successful handshake,
//! replaying subscriptions after a reconnect needs no extra bookkeeping:
//! the replay is built from the same state the requests mutate.

use crate::WsMessage;
use std::fmt::Debug;

pub trait SessionHandler: Send + 'static {
    /// Requests accepted by [`WebSocketClient::request`](crate::WebSocketClient::request)
    type Request: Send + Debug + 'static;

    /// Frames to send immediately after every successful handshake
    fn on_open(&mut self) -> Vec<WsMessage>;

    /// Apply a request to the session state
    ///
    /// `connected` tells whether the socket is currently open. The returned
    /// frames are sent only when it is; while disconnected the state change
    /// alone is kept and picked up by the next `on_open`.
    fn apply(&mut self, request: Self::Request, connected: bool) -> Vec<WsMessage>;

    /// Called after the socket closed, for whatever reason
    fn on_close(&mut self) {}
}

/// Session with no state and no replay
#[derive(Debug, Default)]
pub struct NoSession;

impl SessionHandler for NoSession {
    type Request = ();

    fn on_open(&mut self) -> Vec<WsMessage> {
        Vec::new()
    }

    fn apply(&mut self, _request: (), _connected: bool) -> Vec<WsMessage> {
        Vec::new()
    }
}
