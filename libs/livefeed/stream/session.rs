//! Subscription session for the live market stream
//!
//! Owns the symbol registry inside the connection task. Wire messages are
//! derived from registry transitions: a subscribe only for symbols going
//! 0→1, an unsubscribe only for 1→0, and a full replay after every
//! handshake.

use super::types::ControlMessage;
use crate::domain::SymbolSubscriptions;
use hypersockets::{SessionHandler, WsMessage};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum SessionRequest {
    Subscribe(Vec<String>),
    Unsubscribe(Vec<String>),
    /// Reply with the currently subscribed symbols
    Snapshot(oneshot::Sender<Vec<String>>),
}

#[derive(Debug, Default)]
pub struct SymbolSession {
    subscriptions: SymbolSubscriptions,
}

fn frames(message: Option<ControlMessage>) -> Vec<WsMessage> {
    let Some(message) = message else {
        return Vec::new();
    };

    match message.to_frame() {
        Ok(frame) => vec![frame],
        Err(e) => {
            warn!("[Live WS] Failed to encode control message: {}", e);
            Vec::new()
        }
    }
}

impl SymbolSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriptions(&self) -> &SymbolSubscriptions {
        &self.subscriptions
    }
}

impl SessionHandler for SymbolSession {
    type Request = SessionRequest;

    fn on_open(&mut self) -> Vec<WsMessage> {
        let symbols = self.subscriptions.snapshot();
        if !symbols.is_empty() {
            info!("[Live WS] Replaying {} subscriptions", symbols.len());
        }
        frames(ControlMessage::subscribe(symbols))
    }

    fn apply(&mut self, request: SessionRequest, connected: bool) -> Vec<WsMessage> {
        match request {
            SessionRequest::Subscribe(symbols) => {
                let added = self.subscriptions.acquire(symbols);
                if !connected {
                    debug!("[Live WS] Queued {} new symbols until connected", added.len());
                    return Vec::new();
                }
                frames(ControlMessage::subscribe(added))
            }
            SessionRequest::Unsubscribe(symbols) => {
                let removed = self.subscriptions.release(symbols);
                if !connected {
                    return Vec::new();
                }
                frames(ControlMessage::unsubscribe(removed))
            }
            SessionRequest::Snapshot(reply) => {
                let _ = reply.send(self.subscriptions.snapshot());
                Vec::new()
            }
        }
    }
}
