//! Router for the live market stream
//!
//! Runs inline on the connection task: filters keepalives, parses JSON,
//! expands batches, validates ticks and applies the relevance predicate.
//! Anything that fails here is dropped before it reaches a handler.

use super::types::{scope_field, FeedMessage, FeedRoute, TickUpdate};
use crate::domain::{SharedViewScope, UpdateKind, ViewScope};
use crate::infrastructure::throttle::ErrorThrottle;
use chrono::{DateTime, Utc};
use hypersockets::{MessageRouter, WsMessage};
use parking_lot::Mutex;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// True when the frame can hold a JSON object or array
///
/// Keepalive text such as `pong` and empty frames fail this check.
pub fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().chars().next(), Some('{') | Some('['))
}

/// Whether a scoped update matches what the view shows
pub fn is_relevant(scope: &ViewScope, kind: UpdateKind, message: &Value) -> bool {
    match kind {
        UpdateKind::TopPicks => scope.top_picks_relevant(
            scope_field(message, "universe"),
            scope_field(message, "primary_mode"),
        ),
        UpdateKind::MarketSummary | UpdateKind::Flows => {
            scope.region_relevant(scope_field(message, "region"))
        }
        UpdateKind::ScalpingMonitor => scope.scalping_relevant(scope_field(message, "universe")),
        UpdateKind::PortfolioMonitor => scope.portfolio_relevant(scope_field(message, "scope")),
    }
}

pub struct FeedRouter {
    scope: SharedViewScope,
    parse_errors: Mutex<ErrorThrottle>,
}

impl FeedRouter {
    pub fn new(scope: SharedViewScope, error_report_interval: Duration) -> Self {
        Self {
            scope,
            parse_errors: Mutex::new(ErrorThrottle::new(error_report_interval)),
        }
    }

    fn report_parse_failure(&self, error: &serde_json::Error) {
        let mut throttle = self.parse_errors.lock();
        if throttle.should_report() {
            let suppressed = throttle.take_suppressed();
            warn!(
                "[Live WS] Failed to parse message: {} ({} similar failures suppressed)",
                error, suppressed
            );
        }
    }

    /// Turn one JSON message into a routable message, if it is one
    fn dispatch(&self, message: &Value, received_at: DateTime<Utc>) -> Option<FeedMessage> {
        let Some(message_type) = message.get("type").and_then(Value::as_str) else {
            debug!("[Live WS] Message without type");
            return None;
        };

        if message_type == "tick" {
            let tick = TickUpdate::from_value(message, received_at);
            if tick.is_none() {
                debug!("[Live WS] Dropping malformed tick");
            }
            return tick.map(FeedMessage::Tick);
        }

        let Some(kind) = UpdateKind::from_message_type(message_type) else {
            debug!("[Live WS] Unknown message type: {}", message_type);
            return None;
        };

        if !is_relevant(&self.scope.read(), kind, message) {
            return None;
        }

        Some(FeedMessage::Scoped {
            kind,
            payload: message.clone(),
            received_at,
        })
    }

    /// Parse one text frame into routable messages, in frame order
    pub fn parse_text(&self, text: &str) -> Vec<FeedMessage> {
        if !looks_like_json(text) {
            return Vec::new();
        }

        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                self.report_parse_failure(&e);
                return Vec::new();
            }
        };

        let received_at = Utc::now();
        match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| self.dispatch(item, received_at))
                .collect(),
            other => self.dispatch(&other, received_at).into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl MessageRouter for FeedRouter {
    type Message = FeedMessage;
    type RouteKey = FeedRoute;

    async fn parse(&self, message: WsMessage) -> hypersockets::Result<Vec<Self::Message>> {
        Ok(match message.as_text() {
            Some(text) => self.parse_text(text),
            None => Vec::new(),
        })
    }

    fn route_key(&self, message: &Self::Message) -> Self::RouteKey {
        message.route()
    }
}
