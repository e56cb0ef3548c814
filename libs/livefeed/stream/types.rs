//! Live market stream message types
//!
//! Outbound control messages are typed serde structs. Inbound pushes are
//! only partially specified by the backend, so they are read from a
//! `serde_json::Value` and only the well-known fields are extracted.

use crate::domain::{LivePriceEntry, UpdateKind};
use chrono::{DateTime, SecondsFormat, Utc};
use hypersockets::WsMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// ControlMessage - client -> server
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Subscribe,
    Unsubscribe,
}

/// Subscription change sent to the server
///
/// Example JSON:
/// ```json
/// { "action": "subscribe", "symbols": ["TCS", "INFY"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub action: ControlAction,
    pub symbols: Vec<String>,
}

impl ControlMessage {
    /// `None` for an empty symbol list, which is never sent
    pub fn subscribe(symbols: Vec<String>) -> Option<Self> {
        Self::new(ControlAction::Subscribe, symbols)
    }

    pub fn unsubscribe(symbols: Vec<String>) -> Option<Self> {
        Self::new(ControlAction::Unsubscribe, symbols)
    }

    fn new(action: ControlAction, symbols: Vec<String>) -> Option<Self> {
        if symbols.is_empty() {
            None
        } else {
            Some(Self { action, symbols })
        }
    }

    pub fn to_frame(&self) -> serde_json::Result<WsMessage> {
        serde_json::to_string(self).map(WsMessage::Text)
    }
}

// =============================================================================
// TickUpdate - server -> client
// =============================================================================

/// A validated tick
///
/// Example JSON:
/// ```json
/// {
///     "type": "tick",
///     "symbol": "TCS",
///     "data": {
///         "last_price": 3521.4,
///         "change_percent": 0.82,
///         "volume": 1203344,
///         "timestamp": "2024-05-02T09:31:07Z"
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TickUpdate {
    /// Upper-cased symbol
    pub symbol: String,
    pub entry: LivePriceEntry,
}

/// Finite number from a JSON number or numeric string
fn finite_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn non_negative_integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64)
        .map(|v| v as u64)
}

impl TickUpdate {
    /// Validate a `tick` message
    ///
    /// Returns `None` unless `symbol` is a non-empty string and
    /// `data.last_price` is numeric. A missing `data.timestamp` is filled
    /// with `received_at`.
    pub fn from_value(message: &Value, received_at: DateTime<Utc>) -> Option<Self> {
        let symbol = message
            .get("symbol")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())?
            .to_uppercase();

        let data = message.get("data")?;
        let last_price = data.get("last_price").and_then(finite_number)?;

        let timestamp = data
            .get("timestamp")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| received_at.to_rfc3339_opts(SecondsFormat::Millis, true));

        Some(Self {
            symbol,
            entry: LivePriceEntry {
                last_price,
                change_percent: data.get("change_percent").and_then(finite_number),
                volume: data.get("volume").and_then(non_negative_integer),
                timestamp,
            },
        })
    }
}

// =============================================================================
// FeedMessage - routed to handlers
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Tick(TickUpdate),
    /// Scoped dashboard update that passed the relevance check
    Scoped {
        kind: UpdateKind,
        payload: Value,
        received_at: DateTime<Utc>,
    },
}

/// Route keys for message handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedRoute {
    Ticks,
    Dashboard,
}

impl FeedMessage {
    pub fn route(&self) -> FeedRoute {
        match self {
            FeedMessage::Tick(_) => FeedRoute::Ticks,
            FeedMessage::Scoped { .. } => FeedRoute::Dashboard,
        }
    }
}

/// Read a scope field from the message, falling back to its `data` object
pub fn scope_field<'a>(message: &'a Value, field: &str) -> Option<&'a str> {
    message
        .get(field)
        .or_else(|| message.get("data").and_then(|data| data.get(field)))
        .and_then(Value::as_str)
}
