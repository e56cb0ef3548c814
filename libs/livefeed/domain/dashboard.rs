//! Latest relevant scoped update per dashboard category

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type SharedDashboard = Arc<RwLock<DashboardState>>;

/// Categories of scoped server pushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    TopPicks,
    MarketSummary,
    Flows,
    ScalpingMonitor,
    PortfolioMonitor,
}

impl UpdateKind {
    pub fn all() -> [UpdateKind; 5] {
        [
            UpdateKind::TopPicks,
            UpdateKind::MarketSummary,
            UpdateKind::Flows,
            UpdateKind::ScalpingMonitor,
            UpdateKind::PortfolioMonitor,
        ]
    }

    /// Wire value of the message `type` field
    pub fn message_type(&self) -> &'static str {
        match self {
            UpdateKind::TopPicks => "top_picks_update",
            UpdateKind::MarketSummary => "market_summary_update",
            UpdateKind::Flows => "flows_update",
            UpdateKind::ScalpingMonitor => "scalping_monitor_update",
            UpdateKind::PortfolioMonitor => "portfolio_monitor_update",
        }
    }

    pub fn from_message_type(message_type: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|kind| kind.message_type() == message_type)
    }
}

/// A relevant push as stored for the view
#[derive(Debug, Clone, PartialEq)]
pub struct PushedUpdate {
    /// Full message as received
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Slot {
    latest: Option<PushedUpdate>,
    count: u64,
}

#[derive(Debug, Default)]
pub struct DashboardState {
    top_picks: Slot,
    market_summary: Slot,
    flows: Slot,
    scalping_monitor: Slot,
    portfolio_monitor: Slot,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedDashboard {
        Arc::new(RwLock::new(Self::new()))
    }

    fn slot(&self, kind: UpdateKind) -> &Slot {
        match kind {
            UpdateKind::TopPicks => &self.top_picks,
            UpdateKind::MarketSummary => &self.market_summary,
            UpdateKind::Flows => &self.flows,
            UpdateKind::ScalpingMonitor => &self.scalping_monitor,
            UpdateKind::PortfolioMonitor => &self.portfolio_monitor,
        }
    }

    fn slot_mut(&mut self, kind: UpdateKind) -> &mut Slot {
        match kind {
            UpdateKind::TopPicks => &mut self.top_picks,
            UpdateKind::MarketSummary => &mut self.market_summary,
            UpdateKind::Flows => &mut self.flows,
            UpdateKind::ScalpingMonitor => &mut self.scalping_monitor,
            UpdateKind::PortfolioMonitor => &mut self.portfolio_monitor,
        }
    }

    pub fn record(&mut self, kind: UpdateKind, update: PushedUpdate) {
        let slot = self.slot_mut(kind);
        slot.latest = Some(update);
        slot.count += 1;
    }

    pub fn latest(&self, kind: UpdateKind) -> Option<&PushedUpdate> {
        self.slot(kind).latest.as_ref()
    }

    /// Number of relevant updates stored for `kind` so far
    pub fn update_count(&self, kind: UpdateKind) -> u64 {
        self.slot(kind).count
    }
}
