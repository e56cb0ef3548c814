//! Handlers that apply routed messages to shared view state
//!
//! Each runs on its own handler thread, so locks are held only for the
//! duration of a single write.

use super::types::FeedMessage;
use crate::domain::{PushedUpdate, SharedDashboard, SharedLivePrices};
use hypersockets::MessageHandler;
use tracing::debug;

/// Log every Nth tick at debug level
const TICK_LOG_INTERVAL: u64 = 1000;

pub struct TickHandler {
    prices: SharedLivePrices,
    message_count: u64,
}

impl TickHandler {
    pub fn new(prices: SharedLivePrices) -> Self {
        Self {
            prices,
            message_count: 0,
        }
    }
}

impl MessageHandler<FeedMessage> for TickHandler {
    fn handle(&mut self, message: FeedMessage) -> hypersockets::Result<()> {
        let tick = match message {
            FeedMessage::Tick(tick) => tick,
            other => {
                debug!("[Live WS] Tick handler ignoring {:?}", other.route());
                return Ok(());
            }
        };

        self.message_count += 1;
        if self.message_count % TICK_LOG_INTERVAL == 0 {
            debug!(
                "[Live WS] {} = {:.2} (count: {})",
                tick.symbol, tick.entry.last_price, self.message_count
            );
        }

        self.prices.write().update(&tick.symbol, tick.entry);
        Ok(())
    }
}

pub struct DashboardHandler {
    dashboard: SharedDashboard,
}

impl DashboardHandler {
    pub fn new(dashboard: SharedDashboard) -> Self {
        Self { dashboard }
    }
}

impl MessageHandler<FeedMessage> for DashboardHandler {
    fn handle(&mut self, message: FeedMessage) -> hypersockets::Result<()> {
        match message {
            FeedMessage::Scoped {
                kind,
                payload,
                received_at,
            } => {
                debug!("[Live WS] {} received", kind.message_type());
                self.dashboard.write().record(
                    kind,
                    PushedUpdate {
                        payload,
                        received_at,
                    },
                );
            }
            other => debug!("[Live WS] Dashboard handler ignoring {:?}", other.route()),
        }
        Ok(())
    }
}
