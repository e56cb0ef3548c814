//! Live Price Book
//!
//! Latest tick per symbol, written by the tick handler thread and read by
//! any number of consumers.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

// =============================================================================
// SharedLivePrices
// =============================================================================

/// Shared price book accessible by handlers and consumers
pub type SharedLivePrices = Arc<RwLock<LivePriceBook>>;

// =============================================================================
// LivePriceEntry
// =============================================================================

/// Most recent tick for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePriceEntry {
    pub last_price: f64,

    pub change_percent: Option<f64>,

    pub volume: Option<u64>,

    /// ISO-8601 timestamp, as sent by the server or stamped on receipt
    pub timestamp: String,
}

// =============================================================================
// FeedHealth
// =============================================================================

/// Health of the tick feed as a whole
#[derive(Debug)]
pub struct FeedHealth {
    /// When we last accepted any tick
    pub last_update: Instant,

    /// Total number of accepted ticks
    pub tick_count: u64,
}

impl Default for FeedHealth {
    fn default() -> Self {
        Self {
            last_update: Instant::now(),
            tick_count: 0,
        }
    }
}

impl FeedHealth {
    pub fn record_update(&mut self) {
        self.last_update = Instant::now();
        self.tick_count += 1;
    }

    pub fn time_since_update(&self) -> Duration {
        self.last_update.elapsed()
    }
}

// =============================================================================
// LivePriceBook
// =============================================================================

/// Symbol -> latest entry. Entries are replaced wholesale and never evicted.
#[derive(Debug, Default)]
pub struct LivePriceBook {
    prices: HashMap<String, LivePriceEntry>,
    health: FeedHealth,
}

impl LivePriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedLivePrices {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Replace the entry for `symbol`
    pub fn update(&mut self, symbol: &str, entry: LivePriceEntry) {
        self.health.record_update();
        self.prices.insert(symbol.to_uppercase(), entry);
    }

    pub fn get(&self, symbol: &str) -> Option<LivePriceEntry> {
        self.prices.get(&symbol.trim().to_uppercase()).cloned()
    }

    /// Symbols that have received at least one tick, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.prices.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Time since the last accepted tick (or since creation)
    pub fn age(&self) -> Duration {
        self.health.time_since_update()
    }

    /// At least one tick received and the latest is younger than `max_age`
    pub fn is_healthy(&self, max_age: Duration) -> bool {
        self.health.tick_count > 0 && self.age() < max_age
    }

    pub fn tick_count(&self) -> u64 {
        self.health.tick_count
    }
}
