//! Monitor application state
//!
//! Every watchlist is an independent consumer: toggling one subscribes or
//! releases its symbols without touching symbols other watchlists still use.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use hypersockets::{ClientEvent, ConnectionState, Metrics};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::config::{LiveFeedConfig, WatchlistConfig};
use crate::domain::{normalize_symbol, LivePriceEntry, UpdateKind};
use crate::stream::LiveStream;

/// A consumer of live prices
#[derive(Debug, Clone)]
pub struct Watchlist {
    pub name: String,
    pub symbols: Vec<String>,
    pub active: bool,
}

impl Watchlist {
    fn from_config(config: &WatchlistConfig) -> Self {
        Self {
            name: config.name.clone(),
            symbols: config.symbols.iter().filter_map(|s| normalize_symbol(s)).collect(),
            active: false,
        }
    }
}

/// One line of the price table
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub symbol: String,
    /// Number of active watchlists showing this symbol
    pub watchers: usize,
    pub entry: Option<LivePriceEntry>,
}

/// Main application state
pub struct App {
    stream: Option<LiveStream>,
    pub watchlists: Vec<Watchlist>,
    pub selected_index: usize,
    pub should_quit: bool,
    /// Status message to show in footer
    pub status_message: Option<String>,
    shutdown_flag: Arc<AtomicBool>,
    runtime: Handle,
}

/// Watchlists from config, or a single one built from `symbols`
fn watchlists_from(config: &LiveFeedConfig) -> Vec<Watchlist> {
    if config.watchlists.is_empty() {
        return vec![Watchlist::from_config(&WatchlistConfig {
            name: "Watchlist".to_string(),
            symbols: config.symbols.clone(),
        })];
    }
    config.watchlists.iter().map(Watchlist::from_config).collect()
}

impl App {
    /// Start the stream and activate every watchlist
    pub async fn initialize(runtime: Handle, config: &LiveFeedConfig) -> Result<Self> {
        let shutdown_flag = Arc::new(AtomicBool::new(true));
        let stream = LiveStream::spawn(config, Arc::clone(&shutdown_flag)).await?;

        let mut app = Self {
            stream: Some(stream),
            watchlists: watchlists_from(config),
            selected_index: 0,
            should_quit: false,
            status_message: None,
            shutdown_flag,
            runtime,
        };

        for index in 0..app.watchlists.len() {
            app.set_active(index, true);
        }

        Ok(app)
    }

    pub fn stream(&self) -> Option<&LiveStream> {
        self.stream.as_ref()
    }

    fn set_active(&mut self, index: usize, active: bool) {
        let Some(watchlist) = self.watchlists.get_mut(index) else {
            return;
        };
        if watchlist.active == active {
            return;
        }
        watchlist.active = active;

        if let Some(stream) = &self.stream {
            if active {
                stream.subscribe(&watchlist.symbols);
            } else {
                stream.unsubscribe(&watchlist.symbols);
            }
        }
    }

    /// Navigate to next watchlist
    pub fn next_watchlist(&mut self) {
        if !self.watchlists.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.watchlists.len();
        }
    }

    /// Navigate to previous watchlist
    pub fn prev_watchlist(&mut self) {
        if !self.watchlists.is_empty() {
            self.selected_index = if self.selected_index == 0 {
                self.watchlists.len() - 1
            } else {
                self.selected_index - 1
            };
        }
    }

    /// Activate or release the selected watchlist
    pub fn toggle_selected(&mut self) {
        let index = self.selected_index;
        let Some(active) = self.watchlists.get(index).map(|w| w.active) else {
            return;
        };
        self.set_active(index, !active);

        let watchlist = &self.watchlists[index];
        let verb = if watchlist.active { "Watching" } else { "Released" };
        self.status_message = Some(format!("{} {}", verb, watchlist.name));
    }

    /// Symbols of all active watchlists, sorted, with their prices
    pub fn price_rows(&self) -> Vec<PriceRow> {
        let mut watchers: BTreeMap<&str, usize> = BTreeMap::new();
        for watchlist in self.watchlists.iter().filter(|w| w.active) {
            for symbol in &watchlist.symbols {
                *watchers.entry(symbol.as_str()).or_insert(0) += 1;
            }
        }

        let prices = self.stream.as_ref().map(|s| s.prices());
        let book = prices.as_ref().map(|p| p.read());

        watchers
            .into_iter()
            .map(|(symbol, watchers)| PriceRow {
                symbol: symbol.to_string(),
                watchers,
                entry: book.as_ref().and_then(|b| b.get(symbol)),
            })
            .collect()
    }

    /// Per category: relevant updates received and when the last arrived
    pub fn dashboard_summary(&self) -> Vec<(UpdateKind, u64, Option<DateTime<Utc>>)> {
        let Some(stream) = &self.stream else {
            return Vec::new();
        };
        let dashboard = stream.dashboard();
        let state = dashboard.read();

        UpdateKind::all()
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    state.update_count(kind),
                    state.latest(kind).map(|u| u.received_at),
                )
            })
            .collect()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.stream
            .as_ref()
            .map_or(ConnectionState::Unmounted, |s| s.connection_state())
    }

    pub fn metrics(&self) -> Option<Metrics> {
        self.stream.as_ref().map(|s| s.metrics())
    }

    pub fn feed_age(&self) -> Option<Duration> {
        let stream = self.stream.as_ref()?;
        let prices = stream.prices();
        let book = prices.read();
        (book.tick_count() > 0).then(|| book.age())
    }

    pub fn url(&self) -> String {
        self.stream
            .as_ref()
            .map(|s| s.url().to_string())
            .unwrap_or_default()
    }

    /// Turn pending client events into a footer message
    pub fn poll_events(&mut self) {
        let Some(stream) = &self.stream else {
            return;
        };
        while let Some(event) = stream.try_recv_event() {
            self.status_message = Some(match event {
                ClientEvent::Connected => "Connected".to_string(),
                ClientEvent::Disconnected => "Disconnected".to_string(),
                ClientEvent::Reconnecting(attempt) => format!("Reconnecting (attempt {})", attempt),
                ClientEvent::Error(err) => format!("Error: {}", err),
            });
        }
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) {
        info!("[Monitor] Shutting down...");
        self.shutdown_flag.store(false, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            if let Err(e) = self.runtime.block_on(stream.shutdown()) {
                warn!("[Monitor] Stream shutdown failed: {}", e);
            }
        }
    }
}
