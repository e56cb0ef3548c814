//! Live stream facade
//!
//! Owns the reconnecting socket, the subscription session and the shared
//! view state. Consumers only ever call `subscribe`, `unsubscribe` and read
//! the shared maps; transport and payload failures never reach them.

use super::handlers::{DashboardHandler, TickHandler};
use super::router::FeedRouter;
use super::session::{SessionRequest, SymbolSession};
use super::types::FeedRoute;
use crate::config::LiveFeedConfig;
use crate::domain::{
    DashboardState, LivePriceBook, LivePriceEntry, SharedDashboard, SharedLivePrices,
    SharedViewScope, ViewScope,
};
use anyhow::Result;
use hypersockets::{ClientEvent, ConnectionState, Metrics, WebSocketClient, WsMessage};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

/// Text payload of client heartbeats
pub const HEARTBEAT_PAYLOAD: &str = "ping";

/// Log a client event with the stream prefix
///
/// Returns whether the stream is considered connected afterwards.
pub fn log_client_event(event: &ClientEvent) -> bool {
    match event {
        ClientEvent::Connected => {
            info!("[Live WS] Connected to market stream");
            true
        }
        ClientEvent::Disconnected => {
            warn!("[Live WS] Disconnected from market stream");
            false
        }
        ClientEvent::Reconnecting(attempt) => {
            info!("[Live WS] Reconnecting (attempt {})", attempt);
            false
        }
        ClientEvent::Error(err) => {
            warn!("[Live WS] Error: {}", err);
            false
        }
    }
}

fn owned_symbols<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    symbols
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect()
}

pub struct LiveStream {
    client: WebSocketClient<FeedRouter, SymbolSession>,
    prices: SharedLivePrices,
    dashboard: SharedDashboard,
    scope: SharedViewScope,
    url: Url,
}

impl LiveStream {
    /// Resolve the endpoint and start the connection task
    ///
    /// Returns as soon as the task is running; the first connection attempt
    /// happens in the background. Storing `false` in `shutdown_flag`
    /// unmounts the stream. The stream never writes the flag, so several
    /// streams can share the process-wide one.
    pub async fn spawn(config: &LiveFeedConfig, shutdown_flag: Arc<AtomicBool>) -> Result<Self> {
        let url = config.ws_url()?;
        let prices = LivePriceBook::shared();
        let dashboard = DashboardState::shared();
        let scope = config.scope.clone().shared();

        let router = FeedRouter::new(Arc::clone(&scope), config.error_report_interval());
        let tick_handler = TickHandler::new(Arc::clone(&prices));
        let dashboard_handler = DashboardHandler::new(Arc::clone(&dashboard));

        info!("[Live WS] Connecting to: {}", url);

        let mut builder = hypersockets::builder()
            .url(url.as_str())
            .router(router, move |routing| {
                routing
                    .handler(FeedRoute::Ticks, tick_handler)
                    .handler(FeedRoute::Dashboard, dashboard_handler)
            })
            .session(SymbolSession::new())
            .connect_timeout(config.connect_timeout())
            .reconnect_strategy(config.reconnect.build_strategy())
            .shutdown_flag(shutdown_flag);

        if let Some(interval) = config.heartbeat_interval() {
            builder = builder.heartbeat(interval, WsMessage::from(HEARTBEAT_PAYLOAD));
        }

        let client = builder.build().await?;

        Ok(Self {
            client,
            prices,
            dashboard,
            scope,
            url,
        })
    }

    fn request(&self, request: SessionRequest) {
        if let Err(e) = self.client.request(request) {
            debug!("[Live WS] Request dropped: {}", e);
        }
    }

    /// Register interest in `symbols`
    ///
    /// Only symbols nobody else is watching go on the wire. Never blocks.
    pub fn subscribe<I, S>(&self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = owned_symbols(symbols);
        if !symbols.is_empty() {
            self.request(SessionRequest::Subscribe(symbols));
        }
    }

    /// Drop interest in `symbols`
    ///
    /// The server is told only once the last consumer of a symbol leaves.
    pub fn unsubscribe<I, S>(&self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = owned_symbols(symbols);
        if !symbols.is_empty() {
            self.request(SessionRequest::Unsubscribe(symbols));
        }
    }

    pub fn live_price(&self, symbol: &str) -> Option<LivePriceEntry> {
        self.prices.read().get(symbol)
    }

    pub fn prices(&self) -> SharedLivePrices {
        Arc::clone(&self.prices)
    }

    pub fn dashboard(&self) -> SharedDashboard {
        Arc::clone(&self.dashboard)
    }

    /// Change what scoped updates count as relevant, from the next frame on
    pub fn set_view_scope(&self, scope: ViewScope) {
        *self.scope.write() = scope;
    }

    pub fn view_scope(&self) -> ViewScope {
        self.scope.read().clone()
    }

    /// Symbols currently subscribed, sorted
    ///
    /// Empty once the stream has been shut down.
    pub async fn subscribed_symbols(&self) -> Vec<String> {
        let (tx, rx) = oneshot::channel();
        self.request(SessionRequest::Snapshot(tx));
        rx.await.unwrap_or_default()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.client.connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn metrics(&self) -> Metrics {
        self.client.metrics()
    }

    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.client.try_recv_event()
    }

    /// Close the socket and stop reconnecting
    pub async fn shutdown(self) -> Result<()> {
        info!("[Live WS] Unmounting market stream");
        self.client.shutdown().await?;
        Ok(())
    }
}
