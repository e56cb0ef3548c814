use crate::traits::*;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Default time allowed for the TCP + WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the connection task needs, produced by the builder
///
/// The task owns this value. When the task exits the route senders are
/// dropped, which closes the handler channels and lets handler threads exit.
pub struct ClientConfig<R>
where
    R: MessageRouter,
{
    /// WebSocket URL (wss:// or ws://)
    pub(crate) url: String,

    /// Parses frames and picks their route
    pub(crate) router: Arc<R>,

    /// Channel senders mapped by route key
    pub(crate) route_senders: HashMap<R::RouteKey, crossbeam_channel::Sender<R::Message>>,

    /// Optional client heartbeat (interval, payload), sent only while open
    pub(crate) heartbeat: Option<(Duration, WsMessage)>,

    /// Upper bound on a single connection attempt
    pub(crate) connect_timeout: Duration,

    /// Delay policy between attempts
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,

    /// `true` while the owner wants the client running
    ///
    /// Clearing it stops the client at the next check: an open socket is
    /// closed and a pending reconnect is cancelled.
    pub(crate) shutdown_flag: Arc<AtomicBool>,
}

impl<R> ClientConfig<R>
where
    R: MessageRouter,
{
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn has_heartbeat(&self) -> bool {
        self.heartbeat.is_some()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Number of routes with a handler thread
    pub fn handler_count(&self) -> usize {
        self.route_senders.len()
    }
}
