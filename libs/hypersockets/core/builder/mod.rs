pub mod states;

use crate::client::WebSocketClient;
use crate::config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT};
use crate::traits::*;
use crossbeam_channel::{Receiver, Sender};
use states::*;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error};

/// Type-state builder for [`WebSocketClient`]
///
/// URL and router are required and enforced at compile time. The session
/// defaults to [`NoSession`] and the reconnection strategy to an unlimited
/// 5 second [`FixedDelay`].
pub struct WebSocketClientBuilder<U, Ro, S>
where
    U: UrlState,
    Ro: RouterState,
    S: SessionHandler,
{
    url: U,
    router: Ro,
    session: S,
    heartbeat: Option<(Duration, WsMessage)>,
    connect_timeout: Duration,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl WebSocketClientBuilder<NoUrl, NoRouter, NoSession> {
    pub fn new() -> Self {
        Self {
            url: NoUrl,
            router: NoRouter,
            session: NoSession,
            heartbeat: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_strategy: None,
            shutdown_flag: None,
        }
    }
}

impl Default for WebSocketClientBuilder<NoUrl, NoRouter, NoSession> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ro, S> WebSocketClientBuilder<NoUrl, Ro, S>
where
    Ro: RouterState,
    S: SessionHandler,
{
    pub fn url(self, url: impl Into<String>) -> WebSocketClientBuilder<HasUrl, Ro, S> {
        WebSocketClientBuilder {
            url: HasUrl(url.into()),
            router: self.router,
            session: self.session,
            heartbeat: self.heartbeat,
            connect_timeout: self.connect_timeout,
            reconnect_strategy: self.reconnect_strategy,
            shutdown_flag: self.shutdown_flag,
        }
    }
}

impl<U, S> WebSocketClientBuilder<U, NoRouter, S>
where
    U: UrlState,
    S: SessionHandler,
{
    /// Set the router and register one handler per route key
    pub fn router<R, F>(
        self,
        router: R,
        configure_routing: F,
    ) -> WebSocketClientBuilder<U, HasRouter<R>, S>
    where
        R: MessageRouter,
        F: FnOnce(RoutingBuilder<R>) -> RoutingBuilder<R>,
    {
        let routing = configure_routing(RoutingBuilder::new());

        WebSocketClientBuilder {
            url: self.url,
            router: HasRouter { router, routing },
            session: self.session,
            heartbeat: self.heartbeat,
            connect_timeout: self.connect_timeout,
            reconnect_strategy: self.reconnect_strategy,
            shutdown_flag: self.shutdown_flag,
        }
    }
}

impl<U, Ro, S> WebSocketClientBuilder<U, Ro, S>
where
    U: UrlState,
    Ro: RouterState,
    S: SessionHandler,
{
    /// Replace the session that owns subscription state
    pub fn session<S2>(self, session: S2) -> WebSocketClientBuilder<U, Ro, S2>
    where
        S2: SessionHandler,
    {
        WebSocketClientBuilder {
            url: self.url,
            router: self.router,
            session,
            heartbeat: self.heartbeat,
            connect_timeout: self.connect_timeout,
            reconnect_strategy: self.reconnect_strategy,
            shutdown_flag: self.shutdown_flag,
        }
    }

    /// Send `payload` every `interval` while the socket is open
    pub fn heartbeat(mut self, interval: Duration, payload: WsMessage) -> Self {
        self.heartbeat = Some((interval, payload));
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    /// Share a running flag with other components
    ///
    /// Storing `false` stops the client: the socket is closed and a pending
    /// reconnect is cancelled. Handler threads finish what was already routed
    /// and exit. The client itself never writes the flag.
    ///
    /// ```ignore
    /// let running = Arc::new(AtomicBool::new(true));
    /// let client = hypersockets::builder()
    ///     .url("wss://api.example.com/ws")
    ///     .router(MyRouter, |routing| routing.handler(Route::Main, MyHandler))
    ///     .shutdown_flag(Arc::clone(&running))
    ///     .build()
    ///     .await?;
    ///
    /// running.store(false, Ordering::Release);
    /// ```
    pub fn shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }
}

impl<R, S> WebSocketClientBuilder<HasUrl, HasRouter<R>, S>
where
    R: MessageRouter,
    S: SessionHandler,
{
    /// Spawn handler threads and the connection task
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn build(self) -> Result<WebSocketClient<R, S>> {
        let HasUrl(url) = self.url;
        if url.is_empty() {
            return Err(HyperSocketError::Configuration("URL cannot be empty".into()));
        }

        let shutdown_flag = self
            .shutdown_flag
            .unwrap_or_else(|| Arc::new(AtomicBool::new(true)));

        let reconnect_strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(FixedDelay::new(Duration::from_secs(5), None)));

        let HasRouter { router, routing } = self.router;
        let (route_senders, handler_handles) = routing.spawn();

        let config = ClientConfig {
            url,
            router: Arc::new(router),
            route_senders,
            heartbeat: self.heartbeat,
            connect_timeout: self.connect_timeout,
            reconnect_strategy,
            shutdown_flag,
        };

        Ok(WebSocketClient::spawn(config, self.session, handler_handles))
    }
}

type HandlerSlot<M> = (Sender<M>, Receiver<M>, Box<dyn MessageHandler<M>>);

/// Collects one handler per route key
pub struct RoutingBuilder<R>
where
    R: MessageRouter,
{
    handlers: HashMap<R::RouteKey, HandlerSlot<R::Message>>,
}

impl<R> RoutingBuilder<R>
where
    R: MessageRouter,
{
    fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Add a handler for a specific route key
    pub fn handler<H>(mut self, route_key: R::RouteKey, handler: H) -> Self
    where
        H: MessageHandler<R::Message>,
    {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.handlers
            .insert(route_key, (sender, receiver, Box::new(handler)));
        self
    }

    pub fn route_count(&self) -> usize {
        self.handlers.len()
    }

    /// Start one OS thread per handler
    fn spawn(self) -> (HashMap<R::RouteKey, Sender<R::Message>>, Vec<JoinHandle<()>>) {
        let mut senders = HashMap::with_capacity(self.handlers.len());
        let mut handles = Vec::with_capacity(self.handlers.len());

        for (route_key, (sender, receiver, mut handler)) in self.handlers {
            senders.insert(route_key.clone(), sender);
            // Exits once the connection task drops its senders, after
            // everything already routed has been handled.
            handles.push(std::thread::spawn(move || {
                for message in receiver.iter() {
                    if let Err(e) = handler.handle(message) {
                        error!("Handler error for route {:?}: {}", route_key, e);
                    }
                }
                debug!("Handler channel closed for route {:?}, thread exiting", route_key);
            }));
        }

        (senders, handles)
    }
}
