use crate::config::ClientConfig;
use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, Transition};
use crate::traits::*;
use crossbeam_channel::{Receiver, Sender};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

/// How often the task re-checks the external shutdown flag
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Events buffered for observers before the oldest are dropped
const EVENT_BUFFER: usize = 256;

/// Commands from the client handle to the connection task
#[derive(Debug)]
enum ClientCommand<Q> {
    /// Send a raw frame if the socket is open
    Send(WsMessage),
    /// Apply a request to the session
    Request(Q),
    /// Close the socket and stop reconnecting
    Shutdown,
}

/// Connection lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Handshake completed
    Connected,
    /// Open socket was lost
    Disconnected,
    /// About to start reconnection attempt `n` (1-based)
    Reconnecting(usize),
    /// Connect or transport error
    Error(String),
}

/// Client metrics snapshot
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

/// How an open connection ended
enum SessionEnd {
    /// Peer closed, stream ended or transport failed
    Dropped(String),
    /// Owner asked the client to stop
    Shutdown,
}

/// How a wait (connect or reconnect delay) ended
enum WaitOutcome<T> {
    Ready(T),
    Shutdown,
}

/// Reconnecting WebSocket client with routing and session replay
///
/// A single Tokio task owns the socket and the [`SessionHandler`]. The
/// handle only talks to it through a command channel, so sending,
/// subscribing and shutting down never block and never race the socket.
///
/// Dropping the handle stops the client as if `shutdown` had been called,
/// without waiting for the task.
pub struct WebSocketClient<R, S>
where
    R: MessageRouter,
    S: SessionHandler,
{
    url: String,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    command_tx: mpsc::UnboundedSender<ClientCommand<S::Request>>,
    event_rx: Receiver<ClientEvent>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
    handler_handles: Vec<std::thread::JoinHandle<()>>,
    shutdown_flag: Arc<AtomicBool>,
    _router: PhantomData<fn() -> R>,
}

impl<R, S> WebSocketClient<R, S>
where
    R: MessageRouter,
    S: SessionHandler,
{
    /// Start the connection task. Called by the builder.
    pub(crate) fn spawn(
        config: ClientConfig<R>,
        session: S,
        handler_handles: Vec<std::thread::JoinHandle<()>>,
    ) -> Self {
        let url = config.url.clone();
        let shutdown_flag = Arc::clone(&config.shutdown_flag);
        let state = Arc::new(AtomicConnectionState::new(ConnectionState::Connecting));
        let metrics = Arc::new(AtomicMetrics::new());

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = crossbeam_channel::bounded(EVENT_BUFFER);

        let task_handle = {
            let state = Arc::clone(&state);
            let metrics = Arc::clone(&metrics);

            tokio::spawn(async move {
                run_client(config, session, state, metrics, command_rx, event_tx).await;
            })
        };

        Self {
            url,
            state,
            metrics,
            command_tx,
            event_rx,
            task_handle: Some(task_handle),
            handler_handles,
            shutdown_flag,
            _router: PhantomData,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queue a raw frame; dropped if the socket is not open when it is processed
    pub fn send(&self, message: WsMessage) -> Result<()> {
        self.command_tx
            .send(ClientCommand::Send(message))
            .map_err(|e| HyperSocketError::ChannelSend(e.to_string()))
    }

    /// Queue a request for the session
    ///
    /// Requests are applied in submission order whether or not the socket is
    /// open; the session decides what, if anything, is sent.
    pub fn request(&self, request: S::Request) -> Result<()> {
        self.command_tx
            .send(ClientCommand::Request(request))
            .map_err(|e| HyperSocketError::ChannelSend(e.to_string()))
    }

    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_open()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            reconnect_count: self.metrics.reconnect_count(),
            connection_state: self.state.get(),
        }
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event, blocking the current thread for at most `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// The running flag the connection task watches
    ///
    /// The client only reads it; clearing it is up to the owner.
    pub fn shutdown_flag(&self) -> &Arc<AtomicBool> {
        &self.shutdown_flag
    }

    /// Close the socket, cancel any pending reconnect and join all workers
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down WebSocket client for {}", self.url);

        let _ = self.command_tx.send(ClientCommand::Shutdown);

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| HyperSocketError::Other(format!("connection task failed: {}", e)))?;
        }

        // The task dropped the route senders on exit, so handler threads
        // drain what is queued and stop.
        let handles = std::mem::take(&mut self.handler_handles);
        debug!("Waiting for {} handler threads to complete", handles.len());
        tokio::task::spawn_blocking(move || {
            for handle in handles {
                let _ = handle.join();
            }
        })
        .await
        .map_err(|e| HyperSocketError::Other(format!("handler join failed: {}", e)))?;

        info!("WebSocket client stopped");
        Ok(())
    }
}

impl<R, S> Drop for WebSocketClient<R, S>
where
    R: MessageRouter,
    S: SessionHandler,
{
    fn drop(&mut self) {
        if self.task_handle.is_some() {
            let _ = self.command_tx.send(ClientCommand::Shutdown);
        }
    }
}

#[inline]
fn is_running(flag: &AtomicBool) -> bool {
    flag.load(Ordering::Acquire)
}

fn emit(event_tx: &Sender<ClientEvent>, event: ClientEvent) {
    if event_tx.try_send(event).is_err() {
        debug!("Event buffer full or unobserved, dropping event");
    }
}

fn transition(state: &AtomicConnectionState, t: Transition) {
    if let Err(e) = state.apply(t) {
        warn!("{}", e);
    }
}

fn shutdown_ticker() -> Interval {
    let mut ticker = tokio::time::interval(SHUTDOWN_POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Main connection task: connect, stream, wait, repeat
async fn run_client<R, S>(
    config: ClientConfig<R>,
    mut session: S,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    mut command_rx: mpsc::UnboundedReceiver<ClientCommand<S::Request>>,
    event_tx: Sender<ClientEvent>,
) where
    R: MessageRouter,
    S: SessionHandler,
{
    let mut attempt: usize = 0;

    loop {
        if !is_running(&config.shutdown_flag) {
            debug!("Shutdown flag cleared, exiting main loop");
            break;
        }

        if attempt > 0 {
            emit(&event_tx, ClientEvent::Reconnecting(attempt));
        }

        let connecting = connect_with_timeout(&config.url, config.connect_timeout);
        let connected = match while_disconnected(connecting, &config, &mut session, &mut command_rx).await {
            WaitOutcome::Ready(result) => result,
            WaitOutcome::Shutdown => break,
        };

        match connected {
            Ok(ws_stream) => {
                info!("Connected to {}", config.url);
                transition(&state, Transition::Opened);
                emit(&event_tx, ClientEvent::Connected);
                attempt = 0;

                let outcome =
                    handle_connection(ws_stream, &config, &mut session, &metrics, &mut command_rx)
                        .await;
                session.on_close();

                match outcome {
                    Ok(SessionEnd::Shutdown) => break,
                    Ok(SessionEnd::Dropped(reason)) => warn!("Connection to {} closed: {}", config.url, reason),
                    Err(e) => {
                        warn!("Connection to {} failed: {}", config.url, e);
                        emit(&event_tx, ClientEvent::Error(e.to_string()));
                    }
                }

                transition(&state, Transition::Dropped);
                emit(&event_tx, ClientEvent::Disconnected);
            }
            Err(e) => {
                warn!("Failed to connect to {}: {}", config.url, e);
                emit(&event_tx, ClientEvent::Error(e.to_string()));
                transition(&state, Transition::Dropped);
            }
        }

        let Some(delay) = config.reconnect_strategy.next_delay(attempt) else {
            warn!("Reconnection strategy exhausted after {} attempts, stopping", attempt);
            break;
        };

        info!("Reconnecting in {:?} (attempt {})", delay, attempt + 1);
        let waiting = tokio::time::sleep(delay);
        if let WaitOutcome::Shutdown =
            while_disconnected(waiting, &config, &mut session, &mut command_rx).await
        {
            break;
        }

        attempt += 1;
        metrics.increment_reconnects();
        transition(&state, Transition::RetryDue);
    }

    transition(&state, Transition::Unmount);
    info!("Client task exiting");
}

async fn connect_with_timeout(url: &str, timeout: Duration) -> Result<WsStream> {
    match tokio::time::timeout(timeout, connect_async(url)).await {
        Ok(Ok((ws_stream, _response))) => Ok(ws_stream),
        Ok(Err(e)) => Err(HyperSocketError::WebSocket(e.to_string())),
        Err(_) => Err(HyperSocketError::ConnectTimeout(timeout)),
    }
}

/// Drive `work` while the socket is down, still servicing commands
///
/// Session requests update state only; raw frames are dropped. A shutdown
/// command, a closed command channel or a cleared flag abandon `work`.
async fn while_disconnected<R, S, F>(
    work: F,
    config: &ClientConfig<R>,
    session: &mut S,
    command_rx: &mut mpsc::UnboundedReceiver<ClientCommand<S::Request>>,
) -> WaitOutcome<F::Output>
where
    R: MessageRouter,
    S: SessionHandler,
    F: Future,
{
    let mut work = pin!(work);
    let mut ticker = shutdown_ticker();

    loop {
        tokio::select! {
            output = &mut work => return WaitOutcome::Ready(output),

            cmd = command_rx.recv() => match cmd {
                Some(ClientCommand::Request(request)) => {
                    // Not connected: the session keeps the change for the next replay
                    let _ = session.apply(request, false);
                }
                Some(ClientCommand::Send(_)) => {
                    debug!("Not connected, dropping outbound frame");
                }
                Some(ClientCommand::Shutdown) | None => return WaitOutcome::Shutdown,
            },

            _ = ticker.tick() => {
                if !is_running(&config.shutdown_flag) {
                    debug!("Shutdown flag cleared while disconnected");
                    return WaitOutcome::Shutdown;
                }
            }
        }
    }
}

/// Run one open connection until it drops or the owner stops the client
async fn handle_connection<R, S>(
    ws_stream: WsStream,
    config: &ClientConfig<R>,
    session: &mut S,
    metrics: &AtomicMetrics,
    command_rx: &mut mpsc::UnboundedReceiver<ClientCommand<S::Request>>,
) -> Result<SessionEnd>
where
    R: MessageRouter,
    S: SessionHandler,
{
    let (mut write, mut read) = ws_stream.split();

    // The server keeps no subscription state across connections
    let replay = session.on_open();
    if !replay.is_empty() {
        debug!("Replaying {} session frame(s)", replay.len());
    }
    send_all(&mut write, replay, metrics).await?;

    message_loop(&mut write, &mut read, config, session, metrics, command_rx).await
}

async fn message_loop<R, S>(
    write: &mut WsWrite,
    read: &mut WsRead,
    config: &ClientConfig<R>,
    session: &mut S,
    metrics: &AtomicMetrics,
    command_rx: &mut mpsc::UnboundedReceiver<ClientCommand<S::Request>>,
) -> Result<SessionEnd>
where
    R: MessageRouter,
    S: SessionHandler,
{
    let mut heartbeat = config.heartbeat.as_ref().map(|(interval, payload)| {
        let mut ticker = tokio::time::interval_at(Instant::now() + *interval, *interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        (ticker, payload.clone())
    });
    let mut ticker = shutdown_ticker();

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    metrics.increment_received();
                    route(config, WsMessage::Text(text)).await;
                }
                Some(Ok(Message::Binary(data))) => {
                    metrics.increment_received();
                    route(config, WsMessage::Binary(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("{} {}", f.code, f.reason))
                        .unwrap_or_else(|| "no close frame".to_string());
                    return Ok(SessionEnd::Dropped(reason));
                }
                // Ping/Pong are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    // Close our side so errors and clean closes recover the same way
                    let _ = write.send(Message::Close(None)).await;
                    return Err(HyperSocketError::WebSocket(e.to_string()));
                }
                None => return Ok(SessionEnd::Dropped("stream ended".to_string())),
            },

            cmd = command_rx.recv() => match cmd {
                Some(ClientCommand::Send(message)) => {
                    send_all(write, vec![message], metrics).await?;
                }
                Some(ClientCommand::Request(request)) => {
                    let frames = session.apply(request, true);
                    send_all(write, frames, metrics).await?;
                }
                Some(ClientCommand::Shutdown) | None => {
                    info!("Received shutdown command, closing connection");
                    let _ = write.close().await;
                    return Ok(SessionEnd::Shutdown);
                }
            },

            _ = next_heartbeat(&mut heartbeat) => {
                if let Some((_, payload)) = &heartbeat {
                    debug!("Sending heartbeat");
                    send_all(write, vec![payload.clone()], metrics).await?;
                }
            }

            _ = ticker.tick() => {
                if !is_running(&config.shutdown_flag) {
                    debug!("Shutdown flag cleared, closing connection");
                    let _ = write.close().await;
                    return Ok(SessionEnd::Shutdown);
                }
            }
        }
    }
}

async fn next_heartbeat(heartbeat: &mut Option<(Interval, WsMessage)>) {
    match heartbeat {
        Some((ticker, _)) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Parse inline (preserving arrival order) and hand off to the route's handler
async fn route<R>(config: &ClientConfig<R>, frame: WsMessage)
where
    R: MessageRouter,
{
    match config.router.parse(frame).await {
        Ok(messages) => {
            for message in messages {
                let route_key = config.router.route_key(&message);
                match config.route_senders.get(&route_key) {
                    // A closed channel only happens during shutdown
                    Some(sender) => {
                        let _ = sender.send(message);
                    }
                    None => debug!("No handler configured for route key: {:?}", route_key),
                }
            }
        }
        Err(e) => debug!("Dropping frame: {}", e),
    }
}

async fn send_all(write: &mut WsWrite, frames: Vec<WsMessage>, metrics: &AtomicMetrics) -> Result<()> {
    for frame in frames {
        write
            .send(ws_message_to_tungstenite(frame))
            .await
            .map_err(|e| HyperSocketError::WebSocket(format!("send failed: {}", e)))?;
        metrics.increment_sent();
    }
    Ok(())
}

fn ws_message_to_tungstenite(msg: WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text),
        WsMessage::Binary(data) => Message::Binary(data),
    }
}
