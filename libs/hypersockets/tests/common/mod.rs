//! Common test utilities for HyperSockets integration tests
//!
//! `MockWsServer` accepts any number of connections, records every text
//! frame it receives, and can push frames to or drop all open connections.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
enum ServerControl {
    Push(String),
    DropAll,
}

pub struct MockWsServer {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    control: broadcast::Sender<ServerControl>,
    tcp_accepts: Arc<AtomicUsize>,
    handshakes: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
    reject: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (control, _) = broadcast::channel(1024);

        let server = Self {
            addr,
            received: Arc::new(Mutex::new(Vec::new())),
            control,
            tcp_accepts: Arc::new(AtomicUsize::new(0)),
            handshakes: Arc::new(AtomicUsize::new(0)),
            open: Arc::new(AtomicUsize::new(0)),
            reject: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        };

        let received = Arc::clone(&server.received);
        let control = server.control.clone();
        let tcp_accepts = Arc::clone(&server.tcp_accepts);
        let handshakes = Arc::clone(&server.handshakes);
        let open = Arc::clone(&server.open);
        let reject = Arc::clone(&server.reject);
        let shutdown = Arc::clone(&server.shutdown);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { break };
                        tcp_accepts.fetch_add(1, Ordering::SeqCst);
                        if reject.load(Ordering::SeqCst) {
                            drop(stream);
                            continue;
                        }
                        let conn = Connection {
                            received: Arc::clone(&received),
                            control: control.subscribe(),
                            handshakes: Arc::clone(&handshakes),
                            open: Arc::clone(&open),
                            shutdown: Arc::clone(&shutdown),
                        };
                        tokio::spawn(conn.run(stream));
                    }
                    _ = shutdown.notified() => break,
                }
            }
        });

        server
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Text frames received from clients, in arrival order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    pub fn clear_received(&self) {
        self.received.lock().clear();
    }

    /// Send a text frame to every open connection
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.control.send(ServerControl::Push(text.into()));
    }

    /// Abruptly drop every open connection
    pub fn drop_connections(&self) {
        let _ = self.control.send(ServerControl::DropAll);
    }

    /// Refuse new connections by closing them before the handshake
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn tcp_accepts(&self) -> usize {
        self.tcp_accepts.load(Ordering::SeqCst)
    }

    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }

    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Connection {
    received: Arc<Mutex<Vec<String>>>,
    control: broadcast::Receiver<ServerControl>,
    handshakes: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
}

impl Connection {
    async fn run(mut self, stream: TcpStream) {
        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(_) => return,
        };
        self.handshakes.fetch_add(1, Ordering::SeqCst);
        self.open.fetch_add(1, Ordering::SeqCst);

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.received.lock().push(text),
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                ctl = self.control.recv() => match ctl {
                    Ok(ServerControl::Push(text)) => {
                        if write.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Ok(ServerControl::DropAll) | Err(_) => break,
                },
                _ = self.shutdown.notified() => break,
            }
        }

        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
