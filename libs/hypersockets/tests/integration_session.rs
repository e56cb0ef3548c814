//! End-to-end tests against a local WebSocket server
//!
//! Cover session replay on every handshake, requests queued while
//! disconnected, ordered routing, heartbeat and shutdown.

mod common;

use async_trait::async_trait;
use common::{wait_until, MockWsServer};
use hypersockets::*;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AllFrames;

struct TextRouter;

#[async_trait]
impl MessageRouter for TextRouter {
    type Message = String;
    type RouteKey = AllFrames;

    async fn parse(&self, message: WsMessage) -> Result<Vec<String>> {
        Ok(message.as_text().map(str::to_string).into_iter().collect())
    }

    fn route_key(&self, _message: &String) -> AllFrames {
        AllFrames
    }
}

struct CollectingHandler {
    seen: Arc<Mutex<Vec<String>>>,
}

impl MessageHandler<String> for CollectingHandler {
    fn handle(&mut self, message: String) -> Result<()> {
        self.seen.lock().push(message);
        Ok(())
    }
}

#[derive(Debug)]
enum TopicRequest {
    Add(String),
}

#[derive(Default)]
struct TopicSession {
    topics: BTreeSet<String>,
}

impl SessionHandler for TopicSession {
    type Request = TopicRequest;

    fn on_open(&mut self) -> Vec<WsMessage> {
        if self.topics.is_empty() {
            return Vec::new();
        }
        let all: Vec<&str> = self.topics.iter().map(String::as_str).collect();
        vec![WsMessage::Text(format!("replay:{}", all.join(",")))]
    }

    fn apply(&mut self, request: TopicRequest, connected: bool) -> Vec<WsMessage> {
        match request {
            TopicRequest::Add(topic) => {
                if self.topics.insert(topic.clone()) && connected {
                    vec![WsMessage::Text(format!("add:{}", topic))]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

async fn build_client(
    url: String,
    seen: Arc<Mutex<Vec<String>>>,
) -> WebSocketClient<TextRouter, TopicSession> {
    hypersockets::builder()
        .url(url)
        .router(TextRouter, move |routing| {
            routing.handler(AllFrames, CollectingHandler { seen })
        })
        .session(TopicSession::default())
        .reconnect_strategy(FixedDelay::new(Duration::from_millis(50), None))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_session_replayed_after_reconnect() {
    let server = MockWsServer::start().await;
    let client = build_client(server.ws_url(), Arc::new(Mutex::new(Vec::new()))).await;

    assert!(wait_until(WAIT, || client.is_connected()).await);

    client.request(TopicRequest::Add("alpha".into())).unwrap();
    client.request(TopicRequest::Add("alpha".into())).unwrap();
    assert!(wait_until(WAIT, || server.received().contains(&"add:alpha".to_string())).await);

    server.clear_received();
    server.drop_connections();

    assert!(wait_until(WAIT, || server.handshakes() >= 2).await);
    assert!(wait_until(WAIT, || !server.received().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(server.received(), vec!["replay:alpha".to_string()]);
    assert!(client.metrics().reconnect_count >= 1);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_requests_while_disconnected_are_replayed_once() {
    let server = MockWsServer::start().await;
    server.set_reject(true);

    let client = build_client(server.ws_url(), Arc::new(Mutex::new(Vec::new()))).await;
    client.request(TopicRequest::Add("beta".into())).unwrap();
    client.request(TopicRequest::Add("alpha".into())).unwrap();

    assert!(wait_until(WAIT, || server.tcp_accepts() >= 2).await);
    assert!(!client.is_connected());

    server.set_reject(false);
    assert!(wait_until(WAIT, || !server.received().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(server.received(), vec!["replay:alpha,beta".to_string()]);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_frames_routed_in_arrival_order() {
    let server = MockWsServer::start().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let client = build_client(server.ws_url(), Arc::clone(&seen)).await;

    assert!(wait_until(WAIT, || server.open_connections() == 1).await);

    for i in 0..200 {
        server.push(i.to_string());
    }

    assert!(wait_until(WAIT, || seen.lock().len() == 200).await);
    let expected: Vec<String> = (0..200).map(|i| i.to_string()).collect();
    assert_eq!(*seen.lock(), expected);
    assert!(client.metrics().messages_received >= 200);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_heartbeat_sent_while_open() {
    let server = MockWsServer::start().await;

    let client = hypersockets::builder()
        .url(server.ws_url())
        .router(TextRouter, |routing| routing)
        .heartbeat(Duration::from_millis(50), WsMessage::from("ping"))
        .build()
        .await
        .unwrap();

    assert!(
        wait_until(WAIT, || server.received().iter().filter(|m| *m == "ping").count() >= 2).await
    );

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_reconnection() {
    let server = MockWsServer::start().await;
    let client = build_client(server.ws_url(), Arc::new(Mutex::new(Vec::new()))).await;

    assert!(wait_until(WAIT, || server.open_connections() == 1).await);

    let flag = Arc::clone(client.shutdown_flag());
    client.shutdown().await.unwrap();
    assert!(flag.load(std::sync::atomic::Ordering::Acquire));

    assert!(wait_until(WAIT, || server.open_connections() == 0).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.handshakes(), 1);
}

#[tokio::test]
async fn test_cleared_flag_cancels_pending_reconnect() {
    let server = MockWsServer::start().await;
    server.set_reject(true);

    let client = hypersockets::builder()
        .url(server.ws_url())
        .router(TextRouter, |routing| routing)
        .reconnect_strategy(FixedDelay::new(Duration::from_secs(60), None))
        .build()
        .await
        .unwrap();

    assert!(wait_until(WAIT, || client.connection_state() == ConnectionState::Closed).await);
    assert_eq!(
        client.recv_event_timeout(Duration::from_secs(1)).map(|e| matches!(e, ClientEvent::Error(_))),
        Some(true)
    );

    client
        .shutdown_flag()
        .store(false, std::sync::atomic::Ordering::Release);
    assert!(wait_until(WAIT, || client.connection_state() == ConnectionState::Unmounted).await);
    assert_eq!(server.tcp_accepts(), 1);
}

#[tokio::test]
async fn test_shutdown_leaves_shared_flag_alone() {
    let server = MockWsServer::start().await;
    let running = Arc::new(std::sync::atomic::AtomicBool::new(true));

    let mut clients = Vec::new();
    for _ in 0..2 {
        let client = hypersockets::builder()
            .url(server.ws_url())
            .router(TextRouter, |routing| routing)
            .reconnect_strategy(FixedDelay::new(Duration::from_millis(50), None))
            .shutdown_flag(Arc::clone(&running))
            .build()
            .await
            .unwrap();
        clients.push(client);
    }
    assert!(wait_until(WAIT, || server.open_connections() == 2).await);

    let first = clients.remove(0);
    first.shutdown().await.unwrap();
    let second = clients.remove(0);

    assert!(wait_until(WAIT, || server.open_connections() == 1).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(running.load(std::sync::atomic::Ordering::Acquire));
    assert_eq!(second.connection_state(), ConnectionState::Open);
    assert_eq!(server.handshakes(), 2);

    drop(second);
    assert!(wait_until(WAIT, || server.open_connections() == 0).await);
    assert!(running.load(std::sync::atomic::Ordering::Acquire));
}

struct SlowHandler {
    seen: Arc<Mutex<Vec<String>>>,
}

impl MessageHandler<String> for SlowHandler {
    fn handle(&mut self, message: String) -> Result<()> {
        std::thread::sleep(Duration::from_millis(10));
        self.seen.lock().push(message);
        Ok(())
    }
}

#[tokio::test]
async fn test_routed_frames_handled_after_flag_cleared() {
    let server = MockWsServer::start().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let running = Arc::new(std::sync::atomic::AtomicBool::new(true));

    let handler = SlowHandler { seen: Arc::clone(&seen) };
    let client = hypersockets::builder()
        .url(server.ws_url())
        .router(TextRouter, move |routing| routing.handler(AllFrames, handler))
        .shutdown_flag(Arc::clone(&running))
        .build()
        .await
        .unwrap();
    assert!(wait_until(WAIT, || server.open_connections() == 1).await);

    for i in 0..50 {
        server.push(i.to_string());
    }
    assert!(wait_until(WAIT, || client.metrics().messages_received == 50).await);
    assert!(seen.lock().len() < 50);

    running.store(false, std::sync::atomic::Ordering::Release);
    client.shutdown().await.unwrap();

    let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
    assert_eq!(*seen.lock(), expected);
}
