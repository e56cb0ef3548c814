//! End-to-end behaviour of `LiveStream` against a mock market endpoint

mod common;

use common::{wait_until, MockWsServer};
use livefeed::{LiveFeedConfig, LiveStream, ShutdownManager, UpdateKind, ViewScope};
use hypersockets::ConnectionState;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn config_for(server: &MockWsServer) -> LiveFeedConfig {
    let mut config = LiveFeedConfig::default();
    config.api_base_url = Some(server.api_base_url());
    config.reconnect.delay_ms = 50;
    config
}

async fn connected_stream(server: &MockWsServer, config: &LiveFeedConfig) -> LiveStream {
    let stream = LiveStream::spawn(config, Arc::new(AtomicBool::new(true)))
        .await
        .unwrap();
    assert!(wait_until(WAIT, || stream.is_connected()).await);
    assert!(wait_until(WAIT, || server.open_connections() == 1).await);
    stream
}

fn control(action: &str, symbols: &[&str]) -> Value {
    json!({ "action": action, "symbols": symbols })
}

fn symbol_set(message: &Value) -> BTreeSet<String> {
    message["symbols"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_shared_symbols_sent_once_and_released_last() {
    let server = MockWsServer::start().await;
    let stream = connected_stream(&server, &config_for(&server)).await;

    stream.subscribe(["TCS", "INFY"]);
    assert!(wait_until(WAIT, || server.received_json().len() == 1).await);
    stream.subscribe(["INFY", "WIPRO"]);
    assert!(wait_until(WAIT, || server.received_json().len() == 2).await);
    stream.unsubscribe(["TCS", "INFY"]);
    assert!(wait_until(WAIT, || server.received_json().len() == 3).await);

    stream.unsubscribe(["XYZ"]);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        server.received_json(),
        vec![
            control("subscribe", &["TCS", "INFY"]),
            control("subscribe", &["WIPRO"]),
            control("unsubscribe", &["TCS"]),
        ]
    );
    assert_eq!(stream.subscribed_symbols().await, vec!["INFY", "WIPRO"]);

    stream.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reconnect_replays_full_set_once() {
    let server = MockWsServer::start().await;
    let stream = connected_stream(&server, &config_for(&server)).await;

    stream.subscribe(["TCS", "INFY"]);
    stream.subscribe(["INFY", "WIPRO"]);
    assert!(wait_until(WAIT, || server.received_json().len() == 2).await);

    server.clear_received();
    server.drop_connections();

    assert!(wait_until(WAIT, || server.handshakes() >= 2).await);
    assert!(wait_until(WAIT, || !server.received_json().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let frames = server.received_json();
    assert_eq!(frames.len(), 1, "frames: {:?}", frames);
    assert_eq!(frames[0]["action"], "subscribe");
    let expected: BTreeSet<String> = ["TCS", "INFY", "WIPRO"].iter().map(|s| s.to_string()).collect();
    assert_eq!(symbol_set(&frames[0]), expected);
    assert_eq!(frames[0]["symbols"].as_array().unwrap().len(), 3);

    stream.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_subscriptions_made_while_offline_sent_on_open() {
    let server = MockWsServer::start().await;
    server.set_reject(true);

    let stream = LiveStream::spawn(&config_for(&server), Arc::new(AtomicBool::new(true)))
        .await
        .unwrap();
    stream.subscribe(["TCS", "INFY"]);
    stream.subscribe(["INFY"]);
    stream.unsubscribe(["TCS"]);

    assert!(wait_until(WAIT, || server.tcp_accepts() >= 2).await);
    assert_ne!(stream.connection_state(), ConnectionState::Open);

    server.set_reject(false);
    assert!(wait_until(WAIT, || !server.received_json().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(server.received_json(), vec![control("subscribe", &["INFY"])]);

    stream.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ticks_update_live_prices() {
    let server = MockWsServer::start().await;
    let stream = connected_stream(&server, &config_for(&server)).await;

    server.push("pong");
    server.push("");
    server.push(r#"{"type":"tick","symbol":"tcs","data":{"last_price":3500.5,"change_percent":1.2,"volume":100}}"#);
    server.push(r#"{"type":"tick","symbol":"TCS","data":{"last_price":"abc"}}"#);
    server.push("{broken");
    server.push(r#"[{"type":"tick","symbol":"INFY","data":{"last_price":"1500.25"}}]"#);

    assert!(wait_until(WAIT, || stream.live_price("INFY").is_some()).await);

    let tcs = stream.live_price("TCS").unwrap();
    assert_eq!(tcs.last_price, 3500.5);
    assert_eq!(tcs.change_percent, Some(1.2));
    assert_eq!(tcs.volume, Some(100));
    assert_eq!(stream.live_price("infy").unwrap().last_price, 1500.25);
    assert_eq!(stream.prices().read().tick_count(), 2);
    assert!(stream.live_price("WIPRO").is_none());

    stream.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_irrelevant_scoped_updates_dropped() {
    let server = MockWsServer::start().await;
    let mut config = config_for(&server);
    config.scope = ViewScope {
        region: Some("india".into()),
        ..ViewScope::default()
    };
    let stream = connected_stream(&server, &config).await;
    let dashboard = stream.dashboard();

    server.push(r#"{"type":"flows_update","region":"usa","net":-10}"#);
    server.push(r#"{"type":"market_summary_update","region":"India","breadth":0.6}"#);

    assert!(wait_until(WAIT, || dashboard.read().update_count(UpdateKind::MarketSummary) == 1).await);
    assert_eq!(dashboard.read().update_count(UpdateKind::Flows), 0);

    stream.set_view_scope(ViewScope::default());
    server.push(r#"{"type":"flows_update","region":"usa","net":-10}"#);
    assert!(wait_until(WAIT, || dashboard.read().update_count(UpdateKind::Flows) == 1).await);

    let state = dashboard.read();
    assert_eq!(state.latest(UpdateKind::Flows).unwrap().payload["net"], -10);
    drop(state);

    stream.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_socket_and_stops_reconnecting() {
    let server = MockWsServer::start().await;
    let stream = connected_stream(&server, &config_for(&server)).await;
    stream.subscribe(["TCS"]);
    assert!(wait_until(WAIT, || server.received_json().len() == 1).await);

    stream.shutdown().await.unwrap();

    assert!(wait_until(WAIT, || server.open_connections() == 0).await);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.handshakes(), 1);
}

#[tokio::test]
async fn test_shared_flag_unmounts_stream() {
    let server = MockWsServer::start().await;
    let running = Arc::new(AtomicBool::new(true));
    let stream = LiveStream::spawn(&config_for(&server), Arc::clone(&running))
        .await
        .unwrap();
    assert!(wait_until(WAIT, || stream.is_connected()).await);

    running.store(false, std::sync::atomic::Ordering::Release);

    assert!(wait_until(WAIT, || stream.connection_state() == ConnectionState::Unmounted).await);
    assert!(wait_until(WAIT, || server.open_connections() == 0).await);
    assert!(stream.subscribed_symbols().await.is_empty());
}

#[tokio::test]
async fn test_dropping_one_stream_leaves_others_on_process_flag() {
    let server = MockWsServer::start().await;
    let config = config_for(&server);
    let manager = ShutdownManager::new();

    let first = LiveStream::spawn(&config, manager.flag()).await.unwrap();
    let second = LiveStream::spawn(&config, manager.flag()).await.unwrap();
    assert!(wait_until(WAIT, || first.is_connected() && second.is_connected()).await);
    assert!(wait_until(WAIT, || server.open_connections() == 2).await);

    drop(first);
    assert!(wait_until(WAIT, || server.open_connections() == 1).await);
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(manager.is_running());
    assert_eq!(second.connection_state(), ConnectionState::Open);

    second.subscribe(["TCS"]);
    assert!(wait_until(WAIT, || server.received_json().len() == 1).await);
}
