//! Live price table
//!
//! Streams ticks for the configured symbols, or the ones given on the
//! command line, and redraws a price table in place.
//!
//! Usage:
//!   cargo run --bin live_prices -- TCS,INFY,WIPRO

use anyhow::{bail, Context, Result};
use chrono::Utc;
use hypersockets::ConnectionState;
use livefeed::{init_tracing, log_client_event, LiveFeedConfig, LiveStream, ShutdownManager};
use std::io::{self, Write};
use tradedesk_stream::bin_common::{
    load_config_from_env, parse_args, symbols_from_args, BinaryRunner, ConfigType, RunConfig,
};
use std::time::Duration;

const STALE_AFTER: Duration = Duration::from_secs(10);

/// Clear terminal and move cursor to top-left
fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
    let _ = io::stdout().flush();
}

fn format_state(state: ConnectionState) -> String {
    match state {
        ConnectionState::Open => "\x1B[32mOPEN\x1B[0m".to_string(),
        ConnectionState::Connecting => "\x1B[33mCONNECTING\x1B[0m".to_string(),
        ConnectionState::Closed => "\x1B[31mCLOSED (retrying)\x1B[0m".to_string(),
        ConnectionState::Unmounted => "UNMOUNTED".to_string(),
    }
}

/// Format change with color coding
fn format_change(change_percent: Option<f64>) -> String {
    match change_percent {
        Some(pct) if pct >= 0.0 => format!("\x1B[32m{:>+8.2}%\x1B[0m", pct),
        Some(pct) => format!("\x1B[31m{:>+8.2}%\x1B[0m", pct),
        None => format!("{:>9}", "-"),
    }
}

fn render(stream: &LiveStream, symbols: &[String]) {
    let prices = stream.prices();
    let book = prices.read();
    let metrics = stream.metrics();
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let age = if book.tick_count() > 0 {
        let health = if book.is_healthy(STALE_AFTER) { "ok" } else { "stale" };
        format!("{}ms ({})", book.age().as_millis(), health)
    } else {
        "-".to_string()
    };

    clear_screen();

    println!("════════════════════════════════════════════════════════════════════════");
    println!("  LIVE PRICES");
    println!("════════════════════════════════════════════════════════════════════════");
    println!("  Time: {}    Feed Age: {}", now, age);
    println!("  URL: {}    State: {}", stream.url(), format_state(metrics.connection_state));
    println!("  Press Ctrl+C to stop");
    println!("════════════════════════════════════════════════════════════════════════");
    println!();

    println!(
        "  {:>10}  {:>14}  {:>9}  {:>12}  {:<24}",
        "SYMBOL", "PRICE", "CHANGE", "VOLUME", "TIMESTAMP"
    );
    println!("  ──────────────────────────────────────────────────────────────────────");

    for symbol in symbols {
        match book.get(symbol) {
            Some(entry) => println!(
                "  {:>10}  {:>14.2}  {}  {:>12}  {:<24}",
                symbol,
                entry.last_price,
                format_change(entry.change_percent),
                entry.volume.map_or_else(|| "-".to_string(), |v| v.to_string()),
                entry.timestamp
            ),
            None => println!(
                "  {:>10}  {:>14}  {:>9}  {:>12}  {:<24}",
                symbol, "(waiting...)", "-", "-", "-"
            ),
        }
    }

    println!();
    println!("  ══════════════════════════════════════════════════════════════════════");
    println!("  STREAM STATS");
    println!("  ──────────────────────────────────────────────────────────────────────");
    println!("  Ticks Accepted:  {:>10}", book.tick_count());
    println!("  Frames Received: {:>10}", metrics.messages_received);
    println!("  Frames Sent:     {:>10}", metrics.messages_sent);
    println!("  Reconnects:      {:>10}", metrics.reconnect_count);
    println!("════════════════════════════════════════════════════════════════════════");
}

struct LivePrices {
    config: RunConfig,
    feed: LiveFeedConfig,
    symbols: Vec<String>,
    shutdown: ShutdownManager,
}

impl BinaryRunner for LivePrices {
    async fn run(&mut self) -> Result<()> {
        self.shutdown.spawn_signal_handler();

        let stream = LiveStream::spawn(&self.feed, self.shutdown.flag()).await?;
        stream.subscribe(&self.symbols);

        self.shutdown.interruptible_sleep(self.config.warmup).await;

        while self.shutdown.is_running() {
            while let Some(event) = stream.try_recv_event() {
                log_client_event(&event);
            }
            render(&stream, &self.symbols);
            self.shutdown
                .interruptible_sleep(self.config.refresh_interval)
                .await;
        }

        clear_screen();
        stream.shutdown().await
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = load_config_from_env(ConfigType::LiveFeed);
    let feed = LiveFeedConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_tracing(&feed.log_level);

    let feed = feed
        .with_env_overrides()
        .with_context(|| format!("validating {}", config_path.display()))?;
    feed.log();

    let mut symbols = symbols_from_args(&parse_args());
    if symbols.is_empty() {
        symbols = feed.symbols.iter().map(|s| s.trim().to_uppercase()).collect();
    }
    if symbols.is_empty() {
        bail!("no symbols given on the command line or in {}", config_path.display());
    }

    let mut app = LivePrices {
        config: RunConfig::new("live_prices"),
        feed,
        symbols,
        shutdown: ShutdownManager::new(),
    };

    app.execute().await
}
