//! Live feed configuration
//!
//! Loaded from YAML, then overridden by environment variables:
//! `API_BASE_URL` (explicit backend base) and `PAGE_ORIGIN`.

use crate::domain::ViewScope;
use crate::infrastructure::endpoint::{resolve_ws_url, EndpointError};
use hypersockets::{ExponentialBackoff, FixedDelay, ReconnectionStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reconnect delay policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectPolicy {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub strategy: ReconnectPolicy,
    /// Fixed delay, or the first delay when exponential
    pub delay_ms: u64,
    /// Cap for exponential backoff
    pub max_delay_ms: u64,
    /// None retries forever
    pub max_attempts: Option<usize>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: ReconnectPolicy::Fixed,
            delay_ms: 5_000,
            max_delay_ms: 60_000,
            max_attempts: None,
        }
    }
}

impl ReconnectConfig {
    pub fn build_strategy(&self) -> Box<dyn ReconnectionStrategy> {
        let delay = Duration::from_millis(self.delay_ms);
        match self.strategy {
            ReconnectPolicy::Fixed => Box::new(FixedDelay::new(delay, self.max_attempts)),
            ReconnectPolicy::Exponential => Box::new(ExponentialBackoff::new(
                delay,
                Duration::from_millis(self.max_delay_ms),
                self.max_attempts,
            )),
        }
    }
}

/// A named group of symbols watched together, like one dashboard widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistConfig {
    pub name: String,
    pub symbols: Vec<String>,
}

/// Live price stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveFeedConfig {
    /// Origin the dashboard is served from
    pub page_origin: String,
    /// Explicit backend base URL, bypasses origin derivation
    pub api_base_url: Option<String>,
    pub reconnect: ReconnectConfig,
    pub connect_timeout_secs: u64,
    /// Client "ping" frames while open, disabled when unset
    pub heartbeat_interval_secs: Option<u64>,
    pub error_report_interval_secs: u64,
    pub scope: ViewScope,
    /// Symbols to watch on startup
    pub symbols: Vec<String>,
    /// Independent consumers for the terminal dashboard
    pub watchlists: Vec<WatchlistConfig>,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for LiveFeedConfig {
    fn default() -> Self {
        Self {
            page_origin: "http://localhost:3000".to_string(),
            api_base_url: None,
            reconnect: ReconnectConfig::default(),
            connect_timeout_secs: 10,
            heartbeat_interval_secs: None,
            error_report_interval_secs: 15,
            scope: ViewScope::default(),
            symbols: Vec::new(),
            watchlists: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl LiveFeedConfig {
    /// Load configuration from YAML file and apply environment overrides
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file(config_path)?.with_env_overrides()
    }

    /// Read and parse the YAML file only
    ///
    /// Lets a binary start logging at `log_level` before the overrides are
    /// applied and reported.
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        Self::from_yaml(&yaml_content)
    }

    /// Apply `API_BASE_URL` / `PAGE_ORIGIN` and validate
    pub fn with_env_overrides(mut self) -> Result<Self> {
        self.apply_overrides(
            std::env::var("API_BASE_URL").ok(),
            std::env::var("PAGE_ORIGIN").ok(),
        );

        self.validate()?;
        Ok(self)
    }

    /// Parse YAML without validating
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn apply_overrides(&mut self, api_base_url: Option<String>, page_origin: Option<String>) {
        if let Some(base) = api_base_url.filter(|v| !v.trim().is_empty()) {
            info!("Overriding API base URL from environment variable");
            self.api_base_url = Some(base);
        }

        if let Some(origin) = page_origin.filter(|v| !v.trim().is_empty()) {
            info!("Overriding page origin from environment variable");
            self.page_origin = origin;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.reconnect.delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "reconnect.delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.reconnect.strategy == ReconnectPolicy::Exponential
            && self.reconnect.max_delay_ms < self.reconnect.delay_ms
        {
            return Err(ConfigError::ValidationError(
                "reconnect.max_delay_ms must be at least reconnect.delay_ms".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.heartbeat_interval_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "heartbeat_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.error_report_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "error_report_interval_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(watchlist) = self.watchlists.iter().find(|w| w.name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "watchlist with symbols {:?} has no name",
                watchlist.symbols
            )));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        self.ws_url()?;
        Ok(())
    }

    /// Market stream URL for this configuration
    pub fn ws_url(&self) -> std::result::Result<Url, EndpointError> {
        resolve_ws_url(&self.page_origin, self.api_base_url.as_deref())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval_secs.map(Duration::from_secs)
    }

    pub fn error_report_interval(&self) -> Duration {
        Duration::from_secs(self.error_report_interval_secs)
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        match self.ws_url() {
            Ok(url) => info!("  Stream URL: {}", url),
            Err(e) => info!("  Stream URL: unresolved ({})", e),
        }
        info!(
            "  Reconnect: {:?}, {} ms (max attempts: {:?})",
            self.reconnect.strategy, self.reconnect.delay_ms, self.reconnect.max_attempts
        );
        info!("  Connect timeout: {} seconds", self.connect_timeout_secs);
        info!("  Heartbeat: {:?}", self.heartbeat_interval_secs);
        info!("  Symbols: {}", self.symbols.join(", "));
        for watchlist in &self.watchlists {
            info!("  Watchlist {}: {}", watchlist.name, watchlist.symbols.join(", "));
        }
        info!("  Log level: {}", self.log_level);
    }
}
