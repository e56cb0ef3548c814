//! CLI utilities for binaries
//!
//! Handles configuration paths and command line arguments for all binary
//! executables.

use std::path::PathBuf;

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Live feed configuration (live_feed.yaml)
    LiveFeed,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::LiveFeed => "config/live_feed.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        match self {
            ConfigType::LiveFeed => "LIVE_FEED_CONFIG",
            ConfigType::Custom(_) => "LIVE_FEED_CONFIG",
        }
    }
}

/// Load configuration path from environment or use default
///
/// ```
/// use tradedesk_stream::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::LiveFeed);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// Symbols given on the command line, comma or space separated
///
/// Arguments starting with `-` are skipped.
pub fn symbols_from_args(args: &[String]) -> Vec<String> {
    args.iter()
        .filter(|arg| !arg.starts_with('-'))
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}
