//! Live price stream client - main library
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//! - **livefeed**: Live stream domain, configuration and facade (re-exported from workspace)
//! - **hypersockets**: WebSocket library (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use tradedesk_stream::bin_common::{load_config_from_env, ConfigType};
//! use tradedesk_stream::livefeed::{LiveFeedConfig, LiveStream};
//! ```

// Re-export workspace libraries for convenience
pub use hypersockets;
pub use livefeed;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, symbols_from_args, ConfigType};
    pub use runner::{BinaryRunner, RunConfig};
}
