use thiserror::Error;

/// Main error type for hypersockets
#[derive(Error, Debug)]
pub enum HyperSocketError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection attempt did not complete in time
    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transition not allowed from the current connection state
    #[error("Invalid state transition: {0}")]
    InvalidState(String),

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

/// Result type for hypersockets operations
pub type Result<T> = std::result::Result<T, HyperSocketError>;
