//! Infrastructure Layer
//!
//! Endpoint resolution, error throttling, logging and process shutdown.

pub mod endpoint;
pub mod logging;
pub mod shutdown;
pub mod throttle;

pub use endpoint::{resolve_ws_url, EndpointError, BACKEND_PORT, STREAM_PATH};
pub use logging::init_tracing;
pub use shutdown::ShutdownManager;
pub use throttle::{ErrorThrottle, DEFAULT_REPORT_INTERVAL};
