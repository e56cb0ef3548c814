//! Live market stream: wire types, routing, handlers, session and facade

pub mod client;
pub mod handlers;
pub mod router;
pub mod session;
pub mod types;

pub use client::{log_client_event, LiveStream, HEARTBEAT_PAYLOAD};
pub use handlers::{DashboardHandler, TickHandler};
pub use router::{is_relevant, looks_like_json, FeedRouter};
pub use session::{SessionRequest, SymbolSession};
pub use types::{ControlAction, ControlMessage, FeedMessage, FeedRoute, TickUpdate};
