//! Domain layer
//!
//! Plain state owned by the live stream: subscriptions, prices, and the
//! scoped dashboard view. No I/O happens here.

pub mod dashboard;
pub mod live_price;
pub mod registry;
pub mod scope;

pub use dashboard::{DashboardState, PushedUpdate, SharedDashboard, UpdateKind};
pub use live_price::{FeedHealth, LivePriceBook, LivePriceEntry, SharedLivePrices};
pub use registry::{normalize_symbol, SymbolSubscriptions};
pub use scope::{field_matches, SharedViewScope, ViewScope};
