//! Application Layer
//!
//! Consumers of the live stream. The terminal monitor plays the role of the
//! dashboard: several watchlists share one connection and one set of wire
//! subscriptions.

pub mod monitor;

pub use monitor::{App, PriceRow, Watchlist};
