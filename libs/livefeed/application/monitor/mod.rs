//! Terminal monitor for the live price stream

mod app;
pub mod ui;

pub use app::{App, PriceRow, Watchlist};
