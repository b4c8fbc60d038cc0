//! Trading venue integration.
//!
//! The venue exposes a signed REST API for balances, tickers, exchange rules
//! and market orders. All core logic talks to it through the [`TradingVenue`]
//! trait so the in-memory [`MockVenue`] can stand in during tests.

mod client;
pub mod mock;
mod traits;
mod types;

pub use client::RoostooClient;
pub use mock::MockVenue;
pub use traits::TradingVenue;
pub use types::*;
