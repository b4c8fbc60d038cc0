//! Venue-agnostic trait for order execution and account data.

use crate::exchange::types::{Fill, OrderSide, VenueError, WalletSnapshot};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The execution seam between the decision engine and a trading venue.
///
/// Implementations must treat every call as independent; the core fetches
/// fresh snapshots at phase boundaries and never caches venue state.
#[async_trait]
pub trait TradingVenue: Send + Sync {
    /// Quantity precision (decimal places) per tradable pair.
    ///
    /// A pair absent from this map cannot be traded.
    async fn exchange_rules(&self) -> Result<HashMap<String, u32>, VenueError>;

    /// Current free cash and total holdings.
    async fn wallet(&self) -> Result<WalletSnapshot, VenueError>;

    /// Last traded price per pair.
    async fn ticker(&self) -> Result<HashMap<String, Decimal>, VenueError>;

    /// Submit a market order. Quantities must already be truncated to the
    /// pair's precision.
    async fn place_order(
        &self,
        pair: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<Fill, VenueError>;
}
