//! Order submission with precision truncation and throttling.

use crate::exchange::{Fill, OrderSide, TradingVenue};
use crate::utils::decimal::floor_to_precision;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Submits market orders through the venue, flooring every quantity to the
/// pair's precision first. Failures are logged and swallowed; the dropped
/// intent gets re-evaluated next cycle.
pub struct OrderExecutor {
    venue: Arc<dyn TradingVenue>,
    precisions: HashMap<String, u32>,
    throttle: Duration,
}

impl OrderExecutor {
    pub fn new(
        venue: Arc<dyn TradingVenue>,
        precisions: HashMap<String, u32>,
        throttle: Duration,
    ) -> Self {
        Self {
            venue,
            precisions,
            throttle,
        }
    }

    /// Truncate a quantity to the pair's precision. `None` means the pair
    /// has no precision rule and cannot be traded.
    pub fn truncate(&self, pair: &str, quantity: Decimal) -> Option<Decimal> {
        let precision = self.precisions.get(pair)?;
        Some(floor_to_precision(quantity, *precision))
    }

    /// Submit one market order, returning the fill if it went through.
    ///
    /// Returns `None` for every non-tradable case: missing precision rule,
    /// quantity truncating to zero, or a venue rejection.
    pub async fn submit(&self, pair: &str, side: OrderSide, quantity: Decimal) -> Option<Fill> {
        let Some(truncated) = self.truncate(pair, quantity) else {
            warn!(pair, "No precision rule, skipping order");
            return None;
        };
        if truncated <= Decimal::ZERO {
            warn!(pair, %quantity, "Quantity truncates to zero, skipping order");
            return None;
        }

        let result = self.venue.place_order(pair, side, truncated).await;
        tokio::time::sleep(self.throttle).await;

        match result {
            Ok(fill) => {
                info!(
                    pair,
                    %side,
                    quantity = %truncated,
                    proceeds = %fill.proceeds_usd,
                    "Order filled"
                );
                Some(fill)
            }
            Err(e) => {
                warn!(pair, %side, quantity = %truncated, error = %e, "Order failed");
                None
            }
        }
    }
}
