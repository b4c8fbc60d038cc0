//! In-memory venue used by integration tests.

use crate::exchange::traits::TradingVenue;
use crate::exchange::types::{Fill, OrderSide, VenueError, WalletSnapshot};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// One order accepted by the mock, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOrder {
    pub pair: String,
    pub side: OrderSide,
    pub quantity: Decimal,
}

#[derive(Debug, Default)]
struct MockState {
    cash: Decimal,
    holdings: HashMap<String, Decimal>,
    prices: HashMap<String, Decimal>,
    precisions: HashMap<String, u32>,
    rejected_pairs: HashSet<String>,
    orders: Vec<RecordedOrder>,
}

/// A deterministic venue that fills market orders at its configured prices.
///
/// Fills move cash and holdings like the real venue would, so multi-phase
/// flows can assert on the final wallet as well as the order log.
#[derive(Debug, Default)]
pub struct MockVenue {
    state: Mutex<MockState>,
}

impl MockVenue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cash(&self, cash: Decimal) {
        self.lock().cash = cash;
    }

    pub fn set_holding(&self, asset: &str, quantity: Decimal) {
        self.lock().holdings.insert(asset.to_string(), quantity);
    }

    pub fn set_price(&self, pair: &str, price: Decimal) {
        self.lock().prices.insert(pair.to_string(), price);
    }

    pub fn set_precision(&self, pair: &str, decimals: u32) {
        self.lock().precisions.insert(pair.to_string(), decimals);
    }

    /// Make every order for `pair` come back rejected.
    pub fn reject_orders_for(&self, pair: &str) {
        self.lock().rejected_pairs.insert(pair.to_string());
    }

    pub fn orders(&self) -> Vec<RecordedOrder> {
        self.lock().orders.clone()
    }

    pub fn cash(&self) -> Decimal {
        self.lock().cash
    }

    pub fn holding(&self, asset: &str) -> Decimal {
        self.lock().holdings.get(asset).copied().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn base_asset(pair: &str) -> &str {
    pair.split('/').next().unwrap_or(pair)
}

#[async_trait]
impl TradingVenue for MockVenue {
    async fn exchange_rules(&self) -> Result<HashMap<String, u32>, VenueError> {
        Ok(self.lock().precisions.clone())
    }

    async fn wallet(&self) -> Result<WalletSnapshot, VenueError> {
        let state = self.lock();
        Ok(WalletSnapshot {
            cash: state.cash,
            holdings: state
                .holdings
                .iter()
                .filter(|(_, qty)| **qty > Decimal::ZERO)
                .map(|(asset, qty)| (asset.clone(), *qty))
                .collect(),
        })
    }

    async fn ticker(&self) -> Result<HashMap<String, Decimal>, VenueError> {
        Ok(self.lock().prices.clone())
    }

    async fn place_order(
        &self,
        pair: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<Fill, VenueError> {
        let mut state = self.lock();

        if state.rejected_pairs.contains(pair) {
            return Err(VenueError::Rejected(format!("order rejected for {pair}")));
        }

        let price = *state
            .prices
            .get(pair)
            .ok_or_else(|| VenueError::Rejected(format!("no price for {pair}")))?;

        let notional = price * quantity;
        let asset = base_asset(pair).to_string();

        match side {
            OrderSide::Buy => {
                if notional > state.cash {
                    return Err(VenueError::Rejected("insufficient cash".to_string()));
                }
                state.cash -= notional;
                *state.holdings.entry(asset).or_default() += quantity;
            }
            OrderSide::Sell => {
                let held = state.holdings.get(&asset).copied().unwrap_or_default();
                if quantity > held {
                    return Err(VenueError::Rejected("insufficient holdings".to_string()));
                }
                state.cash += notional;
                state.holdings.insert(asset, held - quantity);
            }
        }

        state.orders.push(RecordedOrder {
            pair: pair.to_string(),
            side,
            quantity,
        });

        Ok(Fill {
            proceeds_usd: notional,
            filled_quantity: quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_buy_moves_cash_into_holdings() {
        let venue = MockVenue::new();
        venue.set_cash(dec!(1000));
        venue.set_price("BTC/USD", dec!(100));

        let fill = venue
            .place_order("BTC/USD", OrderSide::Buy, dec!(2))
            .await
            .unwrap();

        assert_eq!(fill.proceeds_usd, dec!(200));
        assert_eq!(venue.cash(), dec!(800));
        assert_eq!(venue.holding("BTC"), dec!(2));
    }

    #[tokio::test]
    async fn test_sell_requires_holdings() {
        let venue = MockVenue::new();
        venue.set_cash(dec!(0));
        venue.set_price("ETH/USD", dec!(50));

        let result = venue.place_order("ETH/USD", OrderSide::Sell, dec!(1)).await;
        assert!(matches!(result, Err(VenueError::Rejected(_))));
        assert!(venue.orders().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_pair_leaves_state_untouched() {
        let venue = MockVenue::new();
        venue.set_cash(dec!(500));
        venue.set_price("SOL/USD", dec!(10));
        venue.reject_orders_for("SOL/USD");

        let result = venue.place_order("SOL/USD", OrderSide::Buy, dec!(5)).await;
        assert!(result.is_err());
        assert_eq!(venue.cash(), dec!(500));
    }
}
