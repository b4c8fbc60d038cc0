//! Type definitions for venue API payloads.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Errors surfaced by a trading venue.
///
/// `Rejected` carries the venue's business reason (insufficient balance,
/// unknown pair, ...); `Transport` covers timeouts and connectivity. Both are
/// recoverable: the affected request is dropped for the current tick.
#[derive(Debug, Error)]
pub enum VenueError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("venue rejected request: {0}")]
    Rejected(String),
}

/// Exchange information response.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfoResponse {
    #[serde(rename = "TradePairs", default)]
    pub trade_pairs: HashMap<String, TradePairRule>,
}

/// Per-pair trading rule.
#[derive(Debug, Clone, Deserialize)]
pub struct TradePairRule {
    /// Number of decimal places allowed in order quantities
    #[serde(rename = "AmountPrecision")]
    pub amount_precision: u32,
}

/// Balance query response.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "ErrMsg", default)]
    pub err_msg: Option<String>,
    #[serde(rename = "SpotWallet", default)]
    pub spot_wallet: HashMap<String, WalletEntry>,
}

/// Free and locked amounts for one wallet asset.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletEntry {
    #[serde(rename = "Free", default)]
    pub free: Decimal,
    #[serde(rename = "Lock", default)]
    pub lock: Decimal,
}

/// Ticker query response.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerResponse {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "ErrMsg", default)]
    pub err_msg: Option<String>,
    #[serde(rename = "Data", default)]
    pub data: HashMap<String, PairTicker>,
}

/// Last traded price for one pair.
#[derive(Debug, Clone, Deserialize)]
pub struct PairTicker {
    #[serde(rename = "LastPrice", default)]
    pub last_price: Decimal,
}

/// Order placement response.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "ErrMsg", default)]
    pub err_msg: Option<String>,
    #[serde(rename = "OrderDetail")]
    pub order_detail: Option<OrderDetail>,
}

/// Fill detail attached to a successful order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetail {
    /// Realized USD change: proceeds for sells, spend for buys
    #[serde(rename = "UnitChange", default)]
    pub unit_change: Decimal,
    /// Filled base-asset quantity
    #[serde(rename = "FilledQuantity", default)]
    pub filled_quantity: Decimal,
}

/// Normalized fill result consumed by the core.
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    /// Realized USD amount (proceeds for sells, spend for buys)
    pub proceeds_usd: Decimal,
    /// Filled base-asset quantity
    pub filled_quantity: Decimal,
}

impl From<OrderDetail> for Fill {
    fn from(detail: OrderDetail) -> Self {
        Self {
            proceeds_usd: detail.unit_change,
            filled_quantity: detail.filled_quantity,
        }
    }
}

/// Snapshot of free cash and total (free + locked) holdings.
#[derive(Debug, Clone, Default)]
pub struct WalletSnapshot {
    /// Free USD cash
    pub cash: Decimal,
    /// Total held quantity per non-cash asset, dust excluded
    pub holdings: HashMap<String, Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_response_parses() {
        let json = r#"{
            "Success": true,
            "SpotWallet": {
                "USD": {"Free": 25000.5, "Lock": 0},
                "BTC": {"Free": 0.5, "Lock": 0.1}
            }
        }"#;
        let parsed: BalanceResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.spot_wallet["USD"].free, dec!(25000.5));
        assert_eq!(parsed.spot_wallet["BTC"].lock, dec!(0.1));
    }

    #[test]
    fn test_order_response_with_rejection() {
        let json = r#"{"Success": false, "ErrMsg": "insufficient balance"}"#;
        let parsed: OrderResponse = serde_json::from_str(json).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.err_msg.as_deref(), Some("insufficient balance"));
        assert!(parsed.order_detail.is_none());
    }

    #[test]
    fn test_order_side_display() {
        assert_eq!(OrderSide::Buy.to_string(), "BUY");
        assert_eq!(OrderSide::Sell.to_string(), "SELL");
    }
}
