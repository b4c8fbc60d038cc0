//! Technical-analysis signal feed.
//!
//! Each monitored pair gets a [`MarketSignal`]: a reference price plus
//! per-indicator buy/sell/neutral vote counts and an overall direction.
//! Production signals come from the TradingView scanner
//! ([`TradingViewScanner`]); tests supply canned maps instead.

mod scanner;

pub use scanner::TradingViewScanner;

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

/// Overall direction of a pair's technical rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDirection {
    Buy,
    Sell,
    Neutral,
}

/// Aggregated technical rating for one pair.
#[derive(Debug, Clone)]
pub struct MarketSignal {
    /// Reference price at the signal's interval close
    pub price: Decimal,
    /// Indicators voting buy
    pub buy_votes: u32,
    /// Indicators voting sell
    pub sell_votes: u32,
    /// Indicators voting neither way
    pub neutral_votes: u32,
    /// Direction of the aggregate recommendation
    pub direction: SignalDirection,
}

impl MarketSignal {
    /// Net conviction used for ranking: buy votes minus sell votes.
    pub fn score(&self) -> i64 {
        i64::from(self.buy_votes) - i64::from(self.sell_votes)
    }
}

/// Errors surfaced by a signal source.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed scanner response: {0}")]
    Malformed(String),
}

/// Source of per-pair market signals.
///
/// Takes `&mut self` so implementations can maintain lookup caches across
/// calls. Pairs with no signal available are simply absent from the result;
/// callers treat absence as "no data", never as neutral.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn fetch(
        &mut self,
        pairs: &[String],
    ) -> Result<HashMap<String, MarketSignal>, SignalError>;
}
