//! TradingView crypto scanner client.
//!
//! One pair can trade on any of several exchanges; the scanner only answers
//! for `EXCHANGE:SYMBOL` tickers, so unknown pairs are probed across a fixed
//! exchange list and the winning exchange is cached for later calls.

use crate::signals::{MarketSignal, SignalDirection, SignalError, SignalSource};
use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

const SCAN_URL: &str = "https://scanner.tradingview.com/crypto/scan";
const SCAN_TIMEOUT_SECS: u64 = 20;
const INTERVAL: &str = "30";

/// Exchanges probed in order during pair discovery.
const EXCHANGES: [&str; 7] = [
    "BINANCE",
    "COINBASE",
    "KUCOIN",
    "KRAKEN",
    "BITSTAMP",
    "BYBIT",
    "CRYPTOCOM",
];

/// Per-indicator rating columns; one vote each.
const RATING_COLUMNS: [&str; 26] = [
    "Rec.RSI",
    "Rec.Stoch.K",
    "Rec.CCI20",
    "Rec.ADX",
    "Rec.AO",
    "Rec.Mom",
    "Rec.MACD",
    "Rec.Stoch.RSI",
    "Rec.WR",
    "Rec.BBPower",
    "Rec.UO",
    "Rec.EMA10",
    "Rec.SMA10",
    "Rec.EMA20",
    "Rec.SMA20",
    "Rec.EMA30",
    "Rec.SMA30",
    "Rec.EMA50",
    "Rec.SMA50",
    "Rec.EMA100",
    "Rec.SMA100",
    "Rec.EMA200",
    "Rec.SMA200",
    "Rec.Ichimoku",
    "Rec.VWMA",
    "Rec.HullMA",
];

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    /// Ticker in `EXCHANGE:SYMBOL` form
    s: String,
    /// Column values, aligned with the requested column list
    d: Vec<Option<f64>>,
}

/// Signal source backed by the TradingView scanner API.
pub struct TradingViewScanner {
    http: reqwest::Client,
    /// Pair to exchange, learned during discovery
    exchange_cache: HashMap<String, String>,
}

impl TradingViewScanner {
    pub fn new() -> Result<Self, SignalError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SCAN_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            exchange_cache: HashMap::new(),
        })
    }

    /// Number of pairs with a cached exchange mapping.
    pub fn cached_pairs(&self) -> usize {
        self.exchange_cache.len()
    }

    fn ticker_for(exchange: &str, pair: &str) -> String {
        format!("{}:{}", exchange, pair.replace('/', ""))
    }

    fn columns() -> Vec<String> {
        let mut columns = vec![format!("close|{INTERVAL}"), format!("Recommend.All|{INTERVAL}")];
        columns.extend(RATING_COLUMNS.iter().map(|c| format!("{c}|{INTERVAL}")));
        columns
    }

    /// Query one exchange for a batch of pairs. Pairs the scanner does not
    /// know are absent from the result, not an error.
    async fn scan_exchange(
        &self,
        exchange: &str,
        pairs: &[String],
    ) -> Result<HashMap<String, MarketSignal>, SignalError> {
        let tickers: Vec<String> = pairs.iter().map(|p| Self::ticker_for(exchange, p)).collect();
        let body = json!({
            "symbols": {"tickers": tickers, "query": {"types": []}},
            "columns": Self::columns(),
        });

        let response: ScanResponse = self
            .http
            .post(SCAN_URL)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        let mut rows: HashMap<String, ScanRow> =
            response.data.into_iter().map(|row| (row.s.clone(), row)).collect();

        let mut signals = HashMap::new();
        for pair in pairs {
            let Some(row) = rows.remove(&Self::ticker_for(exchange, pair)) else {
                continue;
            };
            if let Some(signal) = parse_row(&row) {
                signals.insert(pair.clone(), signal);
            }
        }
        Ok(signals)
    }
}

#[async_trait]
impl SignalSource for TradingViewScanner {
    async fn fetch(
        &mut self,
        pairs: &[String],
    ) -> Result<HashMap<String, MarketSignal>, SignalError> {
        let mut signals = HashMap::new();
        let mut to_discover: Vec<String> = Vec::new();

        // Targeted requests for pairs whose exchange is already known.
        let mut by_exchange: HashMap<String, Vec<String>> = HashMap::new();
        for pair in pairs {
            match self.exchange_cache.get(pair) {
                Some(exchange) => by_exchange
                    .entry(exchange.clone())
                    .or_default()
                    .push(pair.clone()),
                None => to_discover.push(pair.clone()),
            }
        }

        for (exchange, cached_pairs) in by_exchange {
            match self.scan_exchange(&exchange, &cached_pairs).await {
                Ok(found) => {
                    debug!(
                        exchange,
                        requested = cached_pairs.len(),
                        found = found.len(),
                        "Fetched cached pairs"
                    );
                    signals.extend(found);
                }
                Err(e) => {
                    // Rediscover this batch; the cache entry may be stale.
                    warn!(exchange, error = %e, "Cached exchange lookup failed, rediscovering");
                    to_discover.extend(cached_pairs);
                }
            }
        }

        // Probe the exchange list for whatever is left.
        for exchange in EXCHANGES {
            if to_discover.is_empty() {
                break;
            }
            let found = match self.scan_exchange(exchange, &to_discover).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(exchange, error = %e, "Discovery scan failed, trying next exchange");
                    continue;
                }
            };
            if found.is_empty() {
                continue;
            }
            debug!(exchange, discovered = found.len(), "Discovered pairs");
            to_discover.retain(|pair| !found.contains_key(pair));
            for pair in found.keys() {
                self.exchange_cache.insert(pair.clone(), exchange.to_string());
            }
            signals.extend(found);
        }

        if !to_discover.is_empty() {
            debug!(missing = to_discover.len(), "Some pairs have no signal on any exchange");
        }

        Ok(signals)
    }
}

/// Map one rating value to a vote. Missing indicators vote neutral.
fn vote(rating: Option<f64>) -> SignalDirection {
    match rating {
        Some(r) if r >= 0.5 => SignalDirection::Buy,
        Some(r) if r <= -0.5 => SignalDirection::Sell,
        _ => SignalDirection::Neutral,
    }
}

/// Map the aggregate recommendation to a direction.
fn direction(recommend_all: f64) -> SignalDirection {
    if recommend_all >= 0.1 {
        SignalDirection::Buy
    } else if recommend_all <= -0.1 {
        SignalDirection::Sell
    } else {
        SignalDirection::Neutral
    }
}

fn parse_row(row: &ScanRow) -> Option<MarketSignal> {
    // Columns: close, Recommend.All, then the rating columns.
    if row.d.len() != 2 + RATING_COLUMNS.len() {
        return None;
    }
    let close = row.d[0].filter(|p| *p > 0.0)?;
    let price = Decimal::from_f64(close)?;
    let recommend_all = row.d[1]?;

    let mut buy_votes = 0;
    let mut sell_votes = 0;
    let mut neutral_votes = 0;
    for rating in &row.d[2..] {
        match vote(*rating) {
            SignalDirection::Buy => buy_votes += 1,
            SignalDirection::Sell => sell_votes += 1,
            SignalDirection::Neutral => neutral_votes += 1,
        }
    }

    Some(MarketSignal {
        price,
        buy_votes,
        sell_votes,
        neutral_votes,
        direction: direction(recommend_all),
    })
}
