//! Signed REST client for the Roostoo trading venue.

use crate::config::VenueConfig;
use crate::exchange::traits::TradingVenue;
use crate::exchange::types::*;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Holdings below this quantity are treated as dust and excluded.
const DUST_QUANTITY: Decimal = Decimal::from_parts(1, 0, 0, false, 8); // 1e-8

/// REST client for the venue's spot market API.
pub struct RoostooClient {
    http: Client,
    api_key: String,
    secret_key: String,
    base_url: String,
}

impl RoostooClient {
    /// Create a new client from configuration.
    pub fn new(config: &VenueConfig) -> Result<Self, VenueError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Generate HMAC-SHA256 signature over the canonical parameter string.
    fn sign(&self, total_params: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(total_params.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Get current timestamp in milliseconds.
    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_millis() as u64
    }

    /// Canonical parameter string: keys sorted, `k=v` pairs joined with `&`.
    fn canonical_params(params: &[(String, String)]) -> String {
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[async_trait]
impl TradingVenue for RoostooClient {
    /// Fetch per-pair quantity precision from exchange info.
    #[instrument(skip(self))]
    async fn exchange_rules(&self) -> Result<HashMap<String, u32>, VenueError> {
        let url = format!("{}/v3/exchangeInfo", self.base_url);
        let response: ExchangeInfoResponse = self.http.get(&url).send().await?.json().await?;

        if response.trade_pairs.is_empty() {
            return Err(VenueError::Rejected(
                "exchange info carried no trade pairs".to_string(),
            ));
        }

        Ok(response
            .trade_pairs
            .into_iter()
            .map(|(pair, rule)| (pair, rule.amount_precision))
            .collect())
    }

    /// Fetch free cash and total holdings (free + locked), dust excluded.
    #[instrument(skip(self))]
    async fn wallet(&self) -> Result<WalletSnapshot, VenueError> {
        let params = vec![("timestamp".to_string(), Self::timestamp().to_string())];
        let total_params = Self::canonical_params(&params);
        let signature = self.sign(&total_params);

        let url = format!("{}/v3/balance?{}", self.base_url, total_params);
        let response: BalanceResponse = self
            .http
            .get(&url)
            .header("RST-API-KEY", &self.api_key)
            .header("MSG-SIGNATURE", signature)
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(VenueError::Rejected(
                response.err_msg.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let mut snapshot = WalletSnapshot::default();
        for (asset, entry) in response.spot_wallet {
            if asset == "USD" {
                snapshot.cash = entry.free;
                continue;
            }
            let total = entry.free + entry.lock;
            if total > DUST_QUANTITY {
                snapshot.holdings.insert(asset, total);
            }
        }

        Ok(snapshot)
    }

    /// Fetch last traded prices for all pairs.
    #[instrument(skip(self))]
    async fn ticker(&self) -> Result<HashMap<String, Decimal>, VenueError> {
        let url = format!("{}/v3/ticker?timestamp={}", self.base_url, Self::timestamp());
        let response: TickerResponse = self.http.get(&url).send().await?.json().await?;

        if !response.success {
            return Err(VenueError::Rejected(
                response.err_msg.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(response
            .data
            .into_iter()
            .map(|(pair, ticker)| (pair, ticker.last_price))
            .collect())
    }

    /// Submit a market order with a signed form body.
    #[instrument(skip(self))]
    async fn place_order(
        &self,
        pair: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<Fill, VenueError> {
        let params = vec![
            ("pair".to_string(), pair.to_string()),
            ("side".to_string(), side.to_string()),
            ("type".to_string(), "MARKET".to_string()),
            ("quantity".to_string(), quantity.to_string()),
            ("timestamp".to_string(), Self::timestamp().to_string()),
        ];
        let total_params = Self::canonical_params(&params);
        let signature = self.sign(&total_params);

        debug!(%pair, %side, %quantity, "Placing market order");

        let url = format!("{}/v3/place_order", self.base_url);
        let response: OrderResponse = self
            .http
            .post(&url)
            .header("RST-API-KEY", &self.api_key)
            .header("MSG-SIGNATURE", signature)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(total_params)
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(VenueError::Rejected(
                response.err_msg.unwrap_or_else(|| "unknown API error".to_string()),
            ));
        }

        response
            .order_detail
            .map(Fill::from)
            .ok_or_else(|| VenueError::Rejected("order accepted without fill detail".to_string()))
    }
}
