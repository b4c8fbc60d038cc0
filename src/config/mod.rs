//! Configuration management for the signal rotator.
//!
//! Loads settings from environment variables and config files.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Trading venue credentials and endpoint
    #[serde(default)]
    pub venue: VenueConfig,
    /// TP/SL ratios and signal vote thresholds
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    /// Capital deployment settings
    #[serde(default)]
    pub capital: CapitalConfig,
    /// Loop cadence settings
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Monitored instrument universe
    #[serde(default)]
    pub universe: UniverseConfig,
    /// Ledger persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// API key for authentication
    #[serde(default)]
    pub api_key: String,
    /// Secret key for signing requests
    #[serde(default)]
    pub secret_key: String,
    /// REST endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Price/cost ratio at or above which a position is take-profit exited
    #[serde(default = "default_take_profit_ratio")]
    pub take_profit_ratio: Decimal,
    /// Price/cost ratio at or below which a position is stop-loss exited
    #[serde(default = "default_stop_loss_ratio")]
    pub stop_loss_ratio: Decimal,
    /// Minimum buy votes for a strong-buy classification.
    ///
    /// Shares its default with `strong_sell_votes` but the two are
    /// independently tunable; the shared value is a choice, not a coupling.
    #[serde(default = "default_strong_votes")]
    pub strong_buy_votes: u32,
    /// Minimum sell votes for a strong-sell classification
    #[serde(default = "default_strong_votes")]
    pub strong_sell_votes: u32,
    /// Minimum sell votes for a weak-sell (rebalance funding) classification
    #[serde(default = "default_weak_sell_votes")]
    pub weak_sell_votes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalConfig {
    /// Cash floor that is never deployed into new buys (USD)
    #[serde(default = "default_reserve_cash")]
    pub reserve_cash: Decimal,
    /// Minimum notional per buy order; smaller allocations are dust (USD)
    #[serde(default = "default_min_order_notional")]
    pub min_order_notional: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Fast TP/SL sweep period in seconds
    #[serde(default = "default_fast_check_secs")]
    pub fast_check_secs: u64,
    /// Full rebalance cycle period in seconds
    #[serde(default = "default_full_cycle_secs")]
    pub full_cycle_secs: u64,
    /// Delay between consecutive order submissions in milliseconds
    #[serde(default = "default_order_throttle_ms")]
    pub order_throttle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Monitored trading pairs, quote currency included (e.g. "BTC/USD")
    #[serde(default = "default_pairs")]
    pub pairs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite ledger database
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,
}

// Default value functions

fn default_base_url() -> String {
    "https://mock-api.roostoo.com".to_string()
}

fn default_take_profit_ratio() -> Decimal {
    Decimal::new(106, 2) // 1.06
}

fn default_stop_loss_ratio() -> Decimal {
    Decimal::new(97, 2) // 0.97
}

fn default_strong_votes() -> u32 {
    13
}

fn default_weak_sell_votes() -> u32 {
    8
}

fn default_reserve_cash() -> Decimal {
    Decimal::new(20_000, 0)
}

fn default_min_order_notional() -> Decimal {
    Decimal::new(10, 0)
}

fn default_fast_check_secs() -> u64 {
    15
}

fn default_full_cycle_secs() -> u64 {
    600
}

fn default_order_throttle_ms() -> u64 {
    1000
}

fn default_ledger_path() -> String {
    "data/ledger.db".to_string()
}

fn default_pairs() -> Vec<String> {
    [
        "BTC/USD", "ETH/USD", "ZEC/USD", "SOL/USD", "XRP/USD", "BNB/USD", "DOGE/USD",
        "ASTER/USD", "WLFI/USD", "TRUMP/USD", "NEAR/USD", "ICP/USD", "LTC/USD",
        "FIL/USD", "XPL/USD", "SUI/USD", "PUMP/USD", "VIRTUAL/USD", "LINK/USD",
        "TRX/USD", "ENA/USD", "HBAR/USD", "UNI/USD", "FET/USD", "ADA/USD", "ZEN/USD",
        "TAO/USD", "AVAX/USD", "PEPE/USD", "AAVE/USD", "DOT/USD", "PENGU/USD",
        "PAXG/USD", "WLD/USD", "XLM/USD", "SEI/USD", "EIGEN/USD", "ARB/USD", "S/USD",
        "APT/USD", "CAKE/USD", "CRV/USD", "LINEA/USD", "BONK/USD", "WIF/USD",
        "FORM/USD", "TON/USD", "EDEN/USD", "SHIB/USD", "POL/USD", "FLOKI/USD",
        "ONDO/USD", "SOMI/USD", "AVNT/USD", "HEMI/USD", "PLUME/USD", "MIRA/USD",
        "CFX/USD", "PENDLE/USD", "BIO/USD", "TUT/USD", "OPEN/USD", "OMNI/USD",
        "BMT/USD", "1000CHEEMS/USD", "LISTA/USD",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::default().separator("__").prefix("ROTATOR"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.thresholds.take_profit_ratio > Decimal::ONE,
            "take_profit_ratio must be above 1.0"
        );

        anyhow::ensure!(
            self.thresholds.stop_loss_ratio < Decimal::ONE
                && self.thresholds.stop_loss_ratio > Decimal::ZERO,
            "stop_loss_ratio must be between 0 and 1"
        );

        anyhow::ensure!(
            self.thresholds.weak_sell_votes <= self.thresholds.strong_sell_votes,
            "weak_sell_votes must not exceed strong_sell_votes"
        );

        anyhow::ensure!(
            self.schedule.fast_check_secs > 0
                && self.schedule.fast_check_secs < self.schedule.full_cycle_secs,
            "fast_check_secs must be positive and shorter than full_cycle_secs"
        );

        anyhow::ensure!(
            self.capital.reserve_cash >= Decimal::ZERO,
            "reserve_cash must not be negative"
        );

        anyhow::ensure!(!self.universe.pairs.is_empty(), "universe must not be empty");

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            venue: VenueConfig::default(),
            thresholds: ThresholdsConfig::default(),
            capital: CapitalConfig::default(),
            schedule: ScheduleConfig::default(),
            universe: UniverseConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            base_url: default_base_url(),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            take_profit_ratio: default_take_profit_ratio(),
            stop_loss_ratio: default_stop_loss_ratio(),
            strong_buy_votes: default_strong_votes(),
            strong_sell_votes: default_strong_votes(),
            weak_sell_votes: default_weak_sell_votes(),
        }
    }
}

impl Default for CapitalConfig {
    fn default() -> Self {
        Self {
            reserve_cash: default_reserve_cash(),
            min_order_notional: default_min_order_notional(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fast_check_secs: default_fast_check_secs(),
            full_cycle_secs: default_full_cycle_secs(),
            order_throttle_ms: default_order_throttle_ms(),
        }
    }
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            pairs: default_pairs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
        }
    }
}
