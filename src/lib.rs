//! # Signal Rotator
//!
//! A spot portfolio rotation bot driven by aggregated technical-analysis
//! consensus. Instruments with the strongest buy consensus receive capital
//! under an exponential-decay allocation; holdings are protected by a fast
//! take-profit / stop-loss sweep running between full rebalance cycles.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `exchange`: Trading venue client (signed REST) and the `TradingVenue` seam
//! - `signals`: Technical-analysis snapshot source with exchange discovery
//! - `ledger`: Weighted-average-cost position ledger
//! - `persistence`: SQLite write-through store for the ledger
//! - `risk`: Take-profit / stop-loss classification
//! - `strategy`: Ranking, allocation planning, execution, and the rebalance
//!   orchestrator with its dual-cadence scheduler
//! - `supervisor`: Bounded-backoff supervision of the outer loop
//! - `utils`: Shared decimal arithmetic helpers

pub mod config;
pub mod exchange;
pub mod ledger;
pub mod persistence;
pub mod risk;
pub mod signals;
pub mod strategy;
pub mod supervisor;
pub mod utils;

pub use config::Config;
