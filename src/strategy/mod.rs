//! Decision and allocation engine.
//!
//! - [`ranker`]: orders the universe by net signal score and classifies
//!   strong-buy / strong-sell / weak-sell signals.
//! - [`allocator`]: splits deployable cash across ranked buy candidates with
//!   exponential-decay weights.
//! - [`executor`]: truncates quantities to venue precision and submits
//!   throttled market orders.
//! - [`scheduler`]: dual-cadence tick accounting (fast risk sweep nested in
//!   the slow full cycle).
//! - [`rebalancer`]: the four-phase full cycle and the fast TP/SL sweep.

pub mod allocator;
pub mod executor;
pub mod ranker;
pub mod rebalancer;
pub mod scheduler;

pub use allocator::{AllocationPlanner, PlannedBuy};
pub use executor::OrderExecutor;
pub use ranker::SignalRanker;
pub use rebalancer::{CycleReport, RebalanceOrchestrator, SweepReport};
pub use scheduler::DualCadence;

use rust_decimal::Decimal;

/// Why a trade was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeReason {
    TakeProfit,
    StopLoss,
    StrongSell,
    WeakSellRebalance,
    StrongBuy,
}

impl std::fmt::Display for TradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TradeReason::TakeProfit => "take-profit",
            TradeReason::StopLoss => "stop-loss",
            TradeReason::StrongSell => "strong-sell",
            TradeReason::WeakSellRebalance => "weak-sell-rebalance",
            TradeReason::StrongBuy => "strong-buy",
        };
        write!(f, "{label}")
    }
}

/// A planned order: pair, side-by-reason, and untruncated quantity.
#[derive(Debug, Clone)]
pub struct TradeIntent {
    pub pair: String,
    pub quantity: Decimal,
    pub reason: TradeReason,
}
