//! Exponential-decay capital allocation across ranked buy candidates.

use crate::config::CapitalConfig;
use rust_decimal::Decimal;
use tracing::debug;

/// One planned buy: pair, cash allocation, and reference price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBuy {
    pub pair: String,
    pub allocation_usd: Decimal,
    pub price: Decimal,
}

/// Splits deployable cash across candidates with weights `2^(N-i-1)` for
/// rank `i`: the top candidate gets roughly half, the next a quarter, and
/// so on. Allocations below the dust floor are skipped without
/// redistribution.
#[derive(Debug, Clone)]
pub struct AllocationPlanner {
    min_order_notional: Decimal,
}

impl AllocationPlanner {
    pub fn new(capital: &CapitalConfig) -> Self {
        Self {
            min_order_notional: capital.min_order_notional,
        }
    }

    /// Plan buys for the ranked candidates. `cash_to_invest` is already net
    /// of the reserve floor; non-positive cash plans nothing.
    pub fn plan(
        &self,
        cash_to_invest: Decimal,
        candidates: &[(String, Decimal)],
    ) -> Vec<PlannedBuy> {
        if cash_to_invest <= self.min_order_notional || candidates.is_empty() {
            return Vec::new();
        }

        let weights = exponential_weights(candidates.len());
        let total_weight: Decimal = weights.iter().sum();

        let mut planned = Vec::new();
        for (i, (pair, price)) in candidates.iter().enumerate() {
            let allocation = cash_to_invest * weights[i] / total_weight;
            if allocation < self.min_order_notional {
                debug!(pair, %allocation, "Allocation below dust floor, skipping");
                continue;
            }
            if *price <= Decimal::ZERO {
                debug!(pair, "No usable price, skipping");
                continue;
            }
            planned.push(PlannedBuy {
                pair: pair.clone(),
                allocation_usd: allocation,
                price: *price,
            });
        }
        planned
    }
}

/// Weights `[2^(n-1), ..., 2, 1]`, built by repeated doubling so a large
/// candidate list cannot overflow a machine integer.
fn exponential_weights(n: usize) -> Vec<Decimal> {
    let mut weights = vec![Decimal::ONE; n];
    for i in (0..n.saturating_sub(1)).rev() {
        weights[i] = weights[i + 1] * Decimal::TWO;
    }
    weights
}
