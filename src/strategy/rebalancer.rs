//! Four-phase rebalance cycle and the fast TP/SL sweep.

use crate::exchange::{OrderSide, TradingVenue, WalletSnapshot};
use crate::ledger::PositionLedger;
use crate::risk::{classify, RiskThresholds, RiskVerdict};
use crate::signals::MarketSignal;
use crate::strategy::allocator::AllocationPlanner;
use crate::strategy::executor::OrderExecutor;
use crate::strategy::ranker::SignalRanker;
use crate::strategy::{TradeIntent, TradeReason};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one full rebalance cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct CycleReport {
    pub positions_checked: usize,
    pub risk_exits: usize,
    pub strong_sells: usize,
    pub weak_sells: usize,
    pub buys: usize,
    /// Cash credited by sells across all phases
    pub proceeds_usd: Decimal,
    /// Cash spent in the buy phase, at actual fill quantities
    pub deployed_usd: Decimal,
    /// Profit or loss realized by this cycle's sells, versus cost basis
    pub realized_pnl_usd: Decimal,
}

/// Outcome of one fast TP/SL sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    pub positions_checked: usize,
    pub exits: usize,
    pub proceeds_usd: Decimal,
    /// Market value of all holdings at the sweep's ticker prices
    pub portfolio_value_usd: Decimal,
    pub realized_pnl_usd: Decimal,
}

/// A completed sell with its realized P&L, when a cost basis was on record.
struct Liquidation {
    proceeds_usd: Decimal,
    realized_pnl: Option<Decimal>,
}

/// Sequences risk exits, strong sells, weak-sell funding, and buys within
/// one cycle, and owns the position ledger those phases mutate.
pub struct RebalanceOrchestrator {
    venue: Arc<dyn TradingVenue>,
    executor: OrderExecutor,
    ranker: SignalRanker,
    planner: AllocationPlanner,
    risk: RiskThresholds,
    reserve_cash: Decimal,
    ledger: PositionLedger,
}

fn pair_for(asset: &str) -> String {
    format!("{asset}/USD")
}

fn sell_intent(asset: &str, quantity: Decimal, reason: TradeReason) -> TradeIntent {
    TradeIntent {
        pair: pair_for(asset),
        quantity,
        reason,
    }
}

impl RebalanceOrchestrator {
    pub fn new(
        venue: Arc<dyn TradingVenue>,
        executor: OrderExecutor,
        ranker: SignalRanker,
        planner: AllocationPlanner,
        risk: RiskThresholds,
        reserve_cash: Decimal,
        ledger: PositionLedger,
    ) -> Self {
        Self {
            venue,
            executor,
            ranker,
            planner,
            risk,
            reserve_cash,
            ledger,
        }
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Run one full cycle against a pre-fetched signal snapshot.
    ///
    /// Phases: risk exits, strong sells, weak-sell funding (only when
    /// strong-buy candidates exist), then buys from `cash - reserve`.
    /// Proceeds from each phase fund the later ones within the same call.
    pub async fn run_full_cycle(
        &mut self,
        signals: &HashMap<String, MarketSignal>,
    ) -> Result<CycleReport> {
        let wallet = self
            .venue
            .wallet()
            .await
            .context("Failed to fetch wallet for full cycle")?;

        let mut report = CycleReport {
            positions_checked: wallet.holdings.len(),
            ..Default::default()
        };
        let mut available_cash = wallet.cash;
        let holdings = sorted_holdings(&wallet);
        // Assets sold in an earlier phase must not be sold again later.
        let mut remaining: HashSet<String> =
            holdings.iter().map(|(asset, _)| asset.clone()).collect();

        info!(
            cash = %available_cash,
            positions = holdings.len(),
            "Full cycle starting"
        );

        // Phase 1: TP/SL exits at signal prices.
        for (asset, quantity) in &holdings {
            let pair = pair_for(asset);
            let price = signals.get(&pair).map(|s| s.price);
            let verdict = classify(&self.risk, price, self.ledger.cost_basis(asset));
            if !verdict.requires_exit() {
                debug!(asset, ?verdict, "Holding");
                continue;
            }
            let reason = match verdict {
                RiskVerdict::TakeProfit => TradeReason::TakeProfit,
                _ => TradeReason::StopLoss,
            };
            if let Some(sale) = self.liquidate(sell_intent(asset, *quantity, reason)).await {
                available_cash += sale.proceeds_usd;
                report.proceeds_usd += sale.proceeds_usd;
                report.realized_pnl_usd += sale.realized_pnl.unwrap_or_default();
                report.risk_exits += 1;
                remaining.remove(asset);
            }
        }

        // Phase 2: strong directional sells.
        for (asset, quantity) in &holdings {
            if !remaining.contains(asset) {
                continue;
            }
            let Some(signal) = signals.get(&pair_for(asset)) else {
                continue;
            };
            if !self.ranker.is_strong_sell(signal) {
                continue;
            }
            if let Some(sale) = self
                .liquidate(sell_intent(asset, *quantity, TradeReason::StrongSell))
                .await
            {
                available_cash += sale.proceeds_usd;
                report.proceeds_usd += sale.proceeds_usd;
                report.realized_pnl_usd += sale.realized_pnl.unwrap_or_default();
                report.strong_sells += 1;
                remaining.remove(asset);
            }
        }

        // Phases 3 and 4 only happen when there is something worth buying.
        let candidates = self.ranker.strong_buy_candidates(signals);
        if candidates.is_empty() {
            info!(
                exits = report.risk_exits,
                strong_sells = report.strong_sells,
                "No strong-buy candidates; cycle complete"
            );
            return Ok(report);
        }
        info!(candidates = candidates.len(), "Strong-buy candidates found, funding rebalance");

        // Phase 3: liquidate weak-sell holdings to fund the buys.
        for (asset, quantity) in &holdings {
            if !remaining.contains(asset) {
                continue;
            }
            let Some(signal) = signals.get(&pair_for(asset)) else {
                continue;
            };
            if !self.ranker.is_weak_sell(signal) {
                continue;
            }
            if let Some(sale) = self
                .liquidate(sell_intent(asset, *quantity, TradeReason::WeakSellRebalance))
                .await
            {
                available_cash += sale.proceeds_usd;
                report.proceeds_usd += sale.proceeds_usd;
                report.realized_pnl_usd += sale.realized_pnl.unwrap_or_default();
                report.weak_sells += 1;
                remaining.remove(asset);
            }
        }

        // Phase 4: deploy everything above the reserve floor.
        let cash_to_invest = available_cash - self.reserve_cash;
        let ranked: Vec<(String, Decimal)> = candidates
            .iter()
            .map(|(pair, signal)| (pair.to_string(), signal.price))
            .collect();
        let plan = self.planner.plan(cash_to_invest, &ranked);
        info!(
            cash_to_invest = %cash_to_invest,
            planned_buys = plan.len(),
            "Deploying into strong buys"
        );

        for buy in plan {
            let quantity = buy.allocation_usd / buy.price;
            let Some(fill) = self
                .executor
                .submit(&buy.pair, OrderSide::Buy, quantity)
                .await
            else {
                continue;
            };
            let asset = buy.pair.split('/').next().unwrap_or(&buy.pair);
            self.ledger
                .record_buy(asset, fill.filled_quantity, buy.price);
            report.buys += 1;
            // The executor floor-truncates the quantity, so the actual spend
            // can be below the planned allocation.
            report.deployed_usd += fill.filled_quantity * buy.price;
        }

        info!(
            exits = report.risk_exits,
            strong_sells = report.strong_sells,
            weak_sells = report.weak_sells,
            buys = report.buys,
            proceeds = %report.proceeds_usd,
            deployed = %report.deployed_usd,
            realized_pnl = %report.realized_pnl_usd,
            "Full cycle complete"
        );
        Ok(report)
    }

    /// Run the fast TP/SL sweep against fresh venue prices. Never touches
    /// phases 2-4.
    pub async fn run_risk_sweep(&mut self) -> Result<SweepReport> {
        let wallet = self
            .venue
            .wallet()
            .await
            .context("Failed to fetch wallet for risk sweep")?;

        let mut report = SweepReport {
            positions_checked: wallet.holdings.len(),
            ..Default::default()
        };
        if wallet.holdings.is_empty() {
            return Ok(report);
        }

        let prices = self
            .venue
            .ticker()
            .await
            .context("Failed to fetch ticker for risk sweep")?;

        report.portfolio_value_usd = wallet
            .holdings
            .iter()
            .filter_map(|(asset, quantity)| {
                prices.get(&pair_for(asset)).map(|price| *price * *quantity)
            })
            .sum();
        info!(
            cash = %wallet.cash,
            portfolio = %report.portfolio_value_usd,
            total = %(wallet.cash + report.portfolio_value_usd),
            "Account valuation"
        );

        for (asset, quantity) in sorted_holdings(&wallet) {
            let price = prices.get(&pair_for(&asset)).copied();
            let verdict = classify(&self.risk, price, self.ledger.cost_basis(&asset));
            if !verdict.requires_exit() {
                debug!(asset, ?verdict, "Holding");
                continue;
            }
            let reason = match verdict {
                RiskVerdict::TakeProfit => TradeReason::TakeProfit,
                _ => TradeReason::StopLoss,
            };
            if let Some(sale) = self.liquidate(sell_intent(&asset, quantity, reason)).await {
                report.proceeds_usd += sale.proceeds_usd;
                report.realized_pnl_usd += sale.realized_pnl.unwrap_or_default();
                report.exits += 1;
            }
        }

        if report.exits > 0 {
            info!(
                exits = report.exits,
                proceeds = %report.proceeds_usd,
                realized_pnl = %report.realized_pnl_usd,
                "Risk sweep sold positions"
            );
        }
        Ok(report)
    }

    /// Execute a sell intent in full and zero the ledger row. Returns the
    /// realized proceeds and P&L, or `None` if nothing was sold.
    async fn liquidate(&mut self, intent: TradeIntent) -> Option<Liquidation> {
        info!(
            pair = %intent.pair,
            quantity = %intent.quantity,
            reason = %intent.reason,
            "Liquidating position"
        );
        let asset = intent.pair.split('/').next().unwrap_or(&intent.pair);
        let cost_basis = self.ledger.cost_basis(asset);
        let fill = self
            .executor
            .submit(&intent.pair, OrderSide::Sell, intent.quantity)
            .await?;
        let realized_pnl = cost_basis.and_then(|cost| {
            if fill.filled_quantity <= Decimal::ZERO {
                return None;
            }
            let pnl = fill.proceeds_usd - cost * fill.filled_quantity;
            let pnl_pct =
                (fill.proceeds_usd / fill.filled_quantity / cost - Decimal::ONE) * Decimal::ONE_HUNDRED;
            if pnl >= Decimal::ZERO {
                info!(pair = %intent.pair, pnl = %pnl, pct = %pnl_pct.round_dp(2), "📈 Profit realized");
            } else {
                info!(pair = %intent.pair, pnl = %pnl, pct = %pnl_pct.round_dp(2), "📉 Loss realized");
            }
            Some(pnl)
        });
        self.ledger.record_liquidation(asset);
        Some(Liquidation {
            proceeds_usd: fill.proceeds_usd,
            realized_pnl,
        })
    }
}

/// Holdings in deterministic order for phase iteration.
fn sorted_holdings(wallet: &WalletSnapshot) -> Vec<(String, Decimal)> {
    let mut holdings: Vec<(String, Decimal)> = wallet
        .holdings
        .iter()
        .map(|(asset, qty)| (asset.clone(), *qty))
        .collect();
    holdings.sort_by(|a, b| a.0.cmp(&b.0));
    holdings
}
