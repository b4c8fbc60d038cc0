//! Position cost-basis ledger.
//!
//! The venue is the source of truth for what is actually held; the ledger
//! only remembers what it cost. Buys merge into a weighted average cost,
//! exits zero the quantity but keep the row so the last cost basis stays
//! visible until the asset is bought again.

use crate::persistence::{LedgerStore, StoredPosition};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Cost-basis record for one asset.
#[derive(Debug, Clone)]
pub struct Position {
    /// Quantity acquired through this ledger (zeroed on exit, row retained)
    pub quantity: Decimal,
    /// Weighted average entry price in USD
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// In-memory ledger with write-through SQLite persistence.
///
/// A failed save is logged and tolerated: trading continues on the in-memory
/// state and the next successful save rewrites the full ledger anyway.
pub struct PositionLedger {
    positions: HashMap<String, Position>,
    store: LedgerStore,
}

impl PositionLedger {
    /// Build a ledger from whatever the store currently holds.
    pub fn load(store: LedgerStore) -> anyhow::Result<Self> {
        let positions = store
            .load_all()?
            .into_iter()
            .map(|row| {
                (
                    row.asset,
                    Position {
                        quantity: row.quantity,
                        average_cost: row.average_cost,
                        updated_at: row.updated_at,
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        debug!(positions = positions.len(), "Ledger loaded");
        Ok(Self { positions, store })
    }

    /// Record a buy fill, merging into the weighted average cost.
    ///
    /// A buy into a zeroed (or absent) row starts fresh at the fill price;
    /// the stale cost basis from the previous round trip does not bleed in.
    pub fn record_buy(&mut self, asset: &str, fill_quantity: Decimal, fill_price: Decimal) {
        if fill_quantity <= Decimal::ZERO || fill_price <= Decimal::ZERO {
            return;
        }

        let now = Utc::now();
        let entry = self.positions.entry(asset.to_string()).or_insert(Position {
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            updated_at: now,
        });

        let total_quantity = entry.quantity + fill_quantity;
        entry.average_cost = if entry.quantity <= Decimal::ZERO {
            fill_price
        } else {
            (entry.average_cost * entry.quantity + fill_price * fill_quantity) / total_quantity
        };
        entry.quantity = total_quantity;
        entry.updated_at = now;

        debug!(
            asset,
            quantity = %entry.quantity,
            average_cost = %entry.average_cost,
            "Recorded buy"
        );
        self.persist();
    }

    /// Record a full exit: zero the quantity, retain the row and its cost.
    pub fn record_liquidation(&mut self, asset: &str) {
        if let Some(entry) = self.positions.get_mut(asset) {
            entry.quantity = Decimal::ZERO;
            entry.updated_at = Utc::now();
            debug!(asset, "Recorded liquidation");
            self.persist();
        }
    }

    /// Cost basis for an asset, if a positive one is on record.
    pub fn cost_basis(&self, asset: &str) -> Option<Decimal> {
        self.positions
            .get(asset)
            .map(|p| p.average_cost)
            .filter(|cost| *cost > Decimal::ZERO)
    }

    /// All assets with a ledger row, zeroed rows included.
    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    fn persist(&self) {
        let rows: Vec<StoredPosition> = self
            .positions
            .iter()
            .map(|(asset, pos)| StoredPosition {
                asset: asset.clone(),
                quantity: pos.quantity,
                average_cost: pos.average_cost,
                updated_at: pos.updated_at,
            })
            .collect();

        if let Err(e) = self.store.save_all(&rows) {
            warn!(error = %e, "Failed to persist ledger, continuing on in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn empty_ledger() -> PositionLedger {
        PositionLedger::load(LedgerStore::in_memory().unwrap()).unwrap()
    }

    #[test]
    fn test_first_buy_sets_cost_to_fill_price() {
        let mut ledger = empty_ledger();
        ledger.record_buy("BTC", dec!(0.5), dec!(40000));
        assert_eq!(ledger.cost_basis("BTC"), Some(dec!(40000)));
        assert_eq!(ledger.positions()["BTC"].quantity, dec!(0.5));
    }

    #[test]
    fn test_second_buy_merges_weighted_average() {
        let mut ledger = empty_ledger();
        ledger.record_buy("ETH", dec!(1), dec!(2000));
        ledger.record_buy("ETH", dec!(3), dec!(2400));
        // (2000*1 + 2400*3) / 4 = 2300
        assert_eq!(ledger.cost_basis("ETH"), Some(dec!(2300)));
        assert_eq!(ledger.positions()["ETH"].quantity, dec!(4));
    }

    #[test]
    fn test_liquidation_zeroes_quantity_but_keeps_cost() {
        let mut ledger = empty_ledger();
        ledger.record_buy("SOL", dec!(10), dec!(150));
        ledger.record_liquidation("SOL");

        let position = &ledger.positions()["SOL"];
        assert_eq!(position.quantity, Decimal::ZERO);
        assert_eq!(position.average_cost, dec!(150));
        assert_eq!(ledger.cost_basis("SOL"), Some(dec!(150)));
    }

    #[test]
    fn test_rebuy_after_liquidation_takes_fill_price() {
        let mut ledger = empty_ledger();
        ledger.record_buy("SOL", dec!(10), dec!(150));
        ledger.record_liquidation("SOL");
        ledger.record_buy("SOL", dec!(5), dec!(90));
        assert_eq!(ledger.cost_basis("SOL"), Some(dec!(90)));
        assert_eq!(ledger.positions()["SOL"].quantity, dec!(5));
    }

    #[test]
    fn test_cost_basis_absent_without_record() {
        let ledger = empty_ledger();
        assert_eq!(ledger.cost_basis("DOGE"), None);
    }

    #[test]
    fn test_non_positive_fills_ignored() {
        let mut ledger = empty_ledger();
        ledger.record_buy("BTC", dec!(0), dec!(100));
        ledger.record_buy("BTC", dec!(1), dec!(0));
        assert_eq!(ledger.cost_basis("BTC"), None);
    }

    #[test]
    fn test_ledger_survives_reload() {
        let dir = std::env::temp_dir().join("signal-rotator-ledger-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reload.db");
        let _ = std::fs::remove_file(&path);
        {
            let mut ledger = PositionLedger::load(LedgerStore::open(&path).unwrap()).unwrap();
            ledger.record_buy("BTC", dec!(2), dec!(30000));
        }
        let reloaded = PositionLedger::load(LedgerStore::open(&path).unwrap()).unwrap();
        assert_eq!(reloaded.cost_basis("BTC"), Some(dec!(30000)));
        let _ = std::fs::remove_file(&path);
    }
}
