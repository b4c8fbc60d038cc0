//! SQLite persistence for the position ledger.
//!
//! The ledger is small (one row per held asset) and is rewritten in full on
//! every save; there is no incremental update path to get out of sync.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// One persisted ledger row.
#[derive(Debug, Clone)]
pub struct StoredPosition {
    pub asset: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// SQLite-backed store for the position ledger.
pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    /// Open (or create) the ledger database at the given path.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create ledger directory {:?}", parent))?;
            }
        }

        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open ledger database at {:?}", db_path.as_ref()))?;

        let store = Self { conn };
        store.init_schema()?;

        info!("Ledger store opened at {:?}", db_path.as_ref());
        Ok(store)
    }

    /// Open an in-memory store. Used by tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS positions (
                asset TEXT PRIMARY KEY,
                quantity TEXT NOT NULL,
                average_cost TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        debug!("Ledger schema initialized");
        Ok(())
    }

    /// Replace the stored ledger with the given rows.
    pub fn save_all(&self, positions: &[StoredPosition]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM positions", [])?;

        for pos in positions {
            tx.execute(
                "INSERT INTO positions (asset, quantity, average_cost, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    pos.asset,
                    pos.quantity.to_string(),
                    pos.average_cost.to_string(),
                    pos.updated_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;

        debug!(positions = positions.len(), "Ledger saved to database");
        Ok(())
    }

    /// Load all stored ledger rows.
    pub fn load_all(&self) -> Result<Vec<StoredPosition>> {
        let mut stmt = self
            .conn
            .prepare("SELECT asset, quantity, average_cost, updated_at FROM positions")?;

        let positions = stmt
            .query_map([], |row| {
                Ok(StoredPosition {
                    asset: row.get(0)?,
                    quantity: Decimal::from_str(&row.get::<_, String>(1)?).unwrap_or_default(),
                    average_cost: Decimal::from_str(&row.get::<_, String>(2)?).unwrap_or_default(),
                    updated_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(3)?)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(asset: &str, quantity: Decimal, cost: Decimal) -> StoredPosition {
        StoredPosition {
            asset: asset.to_string(),
            quantity,
            average_cost: cost,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let store = LedgerStore::in_memory().unwrap();
        store
            .save_all(&[
                row("BTC", dec!(0.5), dec!(42000)),
                row("ETH", dec!(3), dec!(2500.25)),
            ])
            .unwrap();

        let mut loaded = store.load_all().unwrap();
        loaded.sort_by(|a, b| a.asset.cmp(&b.asset));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].asset, "BTC");
        assert_eq!(loaded[0].average_cost, dec!(42000));
        assert_eq!(loaded[1].quantity, dec!(3));
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let store = LedgerStore::in_memory().unwrap();
        store.save_all(&[row("BTC", dec!(1), dec!(100))]).unwrap();
        store.save_all(&[row("SOL", dec!(10), dec!(20))]).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].asset, "SOL");
    }

    #[test]
    fn test_zeroed_rows_survive() {
        let store = LedgerStore::in_memory().unwrap();
        store.save_all(&[row("BTC", dec!(0), dec!(42000))]).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded[0].quantity, Decimal::ZERO);
        assert_eq!(loaded[0].average_cost, dec!(42000));
    }
}
