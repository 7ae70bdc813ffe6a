//! In-memory staging store.
//!
//! Same contract as the `DuckDB` store (one row per trade id, re-inserts are
//! no-ops) without a database. Useful for tests and dry runs.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use tradeflow_core::{StagedRow, TradeId};
use tradeflow_ports::{InsertOutcome, StagingStore, StoreError, StoreResult};

#[derive(Default)]
pub struct InMemoryStagingStore {
    rows: DashMap<TradeId, StagedRow>,
    duplicates: AtomicU64,
    // Trade ids whose insert should fail, for exercising error paths
    poisoned: DashMap<TradeId, String>,
}

impl InMemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn fetch(&self, trade_id: &TradeId) -> Option<StagedRow> {
        self.rows.get(trade_id).map(|r| r.value().clone())
    }

    pub fn rows(&self) -> Vec<StagedRow> {
        self.rows.iter().map(|r| r.value().clone()).collect()
    }

    /// Number of inserts that hit an existing trade id
    pub fn duplicate_count(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }

    /// Make every insert of `trade_id` fail with `message`
    pub fn fail_on(&self, trade_id: TradeId, message: impl Into<String>) {
        self.poisoned.insert(trade_id, message.into());
    }
}

#[async_trait]
impl StagingStore for InMemoryStagingStore {
    async fn insert(&self, row: &StagedRow) -> StoreResult<InsertOutcome> {
        if let Some(message) = self.poisoned.get(&row.trade_id) {
            return Err(StoreError::Insert {
                trade_id: row.trade_id.to_string(),
                message: message.value().clone(),
            });
        }
        if let Some(column) = row.unstorable_amount() {
            return Err(StoreError::Insert {
                trade_id: row.trade_id.to_string(),
                message: format!("{} does not fit DECIMAL(38, 10)", column),
            });
        }

        match self.rows.entry(row.trade_id) {
            Entry::Occupied(_) => {
                self.duplicates.fetch_add(1, Ordering::Relaxed);
                Ok(InsertOutcome::Duplicate)
            }
            Entry::Vacant(slot) => {
                slot.insert(row.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    fn name(&self) -> &str {
        "InMemoryStagingStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn row() -> StagedRow {
        StagedRow {
            trade_id: Uuid::new_v4(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            fund: "FundA".to_string(),
            trader: "Alice".to_string(),
            security: "AAPL".to_string(),
            quantity: dec!(100),
            price: dec!(150.25),
        }
    }

    #[tokio::test]
    async fn test_insert_and_duplicate() {
        let store = InMemoryStagingStore::new();
        let staged = row();

        assert_eq!(store.insert(&staged).await, Ok(InsertOutcome::Inserted));
        assert_eq!(store.insert(&staged).await, Ok(InsertOutcome::Duplicate));
        assert_eq!(store.row_count(), 1);
        assert_eq!(store.duplicate_count(), 1);
        assert_eq!(store.fetch(&staged.trade_id), Some(staged));
    }

    #[tokio::test]
    async fn test_unstorable_price_is_refused() {
        let store = InMemoryStagingStore::new();
        let staged = StagedRow {
            price: dec!(150.00000000001),
            ..row()
        };

        assert!(matches!(
            store.insert(&staged).await,
            Err(StoreError::Insert { .. })
        ));
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_on() {
        let store = InMemoryStagingStore::new();
        let staged = row();
        store.fail_on(staged.trade_id, "constraint violated");

        match store.insert(&staged).await {
            Err(StoreError::Insert { trade_id, message }) => {
                assert_eq!(trade_id, staged.trade_id.to_string());
                assert_eq!(message, "constraint violated");
            }
            other => panic!("expected insert error, got {:?}", other),
        }
        assert_eq!(store.row_count(), 0);
    }
}
