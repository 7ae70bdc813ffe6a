//! Store writer: one staged row per call, outcome logged, nothing raised

use std::sync::Arc;

use tradeflow_core::StagedRow;
use tradeflow_ports::{InsertOutcome, StagingStore};

/// What happened to a row handed to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    /// Already staged; the insert was a no-op
    Duplicate,
    /// The store refused or was unreachable; the row is lost
    Failed,
}

#[derive(Clone)]
pub struct StoreWriter {
    store: Arc<dyn StagingStore>,
}

impl StoreWriter {
    pub fn new(store: Arc<dyn StagingStore>) -> Self {
        Self { store }
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub async fn write(&self, row: &StagedRow) -> WriteOutcome {
        match self.store.insert(row).await {
            Ok(InsertOutcome::Inserted) => {
                log::debug!("Inserted transaction {}", row.trade_id);
                WriteOutcome::Inserted
            }
            Ok(InsertOutcome::Duplicate) => {
                log::info!("Transaction {} already staged, skipped", row.trade_id);
                WriteOutcome::Duplicate
            }
            Err(e) => {
                log::error!("Failed to insert transaction {}: {}", row.trade_id, e);
                WriteOutcome::Failed
            }
        }
    }
}
