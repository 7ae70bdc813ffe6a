use async_trait::async_trait;
use tradeflow_core::StagedRow;

use crate::error::StoreResult;

/// What a single insert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written
    Inserted,
    /// A row with this trade id already exists; nothing was written
    Duplicate,
}

/// Port for the analytical staging table
///
/// Every call is an independent unit of work: one row, one connection.
/// Re-inserting an existing trade id must report [`InsertOutcome::Duplicate`]
/// rather than fail, since the queue may deliver a message more than once.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Insert one row into `transactions_staging`
    async fn insert(&self, row: &StagedRow) -> StoreResult<InsertOutcome>;

    /// Get the store's name/identifier for debugging
    fn name(&self) -> &str {
        "StagingStore"
    }
}
