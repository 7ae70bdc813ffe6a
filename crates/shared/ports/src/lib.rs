//! Tradeflow Ports
//!
//! Port definitions (traits) for the trade ingestion pipeline.
//! These define the boundaries between pipeline logic and infrastructure:
//! the queue the producer publishes to, the partitions the consumer reads,
//! the staging store rows land in, and the clock uploads are dated by.

mod clock;
mod error;
mod queue;
mod store;

pub use clock::Clock;
pub use error::{PublishError, PublishResult, StoreError, StoreResult};
pub use queue::{MessageQueue, PartitionReceiver, PendingDelivery, QueueRecord, RecordMetadata};
pub use store::{InsertOutcome, StagingStore};
