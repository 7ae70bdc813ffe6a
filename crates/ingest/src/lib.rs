//! Tradeflow Ingest
//!
//! The moving parts of the trade-file pipeline:
//! - **Upload store**: lands uploads in dated folders and schedules them
//! - **File dispatcher**: bounded worker pool running the producer per file
//! - **Ingest producer**: validates lines, encodes trades, publishes them
//! - **Ingest consumer**: one task per partition, decodes and stages rows
//! - **Store writer**: one insert per message, outcome logged
//!
//! ## Architecture
//!
//! ```text
//! upload ──► UploadStore ──► FileDispatcher ──► IngestProducer
//!            <root>/y/m/d     4 core / 8 max        │ validate_line
//!                             backlog 1000          │ IngestMessage (JSON)
//!                                                   ▼
//!                                    MessageQueue "transactions"
//!                                                   │ per partition
//!                                                   ▼
//!                     StagingStore ◄── StoreWriter ◄── IngestConsumer
//!                transactions_staging
//! ```
//!
//! Nothing in this crate retries. A rejected line, a failed publish, an
//! undecodable message or a failed insert is logged, counted, and dropped.

pub mod consumer;
pub mod dispatcher;
pub mod error;
pub mod producer;
pub mod report;
pub mod store_writer;
pub mod upload;

pub use consumer::{
    ConsumeOutcome, ConsumerGroup, ConsumerStats, ConsumerStatsSnapshot, IngestConsumer,
};
pub use dispatcher::{FileDispatcher, WorkerPoolConfig};
pub use error::{DispatchError, UploadError};
pub use producer::IngestProducer;
pub use report::{Delivery, FileReport, PublishFailure, Rejection};
pub use store_writer::{StoreWriter, WriteOutcome};
pub use upload::UploadStore;
