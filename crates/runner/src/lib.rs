//! Tradeflow Runner - trade-file ingestion pipeline
//!
//! Wires the pipeline together from a JSON config:
//!
//! - **Config**: file + `TRADEFLOW_*` environment overrides
//! - **Bootstrap**: broker, staging store, consumer group, worker pool, upload store
//! - **Shutdown**: finish files, drain the queue, report totals
//!
//! ## Architecture
//!
//! ```text
//!        files / uploads
//!              │
//!              ▼
//!   ┌─────────────────────┐      ┌─────────────────────┐
//!   │    UploadStore      │─────►│   FileDispatcher    │
//!   │ <root>/yyyy/m/d/... │      │  4 core / 8 max     │
//!   └─────────────────────┘      └──────────┬──────────┘
//!                                           │ IngestProducer
//!                                           ▼
//!                              ┌─────────────────────────┐
//!                              │ InMemoryBroker          │
//!                              │ "transactions" [p0..pN] │
//!                              └──────────┬──────────────┘
//!                                         │ one task per partition
//!                                         ▼
//!                              ┌─────────────────────────┐
//!                              │ IngestConsumer          │
//!                              │   └─ StoreWriter        │
//!                              └──────────┬──────────────┘
//!                                         ▼
//!                              transactions_staging (DuckDB)
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;

// Re-export main types
pub use bootstrap::{Pipeline, PipelineSummary, StagingBackend};
pub use config::{
    ConfigError, PipelineConfig, QueueSettings, StoreBackend, StoreSettings, UploadSettings,
    WorkerSettings,
};
pub use error::RunnerError;
