//! # Tradeflow Warehouse
//!
//! Staging store implementations for the ingest consumer.
//!
//! - [`DuckDbStagingStore`]: `DuckDB` analytical store. Parameterized single-row
//!   inserts into `transactions_staging`, one connection per insert.
//! - [`InMemoryStagingStore`]: same contract, kept in a concurrent map.
//!
//! Both key rows by trade id. A second insert of the same trade id is a
//! constraint-driven no-op reported as
//! [`InsertOutcome::Duplicate`](tradeflow_ports::InsertOutcome), which is how
//! duplicate deliveries from the queue are absorbed.
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `transactions_staging` | One row per trade id |
//! | `schema_migrations` | Applied migration versions |

pub mod error;
pub mod memory;
pub mod migrations;
pub mod staging;

pub use error::WarehouseError;
pub use memory::InMemoryStagingStore;
pub use staging::{DuckDbStagingStore, WarehouseConfig};
