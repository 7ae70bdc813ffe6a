//! Error types for the runner

use std::path::PathBuf;
use thiserror::Error;
use tradeflow_ingest::UploadError;
use tradeflow_queue::BrokerError;
use tradeflow_warehouse::WarehouseError;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Staging store error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("Queue error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
