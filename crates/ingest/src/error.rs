//! Error types for the ingest crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors from handing a file to the producer worker pool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Worker pool saturated, rejected {0}")]
    Rejected(PathBuf),

    #[error("Worker pool is shut down")]
    ShutDown,
}

/// Errors surfaced to the uploader. These are the only failures in the
/// pipeline that reach a caller synchronously.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Invalid upload file name: {0:?}")]
    InvalidFilename(String),

    #[error("Could not create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write upload {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored upload could not be scheduled: {0}")]
    Dispatch(#[from] DispatchError),
}
