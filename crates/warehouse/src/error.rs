use thiserror::Error;
use tradeflow_ports::StoreError;

/// Errors raised while opening or reading the warehouse
#[derive(Error, Debug)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (creating the database directory).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A stored value could not be read back into its domain type.
    #[error("Invalid data in column {column}: {value}")]
    InvalidData { column: &'static str, value: String },
}

impl From<WarehouseError> for StoreError {
    fn from(err: WarehouseError) -> Self {
        StoreError::Connection(err.to_string())
    }
}
