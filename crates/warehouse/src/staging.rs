//! `DuckDB`-backed staging store.
//!
//! The database is opened once; every insert then takes its own connection
//! to it (`try_clone`), runs on the blocking pool, and drops the connection
//! when done. Nothing is batched and no transaction spans two trades.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use ::duckdb::{Connection, params};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tradeflow_core::{StagedRow, TradeId};
use tradeflow_ports::{InsertOutcome, StagingStore, StoreError, StoreResult};

use crate::error::WarehouseError;
use crate::migrations;

const INSERT_SQL: &str = "INSERT OR IGNORE INTO transactions_staging \
     (id, trade_date, trader, fund, security, quantity, price) \
     VALUES (?, CAST(? AS DATE), ?, ?, ?, CAST(? AS DECIMAL(38, 10)), CAST(? AS DECIMAL(38, 10)))";

const SELECT_SQL: &str = "SELECT id, CAST(trade_date AS VARCHAR), trader, fund, security, \
     CAST(quantity AS VARCHAR), CAST(price AS VARCHAR) \
     FROM transactions_staging WHERE id = ?";

/// Configuration for the staging database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Path to the `DuckDB` database file; `None` keeps it in memory.
    pub db_path: Option<PathBuf>,
    /// Turn off automatic extension discovery and download on every connection.
    pub disable_extension_autoload: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            db_path: Some(PathBuf::from("data").join("warehouse.duckdb")),
            disable_extension_autoload: true,
        }
    }
}

impl WarehouseConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            ..Self::default()
        }
    }
}

struct Inner {
    config: WarehouseConfig,
    // Root handle of the opened database; never used for inserts directly
    root: Mutex<Connection>,
}

impl Inner {
    fn connect(&self) -> Result<Connection, WarehouseError> {
        let connection = {
            let root = self
                .root
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            root.try_clone()?
        };
        configure_connection(&connection, &self.config)?;
        Ok(connection)
    }

    fn insert_blocking(&self, row: &StagedRow) -> StoreResult<InsertOutcome> {
        let trade_id = row.trade_id.to_string();
        // DuckDB would round or overflow these on the cast
        if let Some(column) = row.unstorable_amount() {
            return Err(StoreError::Insert {
                trade_id,
                message: format!("{} does not fit DECIMAL(38, 10)", column),
            });
        }
        let insert_failed = |e: ::duckdb::Error| StoreError::Insert {
            trade_id: trade_id.clone(),
            message: e.to_string(),
        };

        let connection = self.connect()?;
        let changed = connection
            .execute(
                INSERT_SQL,
                params![
                    trade_id,
                    row.trade_date.format("%Y-%m-%d").to_string(),
                    row.trader,
                    row.fund,
                    row.security,
                    row.quantity.to_string(),
                    row.price.to_string(),
                ],
            )
            .map_err(insert_failed)?;

        Ok(if changed == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }
}

/// Staging store writing to a `DuckDB` `transactions_staging` table.
#[derive(Clone)]
pub struct DuckDbStagingStore {
    inner: Arc<Inner>,
}

impl DuckDbStagingStore {
    /// Open (creating if needed) the database and apply migrations.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        let root = match config.db_path.as_deref() {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
            None => Connection::open_in_memory()?,
        };
        configure_connection(&root, &config)?;
        migrations::apply_migrations(&root)?;

        log::info!(
            "Opened staging warehouse at {}",
            config
                .db_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string())
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                root: Mutex::new(root),
            }),
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.inner.config.db_path.as_deref()
    }

    /// Insert on the calling thread
    pub fn insert_blocking(&self, row: &StagedRow) -> StoreResult<InsertOutcome> {
        self.inner.insert_blocking(row)
    }

    /// Number of rows in `transactions_staging`
    pub fn row_count(&self) -> Result<u64, WarehouseError> {
        let connection = self.inner.connect()?;
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM transactions_staging", [], |row| {
                row.get(0)
            })?;
        Ok(count.max(0) as u64)
    }

    /// Read back one staged row
    pub fn fetch(&self, trade_id: &TradeId) -> Result<Option<StagedRow>, WarehouseError> {
        let connection = self.inner.connect()?;
        let raw = connection.query_row(SELECT_SQL, params![trade_id.to_string()], |row| {
            Ok([
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ])
        });

        let [id, trade_date, trader, fund, security, quantity, price] = match raw {
            Ok(values) => values,
            Err(::duckdb::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(StagedRow {
            trade_id: TradeId::parse_str(&id).map_err(|_| WarehouseError::InvalidData {
                column: "id",
                value: id.clone(),
            })?,
            trade_date: NaiveDate::parse_from_str(&trade_date, "%Y-%m-%d").map_err(|_| {
                WarehouseError::InvalidData {
                    column: "trade_date",
                    value: trade_date.clone(),
                }
            })?,
            trader,
            fund,
            security,
            quantity: parse_decimal("quantity", quantity)?,
            price: parse_decimal("price", price)?,
        }))
    }
}

#[async_trait]
impl StagingStore for DuckDbStagingStore {
    async fn insert(&self, row: &StagedRow) -> StoreResult<InsertOutcome> {
        let inner = Arc::clone(&self.inner);
        let row = row.clone();
        tokio::task::spawn_blocking(move || inner.insert_blocking(&row))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    fn name(&self) -> &str {
        "DuckDbStagingStore"
    }
}

fn parse_decimal(column: &'static str, value: String) -> Result<Decimal, WarehouseError> {
    Decimal::from_str(&value).map_err(|_| WarehouseError::InvalidData { column, value })
}

/// Per-connection settings.
fn configure_connection(
    connection: &Connection,
    config: &WarehouseConfig,
) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")?;
    if config.disable_extension_autoload {
        connection.execute_batch(
            "SET autoinstall_known_extensions = false; SET autoload_known_extensions = false;",
        )?;
    }
    Ok(())
}
