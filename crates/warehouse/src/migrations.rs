use ::duckdb::{Connection, params};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "0001_transactions_staging",
    sql: r#"
CREATE TABLE IF NOT EXISTS transactions_staging (
    id TEXT PRIMARY KEY,
    trade_date DATE NOT NULL,
    trader TEXT NOT NULL,
    fund TEXT NOT NULL,
    security TEXT NOT NULL,
    quantity DECIMAL(38, 10) NOT NULL,
    price DECIMAL(38, 10) NOT NULL,
    loaded_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
}];

/// Bring the schema up to date. Safe to run on every open.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params![migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params![migration.version],
            )?;
            log::info!("Applied warehouse migration {}", migration.version);
        }
    }

    Ok(())
}
