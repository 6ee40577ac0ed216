use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::migrate::MigrationError;

/// Open a pool on `url` (e.g. `sqlite://billing.db?mode=rwc`), creating the file if needed.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, MigrationError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(MigrationError::Connect)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(MigrationError::Connect)
}

/// Private in-memory database. Every connection to `sqlite::memory:` is a
/// separate database, so the pool holds exactly one connection and never
/// recycles it.
pub async fn connect_in_memory() -> Result<SqlitePool, MigrationError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(MigrationError::Connect)?
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
        .map_err(MigrationError::Connect)
}
