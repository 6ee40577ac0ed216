//! The `schema_migrations` table: which migrations have been applied.
//!
//! Every function takes the connection of the caller's transaction so the
//! ledger row commits or rolls back together with the migration body.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::model::MigrationRecord;

pub const LEDGER_TABLE: &str = "schema_migrations";

/// Create the ledger table. Safe to call on a database that already has it.
pub async fn init(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY NOT NULL,
            applied_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn is_applied(conn: &mut SqliteConnection, name: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM schema_migrations WHERE name = ?1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.is_some())
}

/// Insert the ledger row. The primary key rejects a second record for the same
/// name, so two racing migrators cannot both commit the same migration.
pub async fn record(
    conn: &mut SqliteConnection,
    name: &str,
    applied_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO schema_migrations (name, applied_at) VALUES (?1, ?2)")
        .bind(name)
        .bind(applied_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// All ledger rows, ordered by name.
pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<MigrationRecord>, sqlx::Error> {
    let rows: Vec<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT name, applied_at FROM schema_migrations ORDER BY name")
            .fetch_all(&mut *conn)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(name, applied_at)| MigrationRecord { name, applied_at })
        .collect())
}
