//! Structural helpers shared by migration bodies.

use sqlx::SqliteConnection;
use tracing::debug;

pub async fn column_exists(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM pragma_table_info(?1) WHERE name = ?2")
            .bind(table)
            .bind(column)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.is_some())
}

/// `ALTER TABLE .. ADD COLUMN` unless the column is already there.
///
/// Existing rows take the column default. This is a structural step only: it
/// never writes to rows, so values stored since the column was first added are
/// left alone. Returns whether the column was added.
pub async fn add_column_if_missing(
    conn: &mut SqliteConnection,
    table: &'static str,
    column: &'static str,
    definition: &'static str,
) -> Result<bool, sqlx::Error> {
    if column_exists(conn, table, column).await? {
        debug!("{table}.{column} already exists");
        return Ok(false);
    }
    sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
        .execute(&mut *conn)
        .await?;
    Ok(true)
}
