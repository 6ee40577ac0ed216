use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrate::Migration;

/// Raw service instance lifecycle events. Same shape as the app events table.
pub struct CreateServiceUsageEvents;

#[async_trait]
impl Migration for CreateServiceUsageEvents {
    fn name(&self) -> &'static str {
        "002_create_service_usage_events"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS service_usage_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guid TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                raw_message TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS service_usage_events_created_at_idx ON service_usage_events (created_at)",
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
