use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrate::Migration;

/// Raw app lifecycle events, appended by the event collector.
pub struct CreateAppUsageEvents;

#[async_trait]
impl Migration for CreateAppUsageEvents {
    fn name(&self) -> &'static str {
        "001_create_app_usage_events"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_usage_events (
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
            "CREATE INDEX IF NOT EXISTS app_usage_events_created_at_idx ON app_usage_events (created_at)",
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
