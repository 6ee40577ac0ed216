use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::info;

use crate::migrate::Migration;
use crate::usage;

/// Creates `resource_durations` and fills it once from the event history.
///
/// Not re-entrant: running the body twice would insert every interval twice.
/// The ledger guarantees it runs once; a rebuild belongs in a later migration.
pub struct CreateResourceDurations;

#[async_trait]
impl Migration for CreateResourceDurations {
    fn name(&self) -> &'static str {
        "051_create_resource_durations"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resource_durations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                guid TEXT NOT NULL,
                resource_type TEXT NOT NULL CHECK (resource_type IN ('app', 'service')),
                resource_name TEXT,
                org_guid TEXT,
                space_guid TEXT,
                plan_guid TEXT,
                plan_name TEXT,
                number_of_nodes INTEGER,
                start TEXT NOT NULL,
                stop TEXT,
                memory_in_mb INTEGER CHECK (memory_in_mb >= 0),
                storage_in_mb INTEGER CHECK (storage_in_mb >= 0)
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS resource_durations_guid_idx ON resource_durations (guid, start)",
        )
        .execute(&mut *conn)
        .await?;

        let report = usage::generate_resource_durations(conn).await?;
        info!(
            "generated {} resource durations ({} open) from {} events, {} ignored",
            report.durations, report.open, report.events, report.ignored
        );
        Ok(())
    }
}
