use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::schema::add_column_if_missing;
use crate::migrate::Migration;

/// Footprint of a provisioned instance of the plan. 0 when the plan is not
/// memory/storage metered.
pub struct AddMbFieldsToPricingPlans;

#[async_trait]
impl Migration for AddMbFieldsToPricingPlans {
    fn name(&self) -> &'static str {
        "050_add_mb_fields_to_pricing_plans"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        add_column_if_missing(
            conn,
            "pricing_plans",
            "memory_in_mb",
            "INTEGER NOT NULL DEFAULT 0 CHECK (memory_in_mb >= 0)",
        )
        .await?;
        add_column_if_missing(
            conn,
            "pricing_plans",
            "storage_in_mb",
            "INTEGER NOT NULL DEFAULT 0 CHECK (storage_in_mb >= 0)",
        )
        .await?;
        Ok(())
    }
}
