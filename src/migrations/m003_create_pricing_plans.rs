use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrate::Migration;

/// Effective-dated plan revisions: one row per (plan_guid, valid_from).
pub struct CreatePricingPlans;

#[async_trait]
impl Migration for CreatePricingPlans {
    fn name(&self) -> &'static str {
        "003_create_pricing_plans"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pricing_plans (
                plan_guid TEXT NOT NULL,
                valid_from TEXT NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (plan_guid, valid_from)
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
