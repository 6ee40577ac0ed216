use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrate::Migration;

pub struct CreatePricingPlanComponents;

#[async_trait]
impl Migration for CreatePricingPlanComponents {
    fn name(&self) -> &'static str {
        "004_create_pricing_plan_components"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        // `position` keeps the components of a revision in their declared order.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pricing_plan_components (
                plan_guid TEXT NOT NULL,
                valid_from TEXT NOT NULL,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                formula TEXT NOT NULL,
                vat_code TEXT NOT NULL,
                currency_code TEXT NOT NULL,
                PRIMARY KEY (plan_guid, valid_from, position),
                FOREIGN KEY (plan_guid, valid_from)
                    REFERENCES pricing_plans (plan_guid, valid_from) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
