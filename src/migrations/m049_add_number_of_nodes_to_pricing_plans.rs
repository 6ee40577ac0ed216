use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::schema::add_column_if_missing;
use crate::migrate::Migration;

/// Clustered plans bill per node. Plans without a node count are single-node.
pub struct AddNumberOfNodesToPricingPlans;

#[async_trait]
impl Migration for AddNumberOfNodesToPricingPlans {
    fn name(&self) -> &'static str {
        "049_add_number_of_nodes_to_pricing_plans"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        add_column_if_missing(
            conn,
            "pricing_plans",
            "number_of_nodes",
            "INTEGER NOT NULL DEFAULT 1 CHECK (number_of_nodes >= 0)",
        )
        .await?;
        Ok(())
    }
}
