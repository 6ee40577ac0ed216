use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrate::Migration;

pub struct CreateVatRates;

#[async_trait]
impl Migration for CreateVatRates {
    fn name(&self) -> &'static str {
        "005_create_vat_rates"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vat_rates (
                code TEXT NOT NULL,
                valid_from TEXT NOT NULL,
                rate REAL NOT NULL CHECK (rate >= 0),
                PRIMARY KEY (code, valid_from)
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
