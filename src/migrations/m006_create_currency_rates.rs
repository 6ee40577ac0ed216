use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::migrate::Migration;

pub struct CreateCurrencyRates;

#[async_trait]
impl Migration for CreateCurrencyRates {
    fn name(&self) -> &'static str {
        "006_create_currency_rates"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS currency_rates (
                code TEXT NOT NULL,
                valid_from TEXT NOT NULL,
                rate REAL NOT NULL CHECK (rate > 0),
                PRIMARY KEY (code, valid_from)
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
