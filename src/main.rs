use tracing::{error, info};

use billing_schema::config::Config;
use billing_schema::db;
use billing_schema::migrate::Migrator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    billing_schema::observability::init(config.metrics_port);

    info!("billing-schema starting");
    info!("  database: {}", config.database_url);
    info!("  target: {}", config.migrate_target.as_deref().unwrap_or("latest"));
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let pool = db::connect(&config.database_url, config.max_connections).await?;
    let migrator = Migrator::new(pool.clone())?;

    let names = match &config.migrate_target {
        Some(target) => migrator.sequence_through(target)?,
        None => migrator.sequence(),
    };

    migrator.init_schema().await?;
    let result = migrator.apply_migrations(&names).await;
    pool.close().await;

    match result {
        Ok(report) => {
            info!(
                "schema up to date: {} applied, {} already present",
                report.applied.len(),
                report.skipped.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("migration halted: {e}");
            Err(e.into())
        }
    }
}
