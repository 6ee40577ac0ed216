mod catalog;
mod error;
pub mod ledger;
#[cfg(test)]
mod tests;

pub use catalog::Catalog;
pub use error::MigrationError;

use std::collections::HashSet;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error, info, warn};

use crate::model::MigrationRecord;
use crate::observability;

/// A named, forward-only unit of schema or data change.
///
/// `up` runs inside a transaction owned by the [`Migrator`]; it must not commit
/// or roll back. Names are immutable once released.
#[async_trait]
pub trait Migration: Send + Sync {
    /// `NNN_description`, e.g. `050_add_mb_fields_to_pricing_plans`.
    fn name(&self) -> &'static str;

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error>;
}

/// Outcome of one [`Migrator::apply_migrations`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<String>,
    /// Already in the ledger.
    pub skipped: Vec<String>,
}

pub struct Migrator {
    pool: SqlitePool,
    catalog: Catalog,
}

impl Migrator {
    /// Migrator over the built-in catalog.
    pub fn new(pool: SqlitePool) -> Result<Self, MigrationError> {
        Ok(Self::with_catalog(pool, crate::migrations::catalog()?))
    }

    pub fn with_catalog(pool: SqlitePool, catalog: Catalog) -> Self {
        Self { pool, catalog }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sequence(&self) -> Vec<String> {
        self.catalog.sequence()
    }

    pub fn sequence_before(&self, boundary: &str) -> Result<Vec<String>, MigrationError> {
        self.catalog.sequence_before(boundary)
    }

    pub fn sequence_through(&self, boundary: &str) -> Result<Vec<String>, MigrationError> {
        self.catalog.sequence_through(boundary)
    }

    /// Bootstrap the ledger table. Idempotent.
    pub async fn init_schema(&self) -> Result<(), MigrationError> {
        let mut conn = self.pool.acquire().await.map_err(MigrationError::Ledger)?;
        ledger::init(&mut conn).await.map_err(MigrationError::Ledger)
    }

    /// Apply `names` in the given order, skipping those already in the ledger.
    ///
    /// The caller owns the ordering; nothing is re-sorted, so a prefix of the
    /// catalog reproduces a historical schema. Each migration and its ledger row
    /// share one transaction. The first failure rolls that migration back and
    /// stops the batch; earlier migrations stay committed.
    pub async fn apply_migrations<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<ApplyReport, MigrationError> {
        // Resolve every name before touching the database.
        let migrations = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.catalog
                    .get(n)
                    .ok_or_else(|| MigrationError::NotFound(n.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.init_schema().await?;

        let mut report = ApplyReport::default();
        for migration in migrations {
            let name = migration.name();
            let mut tx = self.pool.begin().await.map_err(MigrationError::Ledger)?;

            let already = match ledger::is_applied(&mut tx, name).await {
                Ok(already) => already,
                Err(e) => {
                    rollback(tx, name).await;
                    return Err(MigrationError::Ledger(e));
                }
            };
            if already {
                rollback(tx, name).await;
                debug!("skipping migration {name}: already applied");
                metrics::counter!(observability::MIGRATIONS_SKIPPED_TOTAL).increment(1);
                report.skipped.push(name.to_string());
                continue;
            }

            info!("applying migration {name}");
            let started = Instant::now();

            if let Err(source) = migration.up(&mut tx).await {
                rollback(tx, name).await;
                error!("migration {name} failed: {source}");
                metrics::counter!(observability::MIGRATION_FAILURES_TOTAL, "migration" => name)
                    .increment(1);
                return Err(MigrationError::Migration {
                    name: name.to_string(),
                    source,
                });
            }

            if let Err(e) = ledger::record(&mut tx, name, Utc::now()).await {
                rollback(tx, name).await;
                metrics::counter!(observability::MIGRATION_FAILURES_TOTAL, "migration" => name)
                    .increment(1);
                return Err(MigrationError::Ledger(e));
            }

            tx.commit().await.map_err(|source| {
                metrics::counter!(observability::MIGRATION_FAILURES_TOTAL, "migration" => name)
                    .increment(1);
                MigrationError::Migration {
                    name: name.to_string(),
                    source,
                }
            })?;

            let elapsed = started.elapsed();
            metrics::histogram!(observability::MIGRATION_DURATION_SECONDS, "migration" => name)
                .record(elapsed.as_secs_f64());
            metrics::counter!(observability::MIGRATIONS_APPLIED_TOTAL).increment(1);
            info!("migration {name} applied in {:.1}ms", elapsed.as_secs_f64() * 1000.0);
            report.applied.push(name.to_string());
        }

        Ok(report)
    }

    /// Ledger contents, ordered by name.
    pub async fn applied(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        self.init_schema().await?;
        let mut conn = self.pool.acquire().await.map_err(MigrationError::Ledger)?;
        ledger::list(&mut conn).await.map_err(MigrationError::Ledger)
    }

    /// The subset of `names` not yet in the ledger, in the given order.
    pub async fn pending<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>, MigrationError> {
        let applied: HashSet<String> = self.applied().await?.into_iter().map(|r| r.name).collect();
        Ok(names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| !applied.contains(*n))
            .map(str::to_string)
            .collect())
    }
}

async fn rollback(tx: Transaction<'_, Sqlite>, name: &str) {
    if let Err(e) = tx.rollback().await {
        warn!("rollback of migration {name} failed: {e}");
    }
}
