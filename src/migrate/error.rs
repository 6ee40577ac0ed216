use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    /// The catalog could not be enumerated. Raised before any database work.
    #[error("migration catalog unreadable: {reason}")]
    Discovery { reason: String },

    /// The ledger table could not be read or written.
    #[error("schema ledger error: {0}")]
    Ledger(#[source] sqlx::Error),

    /// A migration body failed; its transaction was rolled back.
    #[error("migration {name} failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    /// A name that is not in the catalog.
    #[error("migration {0} was not found")]
    NotFound(String),

    #[error("database connection error: {0}")]
    Connect(#[source] sqlx::Error),
}

impl MigrationError {
    pub(crate) fn discovery(reason: impl Into<String>) -> Self {
        MigrationError::Discovery {
            reason: reason.into(),
        }
    }

    /// Name of the migration that failed, if this error is about one.
    pub fn migration_name(&self) -> Option<&str> {
        match self {
            MigrationError::Migration { name, .. } => Some(name),
            MigrationError::NotFound(name) => Some(name),
            _ => None,
        }
    }
}
