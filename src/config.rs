use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://billing.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Settings read once at startup from `BILLING_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub metrics_port: Option<u16>,
    /// Apply up to and including this migration instead of the whole catalog.
    pub migrate_target: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("BILLING_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let max_connections = match get("BILLING_MAX_CONNECTIONS") {
            Some(v) => parse("BILLING_MAX_CONNECTIONS", v)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let metrics_port = get("BILLING_METRICS_PORT")
            .map(|v| parse("BILLING_METRICS_PORT", v))
            .transpose()?;
        let migrate_target = get("BILLING_MIGRATE_TARGET");

        Ok(Self {
            database_url,
            max_connections,
            metrics_port,
            migrate_target,
        })
    }
}

fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}
