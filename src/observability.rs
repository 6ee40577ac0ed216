use std::net::SocketAddr;

// ── Migration engine ────────────────────────────────────────────

/// Counter: migrations applied and committed.
pub const MIGRATIONS_APPLIED_TOTAL: &str = "billing_migrations_applied_total";

/// Counter: migrations skipped because the ledger already had them.
pub const MIGRATIONS_SKIPPED_TOTAL: &str = "billing_migrations_skipped_total";

/// Counter: migrations rolled back. Labels: migration.
pub const MIGRATION_FAILURES_TOTAL: &str = "billing_migration_failures_total";

/// Histogram: time from body start to commit, in seconds. Labels: migration.
pub const MIGRATION_DURATION_SECONDS: &str = "billing_migration_duration_seconds";

// ── Duration aggregator ─────────────────────────────────────────

/// Counter: resource duration rows written. Labels: kind.
pub const RESOURCE_DURATIONS_GENERATED_TOTAL: &str = "billing_resource_durations_generated_total";

/// Counter: usage events left out of pairing. Labels: kind, reason.
pub const USAGE_EVENTS_IGNORED_TOTAL: &str = "billing_usage_events_ignored_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

