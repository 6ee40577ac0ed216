//! Usage events in, resource durations out.
//!
//! The aggregator reads the committed event history for each resource kind,
//! validates each payload into a [`LifecycleEvent`](crate::model::LifecycleEvent),
//! pairs opening and closing events per resource, attaches the pricing plan
//! revision in force at each interval start and writes the result to
//! `resource_durations`. It runs inside the transaction of the migration that
//! delivers it and never touches `pricing_plans` rows.

pub mod payload;
pub mod plans;
pub mod stitch;
mod store;

pub use plans::PlanHistory;
pub use stitch::stitch;
pub use store::{LoadedEvents, load_events, load_resource_durations, write_resource_durations};

use sqlx::SqliteConnection;
use tracing::info;

use crate::model::ResourceKind;
use crate::observability;

/// Counts from one aggregation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub events: usize,
    pub ignored: usize,
    pub durations: usize,
    /// Durations with `stop = NULL`.
    pub open: usize,
}

/// Compute and insert resource durations for every resource kind.
pub async fn generate_resource_durations(
    conn: &mut SqliteConnection,
) -> Result<GenerationReport, sqlx::Error> {
    let plans = PlanHistory::load(conn).await?;
    let mut report = GenerationReport::default();

    for kind in ResourceKind::ALL {
        let loaded = load_events(conn, kind).await?;
        let event_count = loaded.events.len();
        report.events += event_count;
        report.ignored += loaded.ignored;

        let mut durations = stitch(loaded.events);
        plans.annotate(&mut durations);
        write_resource_durations(conn, &durations).await?;

        let open = durations.iter().filter(|d| d.span.is_open()).count();
        metrics::counter!(observability::RESOURCE_DURATIONS_GENERATED_TOTAL, "kind" => kind.label())
            .increment(durations.len() as u64);
        info!(
            "{} durations: {} intervals ({} open) from {} events",
            kind.label(),
            durations.len(),
            open,
            event_count
        );
        report.durations += durations.len();
        report.open += open;
    }

    Ok(report)
}
