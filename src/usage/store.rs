use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use super::payload::{self, RawEvent, Rejection};
use crate::model::*;
use crate::observability;

/// Validated events of one kind plus the number left out.
#[derive(Debug, Default)]
pub struct LoadedEvents {
    pub events: Vec<LifecycleEvent>,
    pub ignored: usize,
}

/// Read the whole event table for `kind`. A bad payload or timestamp is skipped
/// and counted; it never fails the read.
pub async fn load_events(
    conn: &mut SqliteConnection,
    kind: ResourceKind,
) -> Result<LoadedEvents, sqlx::Error> {
    let sql = format!(
        "SELECT id, guid, created_at, raw_message FROM {} ORDER BY id",
        kind.event_table()
    );
    let mut rows = sqlx::query_as::<_, (i64, String, String, String)>(&sql).fetch(&mut *conn);

    let mut loaded = LoadedEvents::default();
    while let Some((seq, guid, created_at, raw_message)) = rows.try_next().await? {
        let raw = RawEvent {
            seq,
            guid,
            created_at,
            raw_message,
        };
        let event_guid = raw.guid.clone();
        match payload::parse(kind, raw) {
            Ok(event) => loaded.events.push(event),
            Err(rejection) => {
                if rejection == Rejection::NotBillable {
                    debug!("{} event {event_guid}: {}", kind.label(), rejection.label());
                } else {
                    warn!("{} event {event_guid} ignored: {}", kind.label(), rejection.label());
                }
                metrics::counter!(
                    observability::USAGE_EVENTS_IGNORED_TOTAL,
                    "kind" => kind.label(),
                    "reason" => rejection.label()
                )
                .increment(1);
                loaded.ignored += 1;
            }
        }
    }
    Ok(loaded)
}

pub async fn write_resource_durations(
    conn: &mut SqliteConnection,
    durations: &[ResourceDuration],
) -> Result<(), sqlx::Error> {
    for d in durations {
        sqlx::query(
            r#"
            INSERT INTO resource_durations (
                guid, resource_type, resource_name, org_guid, space_guid,
                plan_guid, plan_name, number_of_nodes,
                start, stop, memory_in_mb, storage_in_mb
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(d.guid.as_str())
        .bind(d.kind.label())
        .bind(d.resource_name.as_deref())
        .bind(d.org_guid.as_deref())
        .bind(d.space_guid.as_deref())
        .bind(d.plan_guid.as_deref())
        .bind(d.plan_name.as_deref())
        .bind(d.number_of_nodes.map(i64::from))
        .bind(d.span.start)
        .bind(d.span.stop)
        .bind(d.memory_in_mb.map(to_i64))
        .bind(d.storage_in_mb.map(to_i64))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

type DurationRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<i64>,
    Option<i64>,
);

/// Every stored duration, ordered by resource then start.
pub async fn load_resource_durations(
    conn: &mut SqliteConnection,
) -> Result<Vec<ResourceDuration>, sqlx::Error> {
    let rows: Vec<DurationRow> = sqlx::query_as(
        r#"
        SELECT guid, resource_type, resource_name, org_guid, space_guid,
               plan_guid, plan_name, number_of_nodes,
               start, stop, memory_in_mb, storage_in_mb
        FROM resource_durations
        ORDER BY resource_type, guid, start, id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(
            |(
                guid,
                resource_type,
                resource_name,
                org_guid,
                space_guid,
                plan_guid,
                plan_name,
                number_of_nodes,
                start,
                stop,
                memory_in_mb,
                storage_in_mb,
            )| {
                let kind = match resource_type.as_str() {
                    "app" => ResourceKind::App,
                    "service" => ResourceKind::Service,
                    other => {
                        return Err(sqlx::Error::Decode(
                            format!("unknown resource_type {other:?}").into(),
                        ));
                    }
                };
                Ok(ResourceDuration {
                    guid,
                    kind,
                    resource_name,
                    org_guid,
                    space_guid,
                    plan_guid,
                    plan_name,
                    number_of_nodes: number_of_nodes.map(|n| u32::try_from(n.max(0)).unwrap_or(u32::MAX)),
                    span: OpenSpan { start, stop },
                    memory_in_mb: memory_in_mb.map(|v| v.max(0) as u64),
                    storage_in_mb: storage_in_mb.map(|v| v.max(0) as u64),
                })
            },
        )
        .collect()
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
