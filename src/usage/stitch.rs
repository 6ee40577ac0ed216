use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::*;

// ── Event pairing ────────────────────────────────────────────────

/// Pair opening and closing events into resource durations.
///
/// Events are grouped by (kind, resource guid) and sorted by `created_at`, then
/// event guid, then row id. Walking a group, the first opening event starts an
/// interval and the next closing event ends it. Further opening events while an
/// interval is open, closing events with nothing open, and lifecycle noise are
/// passed over. An interval still open at the end of the history gets
/// `stop = None`.
///
/// Footprint comes from the opening event. Plan name and node count are left
/// empty; see [`PlanHistory::annotate`](super::plans::PlanHistory::annotate).
pub fn stitch(events: impl IntoIterator<Item = LifecycleEvent>) -> Vec<ResourceDuration> {
    let mut groups: BTreeMap<(ResourceKind, String), Vec<LifecycleEvent>> = BTreeMap::new();
    for event in events {
        groups
            .entry((event.kind, event.resource_guid.clone()))
            .or_default()
            .push(event);
    }

    let mut durations = Vec::new();
    for (_, mut group) in groups {
        group.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.event_guid.cmp(&b.event_guid))
                .then_with(|| a.seq.cmp(&b.seq))
        });

        let mut open: Option<LifecycleEvent> = None;
        for event in group {
            match event.transition {
                Transition::Open => {
                    if open.is_none() {
                        open = Some(event);
                    }
                }
                Transition::Close => {
                    if let Some(opening) = open.take() {
                        durations.push(duration(opening, Some(event.created_at)));
                    }
                }
                Transition::Other => {}
            }
        }
        if let Some(opening) = open {
            durations.push(duration(opening, None));
        }
    }
    durations
}

fn duration(opening: LifecycleEvent, stop: Option<DateTime<Utc>>) -> ResourceDuration {
    ResourceDuration {
        guid: opening.resource_guid,
        kind: opening.kind,
        resource_name: opening.resource_name,
        org_guid: opening.org_guid,
        space_guid: opening.space_guid,
        plan_guid: opening.plan_guid,
        plan_name: None,
        number_of_nodes: None,
        span: OpenSpan {
            start: opening.created_at,
            stop,
        },
        memory_in_mb: opening.footprint.memory_in_mb(),
        storage_in_mb: opening.footprint.storage_in_mb(),
    }
}
