use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use sqlx::SqliteConnection;
use tracing::warn;

use crate::model::{PlanRevision, ResourceDuration};

/// Every revision of every pricing plan, sorted by `valid_from` per plan guid.
#[derive(Debug, Default)]
pub struct PlanHistory {
    plans: HashMap<String, Vec<PlanRevision>>,
}

impl PlanHistory {
    pub fn new(revisions: impl IntoIterator<Item = PlanRevision>) -> Self {
        let mut plans: HashMap<String, Vec<PlanRevision>> = HashMap::new();
        for plan in revisions {
            plans.entry(plan.plan_guid.clone()).or_default().push(plan);
        }
        for revisions in plans.values_mut() {
            revisions.sort_by_key(|p| p.valid_from);
        }
        Self { plans }
    }

    /// Read the revision columns of `pricing_plans`. Read-only.
    pub async fn load(conn: &mut SqliteConnection) -> Result<Self, sqlx::Error> {
        let mut rows = sqlx::query_as::<_, (String, String, String, i64)>(
            "SELECT plan_guid, valid_from, name, number_of_nodes FROM pricing_plans",
        )
        .fetch(&mut *conn);

        let mut revisions = Vec::new();
        while let Some((plan_guid, valid_from_text, name, number_of_nodes)) = rows.try_next().await? {
            let Some(valid_from) = parse_valid_from(&valid_from_text) else {
                warn!("pricing plan {plan_guid} has unreadable valid_from {valid_from_text:?}, skipping revision");
                continue;
            };
            revisions.push(PlanRevision {
                plan_guid,
                name,
                valid_from,
                number_of_nodes: clamp_u32(number_of_nodes),
            });
        }
        Ok(Self::new(revisions))
    }

    /// The revision of `plan_guid` in force at `at`: greatest `valid_from <= at`.
    pub fn effective_at(&self, plan_guid: &str, at: DateTime<Utc>) -> Option<&PlanRevision> {
        let revisions = self.plans.get(plan_guid)?;
        let day = at.date_naive();
        let idx = revisions.partition_point(|p| p.valid_from <= day);
        idx.checked_sub(1).map(|i| &revisions[i])
    }

    /// Fill plan name and node count from the revision in force at each start.
    pub fn annotate(&self, durations: &mut [ResourceDuration]) {
        for d in durations {
            let Some(plan_guid) = d.plan_guid.as_deref() else {
                continue;
            };
            if let Some(plan) = self.effective_at(plan_guid, d.span.start) {
                d.plan_name = Some(plan.name.clone());
                d.number_of_nodes = Some(plan.number_of_nodes);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.plans.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// `valid_from` is written as a date, sometimes with a time part appended.
fn parse_valid_from(text: &str) -> Option<NaiveDate> {
    let date = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

fn clamp_u32(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}
