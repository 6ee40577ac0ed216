use chrono::{DateTime, NaiveDate, Utc};

/// Plan guid attributed to app workloads whose usage event names no plan.
pub const COMPUTE_PLAN_GUID: &str = "f4d4b95a-f55e-4593-8d54-3364c25798c4";

// ── Pricing metadata ─────────────────────────────────────────────

/// The part of a `pricing_plans` row that durations are annotated with.
///
/// Revisions share `plan_guid` and are ordered by `valid_from`; the latest
/// revision not after a given instant is the effective one. Components and
/// footprint columns belong to the pricing schema and are not read here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRevision {
    pub plan_guid: String,
    pub name: String,
    pub valid_from: NaiveDate,
    pub number_of_nodes: u32,
}

// ── Usage events ─────────────────────────────────────────────────

/// The two resource kinds the event collector records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Compute workloads; footprint comes from the event.
    App,
    /// Provisioned service instances; footprint belongs to the plan.
    Service,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::App, ResourceKind::Service];

    pub fn event_table(self) -> &'static str {
        match self {
            ResourceKind::App => "app_usage_events",
            ResourceKind::Service => "service_usage_events",
        }
    }

    /// Value stored in `resource_durations.resource_type`.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::App => "app",
            ResourceKind::Service => "service",
        }
    }

    pub fn opening_state(self) -> &'static str {
        match self {
            ResourceKind::App => "STARTED",
            ResourceKind::Service => "CREATED",
        }
    }

    pub fn closing_state(self) -> &'static str {
        match self {
            ResourceKind::App => "STOPPED",
            ResourceKind::Service => "DELETED",
        }
    }

    pub fn transition(self, state: &str) -> Transition {
        if state == self.opening_state() {
            Transition::Open
        } else if state == self.closing_state() {
            Transition::Close
        } else {
            Transition::Other
        }
    }
}

/// Where a lifecycle state sits relative to a billable interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Open,
    Close,
    /// Lifecycle noise (buildpack set, staging, ...). Never opens or closes.
    Other,
}

/// Memory/storage attributed to a resource for pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footprint {
    /// Declared by the event itself.
    Metered { memory_in_mb: u64, storage_in_mb: u64 },
    /// Defined by the pricing plan; the durations table keeps it NULL.
    PlanDefined,
}

impl Footprint {
    pub fn memory_in_mb(&self) -> Option<u64> {
        match self {
            Footprint::Metered { memory_in_mb, .. } => Some(*memory_in_mb),
            Footprint::PlanDefined => None,
        }
    }

    pub fn storage_in_mb(&self) -> Option<u64> {
        match self {
            Footprint::Metered { storage_in_mb, .. } => Some(*storage_in_mb),
            Footprint::PlanDefined => None,
        }
    }
}

/// A usage event after validation at the read boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub kind: ResourceKind,
    /// Event id; tie-break for events sharing a timestamp.
    pub event_guid: String,
    /// Row id in the event table; last-resort tie-break.
    pub seq: i64,
    pub created_at: DateTime<Utc>,
    pub resource_guid: String,
    pub transition: Transition,
    pub footprint: Footprint,
    pub plan_guid: Option<String>,
    pub resource_name: Option<String>,
    pub org_guid: Option<String>,
    pub space_guid: Option<String>,
}

// ── Resource durations ───────────────────────────────────────────

/// Interval with a possibly-open end. `stop == None` means still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenSpan {
    pub start: DateTime<Utc>,
    pub stop: Option<DateTime<Utc>>,
}

impl OpenSpan {
    pub fn is_open(&self) -> bool {
        self.stop.is_none()
    }

    /// Intervals touching at an endpoint do not overlap.
    pub fn overlaps(&self, other: &OpenSpan) -> bool {
        let self_before_other_ends = match other.stop {
            Some(stop) => self.start < stop,
            None => true,
        };
        let other_before_self_ends = match self.stop {
            Some(stop) => other.start < stop,
            None => true,
        };
        self_before_other_ends && other_before_self_ends
    }
}

/// One billable interval of one resource, as written to `resource_durations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDuration {
    /// Resource guid, not the event guid.
    pub guid: String,
    pub kind: ResourceKind,
    pub resource_name: Option<String>,
    pub org_guid: Option<String>,
    pub space_guid: Option<String>,
    pub plan_guid: Option<String>,
    pub plan_name: Option<String>,
    pub number_of_nodes: Option<u32>,
    pub span: OpenSpan,
    pub memory_in_mb: Option<u64>,
    pub storage_in_mb: Option<u64>,
}

/// Ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub name: String,
    pub applied_at: DateTime<Utc>,
}
