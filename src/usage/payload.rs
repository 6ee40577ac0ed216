//! Typed views of the semi-structured `raw_message` column.
//!
//! Payloads are validated once here. Numeric fields that are missing, null,
//! negative or not numbers become 0; text fields of the wrong JSON type become
//! absent. A payload must be a JSON object carrying a resource guid.
//! Rows whose `created_at` does not parse as a timestamp are rejected as well.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::model::{COMPUTE_PLAN_GUID, Footprint, LifecycleEvent, ResourceKind};

/// One row of an event table, before its payload is parsed.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub seq: i64,
    pub guid: String,
    /// Stored as free text by the collector; parsed in [`parse`].
    pub created_at: String,
    pub raw_message: String,
}

/// Why an event was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Malformed,
    MissingResourceGuid,
    /// User-provided service instances are not billed.
    NotBillable,
}

impl Rejection {
    pub fn label(self) -> &'static str {
        match self {
            Rejection::Malformed => "malformed",
            Rejection::MissingResourceGuid => "missing_resource_guid",
            Rejection::NotBillable => "not_billable",
        }
    }
}

const USER_PROVIDED_INSTANCE: &str = "user_provided_service_instance";

#[derive(Debug, Deserialize)]
struct AppUsagePayload {
    #[serde(default, deserialize_with = "lenient_text")]
    state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    app_guid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    app_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    org_guid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    space_guid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    plan_guid: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    instance_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    memory_in_mb_per_instance: u64,
}

#[derive(Debug, Deserialize)]
struct ServiceUsagePayload {
    #[serde(default, deserialize_with = "lenient_text")]
    state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    service_instance_guid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    service_instance_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    service_instance_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    service_plan_guid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    org_guid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    space_guid: Option<String>,
}

/// Validate a raw event of the given kind.
pub fn parse(kind: ResourceKind, raw: RawEvent) -> Result<LifecycleEvent, Rejection> {
    match kind {
        ResourceKind::App => parse_app(raw),
        ResourceKind::Service => parse_service(raw),
    }
}

/// Accept JSON objects only. Derived struct deserializers would also fill
/// fields positionally from an array.
fn object_payload<T: DeserializeOwned>(raw_message: &str) -> Result<T, Rejection> {
    match serde_json::from_str(raw_message) {
        Ok(Value::Object(map)) => {
            serde_json::from_value(Value::Object(map)).map_err(|_| Rejection::Malformed)
        }
        _ => Err(Rejection::Malformed),
    }
}

/// RFC 3339, or `YYYY-MM-DD HH:MM:SS[.f]` (also with `T`) taken as UTC.
fn parse_created_at(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_app(raw: RawEvent) -> Result<LifecycleEvent, Rejection> {
    let created_at = parse_created_at(&raw.created_at).ok_or(Rejection::Malformed)?;
    let payload: AppUsagePayload = object_payload(&raw.raw_message)?;
    let resource_guid = payload.app_guid.ok_or(Rejection::MissingResourceGuid)?;
    let state = payload.state.unwrap_or_default();

    Ok(LifecycleEvent {
        kind: ResourceKind::App,
        event_guid: raw.guid,
        seq: raw.seq,
        created_at,
        resource_guid,
        transition: ResourceKind::App.transition(&state),
        footprint: Footprint::Metered {
            memory_in_mb: payload
                .memory_in_mb_per_instance
                .saturating_mul(payload.instance_count),
            storage_in_mb: 0,
        },
        plan_guid: Some(
            payload
                .plan_guid
                .unwrap_or_else(|| COMPUTE_PLAN_GUID.to_string()),
        ),
        resource_name: payload.app_name,
        org_guid: payload.org_guid,
        space_guid: payload.space_guid,
    })
}

fn parse_service(raw: RawEvent) -> Result<LifecycleEvent, Rejection> {
    let created_at = parse_created_at(&raw.created_at).ok_or(Rejection::Malformed)?;
    let payload: ServiceUsagePayload = object_payload(&raw.raw_message)?;
    if payload.service_instance_type.as_deref() == Some(USER_PROVIDED_INSTANCE) {
        return Err(Rejection::NotBillable);
    }
    let resource_guid = payload
        .service_instance_guid
        .ok_or(Rejection::MissingResourceGuid)?;
    let state = payload.state.unwrap_or_default();

    Ok(LifecycleEvent {
        kind: ResourceKind::Service,
        event_guid: raw.guid,
        seq: raw.seq,
        created_at,
        resource_guid,
        transition: ResourceKind::Service.transition(&state),
        footprint: Footprint::PlanDefined,
        plan_guid: payload.service_plan_guid,
        resource_name: payload.service_instance_name,
        org_guid: payload.org_guid,
        space_guid: payload.space_guid,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}
