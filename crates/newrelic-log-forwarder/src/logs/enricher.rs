//! Per-record metadata enrichment.
//!
//! Enrichment is a pure in-place transform applied to every normalized
//! record, in order. It never fails: records that do not carry the
//! triggering fields are left untouched, and both transforms are idempotent.
//!
//! # Resource metadata
//!
//! Azure resource IDs follow the pattern
//! `/subscriptions/<sub>/resourceGroups/<rg>/providers/<provider>/<type>/<name>`.
//! When a record's `resourceId` starts with `/subscriptions/` (case
//! insensitive), the ID is lower-cased, split on `/`, and the segments are
//! projected into `metadata` and `azure` objects. Segment indices beyond
//! the end of a short ID are simply skipped.
//!
//! # Timestamp
//!
//! `time` (or, failing that, `timeStamp`) is parsed as an ISO-8601 date
//! string and written back as epoch-millisecond `timestamp`. Unparseable
//! or absent values leave `timestamp` unset.

use chrono::{DateTime, NaiveDateTime};
use serde_json::{json, Map, Value};

use crate::logs::LogRecord;

/// Derives `metadata`, `azure`, and `displayName` fields from `resourceId`.
///
/// Mutates the record in place; does nothing for non-object records or
/// records without an Azure-shaped `resourceId`.
pub fn enrich_resource_metadata(record: &mut LogRecord) {
    let Some(object) = record.as_object_mut() else {
        return;
    };
    let Some(resource_id) = object.get("resourceId").and_then(Value::as_str) else {
        return;
    };
    let resource_id = resource_id.to_lowercase();
    if !resource_id.starts_with("/subscriptions/") {
        return;
    }

    // Leading slash yields an empty segment 0, so the subscription ID sits
    // at index 2, the resource group at 4, and the provider namespace at 6.
    let segments: Vec<&str> = resource_id.split('/').collect();
    let mut metadata = Map::new();
    let mut azure = Map::new();

    if segments.len() >= 3 {
        metadata.insert("subscriptionId".into(), json!(segments[2]));
        azure.insert("resourceId".into(), json!(resource_id.clone()));
    }
    if segments.len() >= 5 {
        metadata.insert("resourceGroup".into(), json!(segments[4]));
    }
    if segments.len() >= 7 && !segments[6].is_empty() {
        metadata.insert("source".into(), json!(rewrite_provider(segments[6])));
    }
    if segments.len() >= 8 {
        azure.insert("resourceType".into(), json!(segments[6..=7].join("/")));
        if let Some(name) = segments.get(8) {
            object.insert("displayName".into(), json!(name));
        }
    }

    if !metadata.is_empty() {
        object.insert("metadata".into(), Value::Object(metadata));
    }
    if !azure.is_empty() {
        object.insert("azure".into(), Value::Object(azure));
    }
}

/// Rewrites first-party provider namespaces to the `azure.` prefix, so
/// `microsoft.compute` is reported as source `azure.compute`.
fn rewrite_provider(provider: &str) -> String {
    match provider.strip_prefix("microsoft.") {
        Some(rest) => format!("azure.{rest}"),
        None => provider.to_string(),
    }
}

/// Derives an epoch-millisecond `timestamp` from `time` or `timeStamp`.
///
/// Mutates the record in place; bad or missing dates are not an error.
pub fn enrich_timestamp(record: &mut LogRecord) {
    let Some(object) = record.as_object_mut() else {
        return;
    };

    let millis = object
        .get("time")
        .and_then(Value::as_str)
        .and_then(parse_epoch_millis)
        .or_else(|| {
            object
                .get("timeStamp")
                .and_then(Value::as_str)
                .and_then(parse_epoch_millis)
        });

    if let Some(millis) = millis {
        object.insert("timestamp".into(), json!(millis));
    }
}

fn parse_epoch_millis(raw: &str) -> Option<i64> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.timestamp_millis());
    }
    // Azure occasionally emits offset-less timestamps; treat them as UTC.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    None
}
