//! Normalization of heterogeneous trigger payloads into log records.
//!
//! Azure delivers log batches in several shapes: newline-delimited text,
//! byte buffers, a single JSON object, a `records` wrapper object (the
//! diagnostic-settings export format), or arrays of any of these. This
//! module flattens all of them into one ordered sequence of records.
//!
//! # Classification
//!
//! After parsing, the payload falls into one of these shapes:
//!
//! | Shape                                   | Output                          |
//! |-----------------------------------------|---------------------------------|
//! | object with `records`                   | the `records` elements          |
//! | object without `records`                | the object itself               |
//! | array of objects with `records`         | all `records`, concatenated     |
//! | array of objects without `records`      | each wrapped as `{message: _}`  |
//! | array of strings                        | each wrapped as `{message: _}`  |
//! | anything else                           | empty (invalid format)          |
//!
//! An empty output sequence is the sole error signal; the orchestrator
//! logs a warning and aborts the invocation.

use serde_json::{json, Value};

use crate::logs::{LogPayload, LogRecord};

/// Flattens a raw trigger payload into an ordered sequence of log records.
///
/// Returns an empty vector when the payload cannot be classified; there is
/// no other failure mode.
#[must_use]
pub fn normalize(payload: LogPayload) -> Vec<LogRecord> {
    classify(parse(payload))
}

/// Coerces the payload into a parsed JSON value.
///
/// Text that fails to parse as JSON is split into trimmed lines. For array
/// input, each string element is parsed independently; if any element fails
/// to parse the entire original array is kept unparsed. Partial per-element
/// results are intentionally discarded, matching the behavior the receiving
/// API expects from this forwarder.
fn parse(payload: LogPayload) -> Value {
    match payload {
        LogPayload::Text(text) => parse_text(&text),
        LogPayload::Binary(bytes) => parse_text(&String::from_utf8_lossy(&bytes)),
        LogPayload::Structured(Value::Array(elements)) => parse_elements(elements),
        LogPayload::Structured(value @ Value::Object(_)) => value,
        // A string value is a log line, not JSON to re-serialize.
        LogPayload::Structured(Value::String(text)) => parse_text(&text),
        // Remaining scalars; coerce through their JSON text.
        LogPayload::Structured(other) => parse_text(&other.to_string()),
    }
}

fn parse_text(text: &str) -> Value {
    match serde_json::from_str(text.trim()) {
        Ok(value) => value,
        Err(_) => Value::Array(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| Value::String(line.to_string()))
                .collect(),
        ),
    }
}

fn parse_elements(elements: Vec<Value>) -> Value {
    let parsed: Option<Vec<Value>> = elements
        .iter()
        .map(|element| match element {
            Value::String(text) => serde_json::from_str(text).ok(),
            // Non-string elements cannot be re-parsed.
            _ => None,
        })
        .collect();

    match parsed {
        Some(values) => Value::Array(values),
        None => Value::Array(elements),
    }
}

/// Classifies a parsed payload and flattens it into records.
fn classify(parsed: Value) -> Vec<LogRecord> {
    match parsed {
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(records)) => records,
            // A `records` field that is not a sequence is an invalid export.
            Some(_) => Vec::new(),
            None => vec![Value::Object(map)],
        },
        Value::Array(elements) => classify_sequence(elements),
        _ => Vec::new(),
    }
}

fn classify_sequence(elements: Vec<Value>) -> Vec<LogRecord> {
    let first_has_records = matches!(
        elements.first(),
        Some(Value::Object(map)) if map.contains_key("records")
    );

    if first_has_records {
        let mut records = Vec::new();
        for element in &elements {
            if let Some(Value::Array(items)) = element.get("records") {
                records.extend(items.iter().cloned());
            }
        }
        return records;
    }

    match elements.first() {
        Some(Value::Object(_) | Value::String(_)) => elements
            .into_iter()
            .map(|element| json!({ "message": element }))
            .collect(),
        _ => Vec::new(),
    }
}
