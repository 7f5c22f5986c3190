//! Log normalization, enrichment, batching, and delivery.
//!
//! This module implements the forwarding pipeline between the Azure
//! Functions trigger and the New Relic Logs API:
//!
//! ```text
//!    Raw trigger payload
//!          │
//!          v
//!   ┌──────────────┐
//!   │  Normalizer  │  (flatten heterogeneous shapes into records)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │   Enricher   │  (azure resource metadata, epoch timestamp)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │  Assembler   │  (envelope, JSON, gzip)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │   Splitter   │  (bisect until under the payload ceiling)
//!   └──────┬───────┘
//!          │
//!          v
//!   ┌──────────────┐
//!   │   Flusher    │  (HTTP POST with retry)
//!   └──────────────┘
//! ```

use serde_json::Value;

pub mod assembler;
pub(crate) mod constants;
pub mod enricher;
pub mod flusher;
pub mod normalizer;
pub mod splitter;

/// A single log event.
///
/// Records are open-ended key/value bags; enrichment adds fields to object
/// records in place and leaves non-object records untouched. Plain strings
/// are wrapped as `{"message": ...}` during normalization, but elements
/// lifted out of a `records` wrapper are forwarded exactly as received.
pub type LogRecord = Value;

/// Raw payload handed over by the host trigger.
///
/// Azure delivers log batches in several shapes depending on the trigger
/// binding: newline-delimited text, a byte buffer of the same, or already
/// parsed JSON (an object, a `records` wrapper, or an array).
#[derive(Debug, Clone)]
pub enum LogPayload {
    /// UTF-8 text, possibly newline-delimited.
    Text(String),
    /// Raw bytes, decoded as UTF-8 text.
    Binary(Vec<u8>),
    /// Already-parsed JSON from the trigger binding.
    Structured(Value),
}

impl From<&str> for LogPayload {
    fn from(text: &str) -> Self {
        LogPayload::Text(text.to_string())
    }
}

impl From<Value> for LogPayload {
    fn from(value: Value) -> Self {
        LogPayload::Structured(value)
    }
}

/// Identity of the host invocation that supplied the payload.
///
/// Reported in the envelope's common attributes so shipped records can be
/// traced back to the function execution that forwarded them.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    pub function_name: String,
    pub invocation_id: String,
}

impl InvocationContext {
    #[must_use]
    pub fn new(function_name: &str, invocation_id: &str) -> Self {
        InvocationContext {
            function_name: function_name.to_string(),
            invocation_id: invocation_id.to_string(),
        }
    }
}
