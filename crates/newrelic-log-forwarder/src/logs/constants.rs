//! Constants for New Relic Logs API limits and forwarder defaults.
//!
//! The intake API rejects compressed payloads above roughly 1MB, so the
//! splitter enforces a hard ceiling and bisects any batch that compresses
//! above it. Retry defaults match the documented behavior of the hosted
//! forwarder: three attempts with a fixed two-second pause between them.

/// Maximum compressed payload size per POST request in bytes.
///
/// Payloads exceeding this size would be rejected by the intake endpoint
/// with a 413 (Payload Too Large) error, so batches are recursively split
/// until every sub-batch compresses under this ceiling.
pub(crate) const MAX_PAYLOAD_SIZE_BYTES: usize = 1_000 * 1_024;

/// Default New Relic Logs API endpoint (US region).
pub(crate) const DEFAULT_ENDPOINT: &str = "https://log-api.newrelic.com/log/v1";

/// Default number of delivery attempts per sub-batch.
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default pause between delivery attempts, in milliseconds.
pub(crate) const DEFAULT_RETRY_INTERVAL_MS: u64 = 2_000;

/// Default HTTP request timeout, in seconds.
pub(crate) const DEFAULT_FLUSH_TIMEOUT_SECS: u64 = 30;

/// Plugin identity reported in the envelope's common attributes.
pub(crate) const PLUGIN_TYPE: &str = "azure-log-forwarder";
