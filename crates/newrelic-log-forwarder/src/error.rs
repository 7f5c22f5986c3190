//! Errors that can occur while forwarding logs.
//!
//! Every variant is terminal for a different scope: configuration errors
//! abort the invocation, `EmptyPayload` aborts the invocation with a
//! warning, and the serialization/compression/oversize/delivery variants
//! are fatal only for the (sub-)batch that produced them. None of them
//! propagate past the pipeline boundary; [`crate::Forwarder::process`]
//! logs them at their point of origin and completes regardless.

/// Errors produced by the log forwarding pipeline
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("payload did not contain any log records")]
    EmptyPayload,

    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to compress payload: {0}")]
    Compression(#[from] std::io::Error),

    #[error("single record compresses to {size} bytes, exceeding the {limit} byte payload ceiling")]
    OversizedRecord { size: usize, limit: usize },

    #[error("delivery failed after {attempts} attempts: {reason}")]
    Delivery { attempts: u32, reason: String },
}
