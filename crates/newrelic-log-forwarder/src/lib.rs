//! # New Relic Log Forwarder
//!
//! This crate implements a log-shipping bridge between an Azure Functions
//! host and the New Relic Logs API. The host hands over the raw payload of a
//! log trigger (a string, a byte buffer, or already-parsed JSON) together
//! with its invocation context; the forwarder normalizes the payload into a
//! uniform sequence of log records, enriches each record with Azure resource
//! metadata and an epoch-millisecond timestamp, and ships the result as
//! gzip-compressed envelopes that respect the intake API's payload ceiling.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - [`config`]: Environment-sourced configuration
//! - [`forwarder`]: Pipeline orchestration (the host-facing entry point)
//! - [`logs`]: Normalization, enrichment, batching, and delivery
//! - [`logger`]: Custom tracing formatter for host log streams
//! - [`error`]: Error taxonomy shared across the pipeline
//!
//! ## Delivery semantics
//!
//! Delivery is best-effort: every failure kind (malformed payload, failed
//! compression, an oversized single record, exhausted retries) is logged at
//! its point of origin and swallowed. The invocation itself always completes
//! from the host's point of view.

#![deny(clippy::all)]
#![deny(unused_extern_crates)]
#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

/// Environment-sourced configuration for the forwarder
pub mod config;

/// Error taxonomy shared across the pipeline
pub mod error;

/// Pipeline orchestration: normalize, enrich, ship
pub mod forwarder;

/// Custom tracing formatter and subscriber setup
pub mod logger;

/// Log normalization, enrichment, batching, and delivery
pub mod logs;

pub use config::Config;
pub use error::ForwarderError;
pub use forwarder::Forwarder;
pub use logs::{InvocationContext, LogPayload, LogRecord};
