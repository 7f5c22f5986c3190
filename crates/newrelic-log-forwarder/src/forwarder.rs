//! Pipeline orchestration.
//!
//! The forwarder sequences the stages: normalize the raw payload, enrich
//! every record, build the common attributes for the invocation, and hand
//! the batch to the size-bounded shipper. Delivery is best-effort by
//! design: [`Forwarder::process`] always completes, and every failure is
//! logged where it occurs instead of propagating to the host.

use std::sync::Arc;

use tracing::warn;

use crate::config::Config;
use crate::error::ForwarderError;
use crate::logs::constants::MAX_PAYLOAD_SIZE_BYTES;
use crate::logs::flusher::Flusher;
use crate::logs::{assembler, enricher, normalizer, splitter, InvocationContext, LogPayload};

/// Host-facing entry point of the forwarding pipeline.
#[derive(Debug, Clone)]
pub struct Forwarder {
    config: Arc<Config>,
    flusher: Flusher,
}

impl Forwarder {
    /// Builds a forwarder from validated configuration.
    ///
    /// Fails when no authentication key is configured, which aborts the
    /// invocation before any payload is processed.
    pub fn new(config: Arc<Config>) -> Result<Self, ForwarderError> {
        config.validate()?;
        let flusher = Flusher::new(&config)?;
        Ok(Forwarder { config, flusher })
    }

    /// Processes one trigger payload end to end.
    ///
    /// Never fails from the host's perspective; an unclassifiable payload
    /// logs a warning and aborts this invocation, and delivery failures
    /// are logged per sub-batch by the shipper.
    pub async fn process(&self, payload: LogPayload, context: &InvocationContext) {
        let mut records = normalizer::normalize(payload);
        if records.is_empty() {
            warn!(
                "invocation {}: {}",
                context.invocation_id,
                ForwarderError::EmptyPayload
            );
            return;
        }

        for record in &mut records {
            enricher::enrich_resource_metadata(record);
        }
        for record in &mut records {
            enricher::enrich_timestamp(record);
        }

        let common = assembler::common_attributes(&self.config, context);
        splitter::ship(&self.flusher, &common, records, MAX_PAYLOAD_SIZE_BYTES).await;
    }
}
