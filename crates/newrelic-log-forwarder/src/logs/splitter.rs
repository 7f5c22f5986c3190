//! Adaptive batch splitting against the payload size ceiling.
//!
//! The splitter assembles and compresses the current batch; if the result
//! fits under the ceiling it is handed to the delivery seam, otherwise the
//! batch is bisected at `floor(n/2)` and both halves are shipped
//! concurrently. Bisection bounds the number of compress/measure cycles to
//! `O(log n)` and naturally isolates a single oversized record, which is
//! logged and dropped since it cannot shrink further.
//!
//! Sibling sub-batches are independent: a failed half never affects the
//! other, and the parent completes only once both halves have finished.
//! All failures are logged here and swallowed; nothing propagates to the
//! orchestrator.

use futures::future::{join, BoxFuture, FutureExt};
use tracing::{debug, error};

use crate::error::ForwarderError;
use crate::logs::assembler::{self, CommonAttributes};
use crate::logs::flusher::Delivery;
use crate::logs::LogRecord;

/// Ships a batch, recursively bisecting it until every compressed
/// sub-batch fits under `max_payload_bytes`.
pub fn ship<'a>(
    delivery: &'a dyn Delivery,
    common: &'a CommonAttributes,
    records: Vec<LogRecord>,
    max_payload_bytes: usize,
) -> BoxFuture<'a, ()> {
    async move {
        let payload = match assembler::assemble(common, &records) {
            Ok(payload) => payload,
            Err(e) => {
                error!("dropping batch of {} records: {}", records.len(), e);
                return;
            }
        };

        if payload.len() <= max_payload_bytes {
            match delivery.deliver(payload).await {
                Ok(_) => debug!("delivered batch of {} records", records.len()),
                Err(e) => error!("dropping batch of {} records: {}", records.len(), e),
            }
            return;
        }

        if records.len() == 1 {
            let e = ForwarderError::OversizedRecord {
                size: payload.len(),
                limit: max_payload_bytes,
            };
            error!("dropping record: {}", e);
            return;
        }

        let mut left = records;
        let right = left.split_off(left.len() / 2);
        join(
            ship(delivery, common, left, max_payload_bytes),
            ship(delivery, common, right, max_payload_bytes),
        )
        .await;
    }
    .boxed()
}
