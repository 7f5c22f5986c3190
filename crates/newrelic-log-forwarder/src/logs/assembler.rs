//! Envelope assembly, serialization, and compression.
//!
//! The wire format of the Logs API is a gzip-compressed JSON array holding
//! a single envelope:
//!
//! ```json
//! [
//!   {
//!     "common": { "attributes": { "plugin": {...}, "azure": {...}, "tags": {...} } },
//!     "logs": [ {...}, {...} ]
//!   }
//! ]
//! ```
//!
//! The common attributes are built once per invocation and shared by every
//! sub-batch the splitter produces.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::error::ForwarderError;
use crate::logs::constants::PLUGIN_TYPE;
use crate::logs::{InvocationContext, LogRecord};

/// Attributes shared by every record in one delivery.
#[derive(Debug, Clone, Serialize)]
pub struct CommonAttributes {
    pub attributes: Value,
}

#[derive(Serialize)]
struct Envelope<'a> {
    common: &'a CommonAttributes,
    logs: &'a [LogRecord],
}

/// Builds the common attributes for one invocation: plugin identity,
/// function/invocation identifiers, and any configured tags.
#[must_use]
pub fn common_attributes(config: &Config, context: &InvocationContext) -> CommonAttributes {
    let mut attributes = Map::new();
    attributes.insert(
        "plugin".into(),
        json!({ "type": PLUGIN_TYPE, "version": env!("CARGO_PKG_VERSION") }),
    );
    attributes.insert(
        "azure".into(),
        json!({
            "forwardername": context.function_name,
            "invocationid": context.invocation_id,
        }),
    );
    if !config.tags.is_empty() {
        attributes.insert("tags".into(), json!(config.tags));
    }

    CommonAttributes {
        attributes: Value::Object(attributes),
    }
}

/// Serializes a (sub-)batch into the wire envelope and gzip-compresses it.
///
/// Serialization and compression failures are terminal for this batch only;
/// the caller logs them and leaves sibling sub-batches unaffected.
pub fn assemble(
    common: &CommonAttributes,
    records: &[LogRecord],
) -> Result<Vec<u8>, ForwarderError> {
    let body = serde_json::to_vec(&[Envelope {
        common,
        logs: records,
    }])?;
    compress(&body)
}

fn compress(body: &[u8]) -> Result<Vec<u8>, ForwarderError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Read;

    fn decompress(payload: &[u8]) -> Value {
        let mut decoder = flate2::read::GzDecoder::new(payload);
        let mut body = Vec::new();
        decoder.read_to_end(&mut body).unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn test_context() -> InvocationContext {
        InvocationContext::new("forward-logs", "inv-123")
    }

    #[test]
    fn test_envelope_shape() {
        let config = Config::default();
        let common = common_attributes(&config, &test_context());
        let records = vec![json!({"message": "one"}), json!({"message": "two"})];

        let payload = assemble(&common, &records).unwrap();
        let envelope = decompress(&payload);

        let outer = envelope.as_array().unwrap();
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0]["logs"].as_array().unwrap().len(), 2);
        assert_eq!(outer[0]["logs"][0]["message"], "one");

        let attributes = &outer[0]["common"]["attributes"];
        assert_eq!(attributes["plugin"]["type"], "azure-log-forwarder");
        assert_eq!(attributes["plugin"]["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(attributes["azure"]["forwardername"], "forward-logs");
        assert_eq!(attributes["azure"]["invocationid"], "inv-123");
    }

    #[test]
    fn test_tags_included_when_configured() {
        let config = Config {
            tags: HashMap::from([("env".to_string(), "prod".to_string())]),
            ..Config::default()
        };
        let common = common_attributes(&config, &test_context());

        let payload = assemble(&common, &[json!({"message": "x"})]).unwrap();
        let envelope = decompress(&payload);

        assert_eq!(envelope[0]["common"]["attributes"]["tags"]["env"], "prod");
    }

    #[test]
    fn test_tags_omitted_when_empty() {
        let config = Config::default();
        let common = common_attributes(&config, &test_context());

        let payload = assemble(&common, &[json!({"message": "x"})]).unwrap();
        let envelope = decompress(&payload);

        assert!(envelope[0]["common"]["attributes"].get("tags").is_none());
    }

    #[test]
    fn test_compression_shrinks_repetitive_payloads() {
        let config = Config::default();
        let common = common_attributes(&config, &test_context());
        let records: Vec<LogRecord> = (0..100).map(|_| json!({"message": "repeat"})).collect();

        let raw_len = serde_json::to_vec(&records).unwrap().len();
        let payload = assemble(&common, &records).unwrap();

        assert!(payload.len() < raw_len);
    }
}
