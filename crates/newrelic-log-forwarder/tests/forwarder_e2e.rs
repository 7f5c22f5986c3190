use flate2::read::GzDecoder;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use newrelic_log_forwarder::logs::flusher::Flusher;
use newrelic_log_forwarder::logs::{assembler, enricher, normalizer, splitter};
use newrelic_log_forwarder::{Config, Forwarder, InvocationContext, LogPayload};

fn test_config(endpoint: String) -> Config {
    Config {
        license_key: Some("test-license-key".to_string()),
        endpoint,
        retry_interval_ms: 25,
        ..Config::default()
    }
}

fn test_context() -> InvocationContext {
    InvocationContext::new("forward-logs", "inv-e2e")
}

fn decompress_envelope(body: &[u8]) -> Value {
    let mut decoder = GzDecoder::new(body);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json).expect("gzip body");
    serde_json::from_slice(&json).expect("envelope json")
}

#[tokio::test]
async fn forwarder_ships_one_envelope_for_small_batches() {
    let raw = r#"{"time":"2023-01-01T00:00:00Z","resourceId":"/subscriptions/abc/resourceGroups/rg1/providers/Microsoft.Compute/virtualMachines/vm1","message":"hello"}"#;

    let mut server = Server::new_async().await;
    let config = Arc::new(test_config(server.url()));

    // Run the record stages standalone to pin the exact wire body the
    // forwarder must produce for this input.
    let mut records = normalizer::normalize(LogPayload::from(raw));
    for record in &mut records {
        enricher::enrich_resource_metadata(record);
        enricher::enrich_timestamp(record);
    }
    let common = assembler::common_attributes(&config, &test_context());
    let expected = assembler::assemble(&common, &records).expect("assemble");

    let envelope = decompress_envelope(&expected);
    let log = &envelope[0]["logs"][0];
    assert_eq!(log["message"], "hello");
    assert_eq!(log["metadata"]["subscriptionId"], "abc");
    assert_eq!(log["metadata"]["resourceGroup"], "rg1");
    assert_eq!(log["metadata"]["source"], "azure.compute");
    assert_eq!(log["timestamp"], 1_672_531_200_000_i64);
    assert_eq!(
        envelope[0]["common"]["attributes"]["plugin"]["type"],
        "azure-log-forwarder"
    );

    let mock = server
        .mock("POST", "/")
        .match_header("Content-Type", "application/json")
        .match_header("Content-Encoding", "gzip")
        .match_header("X-License-Key", "test-license-key")
        .match_body(expected)
        .with_status(202)
        .expect(1)
        .create_async()
        .await;

    let forwarder = Forwarder::new(Arc::clone(&config)).expect("valid config");
    forwarder.process(LogPayload::from(raw), &test_context()).await;

    mock.assert_async().await;
}

#[tokio::test]
async fn forwarder_ships_string_array_as_message_records() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(202)
        .expect(1)
        .create_async()
        .await;

    let forwarder = Forwarder::new(Arc::new(test_config(server.url()))).expect("valid config");

    forwarder
        .process(LogPayload::from(r#"["a","b"]"#), &test_context())
        .await;

    mock.assert_async().await;
}

#[tokio::test]
async fn forwarder_skips_delivery_for_unclassifiable_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(202)
        .expect(0)
        .create_async()
        .await;

    let forwarder = Forwarder::new(Arc::new(test_config(server.url()))).expect("valid config");

    forwarder
        .process(LogPayload::Structured(json!([1, 2, 3])), &test_context())
        .await;

    mock.assert_async().await;
}

#[tokio::test]
async fn delivery_retries_until_success() {
    let mut server = Server::new_async().await;
    let failure_mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(2)
        .create_async()
        .await;
    let success_mock = server
        .mock("POST", "/")
        .with_status(202)
        .with_body("accepted")
        .expect(1)
        .create_async()
        .await;

    let config = test_config(server.url());
    let flusher = Flusher::new(&config).expect("valid config");

    let start = Instant::now();
    let result = flusher.send(b"payload".to_vec()).await;

    assert_eq!(result.expect("should succeed on third attempt"), "accepted");
    // Two retries with the configured fixed delay in between.
    assert!(start.elapsed().as_millis() >= 2 * u128::from(config.retry_interval_ms));
    failure_mock.assert_async().await;
    success_mock.assert_async().await;
}

#[tokio::test]
async fn delivery_exhausts_retries_and_stops() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body("Internal Server Error")
        .expect(3)
        .create_async()
        .await;

    let flusher = Flusher::new(&test_config(server.url())).expect("valid config");

    let result = flusher.send(b"payload".to_vec()).await;

    match result {
        Err(newrelic_log_forwarder::ForwarderError::Delivery { attempts, reason }) => {
            assert_eq!(attempts, 3);
            assert!(reason.contains("500"));
        }
        other => panic!("expected delivery error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn non_accepted_success_statuses_are_retried() {
    let mut server = Server::new_async().await;
    // 200 is not the intake contract; only 202 counts as delivered.
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .expect(3)
        .create_async()
        .await;

    let flusher = Flusher::new(&test_config(server.url())).expect("valid config");

    assert!(flusher.send(b"payload".to_vec()).await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn insert_key_used_when_no_license_key() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("X-Insert-Key", "test-insert-key")
        .match_header("X-License-Key", Matcher::Missing)
        .with_status(202)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        license_key: None,
        insert_key: Some("test-insert-key".to_string()),
        ..test_config(server.url())
    };
    let flusher = Flusher::new(&config).expect("valid config");

    flusher.send(b"payload".to_vec()).await.expect("accepted");
    mock.assert_async().await;
}

#[tokio::test]
async fn license_key_takes_precedence_on_the_wire() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("X-License-Key", "test-license-key")
        .match_header("X-Insert-Key", Matcher::Missing)
        .with_status(202)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        insert_key: Some("test-insert-key".to_string()),
        ..test_config(server.url())
    };
    let flusher = Flusher::new(&config).expect("valid config");

    flusher.send(b"payload".to_vec()).await.expect("accepted");
    mock.assert_async().await;
}

#[tokio::test]
async fn oversized_batch_is_bisected_across_requests() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(202)
        .expect(4)
        .create_async()
        .await;

    let config = test_config(server.url());
    let flusher = Flusher::new(&config).expect("valid config");
    let common = assembler::common_attributes(&config, &test_context());

    // High-entropy filler keeps sub-batch payloads from compressing away,
    // so a ceiling of one max-sized record forces singleton leaves.
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let records: Vec<Value> = (0..4)
        .map(|i| {
            let filler: String = (0..96)
                .map(|_| {
                    state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                    char::from_digit((state >> 60) as u32 & 0xf, 16).expect("digit in range")
                })
                .collect();
            json!({"i": i, "filler": filler})
        })
        .collect();
    let ceiling = records
        .iter()
        .map(|record| {
            assembler::assemble(&common, std::slice::from_ref(record))
                .expect("assembles")
                .len()
        })
        .max()
        .expect("non-empty");

    splitter::ship(&flusher, &common, records, ceiling).await;

    mock.assert_async().await;
}
