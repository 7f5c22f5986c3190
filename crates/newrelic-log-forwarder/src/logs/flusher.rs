//! Log delivery to the New Relic intake endpoint with retry logic.
//!
//! This module handles the final stage of the pipeline: sending one
//! compressed payload via HTTP POST and retrying on failure.
//!
//! # Retry policy
//!
//! Every outcome other than HTTP 202 (including transport-level errors) is
//! retried after a fixed pause, up to the configured attempt count. On
//! exhaustion the sub-batch is reported as failed with the final failure
//! detail; individual records are never retried.
//!
//! # Authentication
//!
//! Exactly one of two header schemes is used: `X-License-Key` when a
//! license key is configured, otherwise `X-Insert-Key`. A license key
//! always takes precedence when both are present.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::config::Config;
use crate::error::ForwarderError;

/// Intake authentication scheme. License key wins over insert key.
#[derive(Debug, Clone)]
pub enum Auth {
    LicenseKey(String),
    InsertKey(String),
}

impl Auth {
    fn from_config(config: &Config) -> Result<Self, ForwarderError> {
        if let Some(key) = &config.license_key {
            return Ok(Auth::LicenseKey(key.clone()));
        }
        if let Some(key) = &config.insert_key {
            return Ok(Auth::InsertKey(key.clone()));
        }
        Err(ForwarderError::InvalidConfig(
            "either NR_LICENSE_KEY or NR_INSERT_KEY must be set".to_string(),
        ))
    }

    fn header(&self) -> (&'static str, &str) {
        match self {
            Auth::LicenseKey(key) => ("X-License-Key", key),
            Auth::InsertKey(key) => ("X-Insert-Key", key),
        }
    }
}

/// Seam between the splitter and the wire, so batching behavior can be
/// tested against a stub delivery function.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, payload: Vec<u8>) -> Result<String, ForwarderError>;
}

/// Flusher for the New Relic Logs API endpoint.
///
/// Sends gzip-compressed JSON payloads with authentication headers and
/// fixed-delay retries.
#[derive(Debug, Clone)]
pub struct Flusher {
    client: reqwest::Client,
    endpoint: String,
    auth: Auth,
    max_retries: u32,
    retry_interval: Duration,
}

impl Flusher {
    pub fn new(config: &Config) -> Result<Self, ForwarderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.flush_timeout))
            .build()
            .map_err(|e| {
                ForwarderError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Flusher {
            client,
            endpoint: config.endpoint.clone(),
            auth: Auth::from_config(config)?,
            max_retries: config.max_retries,
            retry_interval: Duration::from_millis(config.retry_interval_ms),
        })
    }

    /// Sends one compressed payload, retrying until HTTP 202 or exhaustion.
    ///
    /// Resolves with the response body on success; on exhaustion returns
    /// [`ForwarderError::Delivery`] carrying the final status or transport
    /// error.
    pub async fn send(&self, payload: Vec<u8>) -> Result<String, ForwarderError> {
        let (auth_header, auth_value) = self.auth.header();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let response = self
                .client
                .post(&self.endpoint)
                .header("Content-Type", "application/json")
                .header("Content-Encoding", "gzip")
                .header(auth_header, auth_value)
                .body(payload.clone())
                .send()
                .await;

            let reason = match response {
                Ok(response) if response.status() == StatusCode::ACCEPTED => {
                    return Ok(response.text().await.unwrap_or_default());
                }
                Ok(response) => format!("unexpected status {}", response.status()),
                Err(e) => format!("transport error: {e}"),
            };

            if attempts >= self.max_retries {
                return Err(ForwarderError::Delivery { attempts, reason });
            }
            debug!(
                "delivery attempt {} failed ({}), retrying in {:?}",
                attempts, reason, self.retry_interval
            );
            tokio::time::sleep(self.retry_interval).await;
        }
    }
}

#[async_trait]
impl Delivery for Flusher {
    async fn deliver(&self, payload: Vec<u8>) -> Result<String, ForwarderError> {
        self.send(payload).await
    }
}
