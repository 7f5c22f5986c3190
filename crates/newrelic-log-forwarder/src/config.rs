//! Forwarder configuration.
//!
//! Configuration is read from the environment once at process start and
//! passed by reference into the pipeline, so tests can construct a
//! [`Config`] directly instead of mutating the environment.

use std::collections::HashMap;
use std::env;

use crate::error::ForwarderError;
use crate::logs::constants::{
    DEFAULT_ENDPOINT, DEFAULT_FLUSH_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL_MS,
};

/// Configuration for the log forwarder
#[derive(Debug, Clone)]
pub struct Config {
    /// New Relic license key (preferred authentication scheme)
    pub license_key: Option<String>,
    /// New Relic insert key (used only when no license key is configured)
    pub insert_key: Option<String>,
    /// Logs API endpoint URL
    pub endpoint: String,
    /// Tags attached to the common attributes of every delivery
    pub tags: HashMap<String, String>,
    /// Maximum delivery attempts per sub-batch
    pub max_retries: u32,
    /// Pause between delivery attempts, in milliseconds
    pub retry_interval_ms: u64,
    /// HTTP request timeout, in seconds
    pub flush_timeout: u64,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            license_key: None,
            insert_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            tags: HashMap::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT_SECS,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ForwarderError> {
        let license_key = env::var("NR_LICENSE_KEY")
            .or_else(|_| env::var("LICENSE_KEY"))
            .ok();
        let insert_key = env::var("NR_INSERT_KEY")
            .or_else(|_| env::var("INSERT_KEY"))
            .ok();
        let endpoint = env::var("NR_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let tags = env::var("NR_TAGS")
            .map(|raw| parse_tags(&raw))
            .unwrap_or_default();
        let max_retries = env::var("NR_MAX_RETRIES")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);
        let retry_interval_ms = env::var("NR_RETRY_INTERVAL")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_MS);
        let flush_timeout = env::var("NR_FLUSH_TIMEOUT")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(DEFAULT_FLUSH_TIMEOUT_SECS);
        let log_level = env::var("NR_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            license_key,
            insert_key,
            endpoint,
            tags,
            max_retries,
            retry_interval_ms,
            flush_timeout,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ForwarderError> {
        if self.license_key.is_none() && self.insert_key.is_none() {
            return Err(ForwarderError::InvalidConfig(
                "either NR_LICENSE_KEY or NR_INSERT_KEY must be set".to_string(),
            ));
        }

        if self.endpoint.trim().is_empty() {
            return Err(ForwarderError::InvalidConfig(
                "NR_ENDPOINT cannot be empty".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(ForwarderError::InvalidConfig(
                "NR_MAX_RETRIES must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parses a semicolon-delimited `key:value` tag string.
///
/// Entries without a colon are dropped silently.
#[must_use]
pub fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|entry| entry.split_once(':'))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
