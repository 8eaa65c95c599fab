//! Search API transport configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infrastructure::search_api::{DEFAULT_ENDPOINT, SearchApiConfig, TransportRetryConfig};

/// Search API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Listing search endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Transport retry settings.
    #[serde(default)]
    pub retry: TransportRetrySettings,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            retry: TransportRetrySettings::default(),
        }
    }
}

impl SearchConfig {
    /// Client configuration for these settings.
    #[must_use]
    pub fn to_api_config(&self) -> SearchApiConfig {
        SearchApiConfig::new(self.endpoint.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(self.retry.to_retry_config())
    }
}

/// Backoff for connection errors, 408, 429 and 5xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRetrySettings {
    /// Total attempts, counting the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial backoff in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Maximum backoff in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Backoff multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0).
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for TransportRetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl TransportRetrySettings {
    /// Retry configuration for the client.
    #[must_use]
    pub const fn to_retry_config(&self) -> TransportRetryConfig {
        TransportRetryConfig {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.multiplier,
            jitter_factor: self.jitter_factor,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_jitter_factor() -> f64 {
    0.2
}
