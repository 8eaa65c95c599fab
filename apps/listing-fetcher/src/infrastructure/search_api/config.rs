//! Search API client configuration.

use std::time::Duration;

/// Default listing search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://www.autotrader.com/rest/lsc/listing";

/// Configuration for [`super::SearchApiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchApiConfig {
    /// Endpoint receiving the GET requests.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Transport-level retry.
    pub retry: TransportRetryConfig,
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
            retry: TransportRetryConfig::default(),
        }
    }
}

impl SearchApiConfig {
    /// Create a configuration for `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: TransportRetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Retry for connection errors, 408, 429 and 5xx responses.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRetryConfig {
    /// Total attempts, counting the first.
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Jitter factor (0.2 = ±20%).
    pub jitter_factor: f64,
}

impl Default for TransportRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

impl TransportRetryConfig {
    /// No retries: every failure is returned immediately.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}
