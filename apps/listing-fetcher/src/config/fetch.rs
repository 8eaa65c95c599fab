//! Sub-range fetch configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::services::{FetchExecutorConfig, RetryPolicy};

/// Worker pool and empty-response retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Concurrent fetch workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Retries after an empty or failed response.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Pause before each retry in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: f64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl FetchConfig {
    /// Executor configuration for these settings.
    ///
    /// Call after validation; a negative or non-finite delay reads as zero.
    #[must_use]
    pub fn to_executor_config(&self) -> FetchExecutorConfig {
        let delay = Duration::try_from_secs_f64(self.retry_delay_secs).unwrap_or_default();
        FetchExecutorConfig {
            concurrency: self.concurrency,
            retry: RetryPolicy::new(self.max_retries, delay),
        }
    }
}

const fn default_concurrency() -> usize {
    4
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_retry_delay_secs() -> f64 {
    5.0
}
