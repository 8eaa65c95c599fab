//! Search Probe Adapter
//!
//! Answers range-count probes with zero-record search requests.

use std::sync::Arc;

use async_trait::async_trait;

use super::RetryPolicy;
use crate::application::ports::{RangeProbe, SearchError, SearchPort};
use crate::domain::{PriceRange, SearchQuery};

/// [`RangeProbe`] over a [`SearchPort`].
///
/// Empty or failed responses are retried with the same fixed-delay policy as
/// sub-range fetches. A probe that never gets an answer is an error rather
/// than a zero count, so the partition cannot silently skip a range.
pub struct SearchProbe<S: SearchPort + ?Sized> {
    search: Arc<S>,
    base_query: SearchQuery,
    retry: RetryPolicy,
}

impl<S: SearchPort + ?Sized> SearchProbe<S> {
    /// Create a probe for the filters in `base_query`.
    pub const fn new(search: Arc<S>, base_query: SearchQuery, retry: RetryPolicy) -> Self {
        Self {
            search,
            base_query,
            retry,
        }
    }
}

#[async_trait]
impl<S: SearchPort + ?Sized> RangeProbe for SearchProbe<S> {
    async fn count(&self, range: PriceRange) -> Result<u64, SearchError> {
        let query = self.base_query.probe_for(range);
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match self.search.search(&query).await {
                Ok(response) if !response.is_structurally_empty() => {
                    return Ok(response.total_result_count());
                }
                Ok(_) => SearchError::EmptyResponse,
                Err(e) => e,
            };

            if attempt >= max_attempts {
                tracing::error!(%range, attempts = attempt, error = %error, "Probe retries exhausted");
                return Err(error);
            }

            tracing::warn!(
                %range,
                attempt,
                error = %error,
                delay_ms = self.retry.retry_delay.as_millis(),
                "Probe failed, retrying"
            );
            tokio::time::sleep(self.retry.retry_delay).await;
        }
    }
}
