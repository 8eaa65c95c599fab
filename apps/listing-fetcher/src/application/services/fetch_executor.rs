//! Fetch Executor Service
//!
//! Fetches every sub-range concurrently through a fixed-size worker pool.
//! Sub-ranges go through a bounded queue; each worker pulls one at a time
//! and owns its retry loop. Workers return their results when the queue
//! drains and only the coordinator merges them.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

use super::RetryPolicy;
use crate::application::ports::{SearchError, SearchPort};
use crate::domain::{AggregateResult, PriceRange, SearchQuery, SubqueryResult};
use crate::observability;

/// Failure of a single fetch attempt that warrants a retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientFetchError {
    /// The response carried no top-level fields.
    #[error("empty response")]
    EmptyResponse,

    /// The request itself failed.
    #[error(transparent)]
    Search(#[from] SearchError),
}

impl TransientFetchError {
    const fn label(&self) -> &'static str {
        match self {
            Self::EmptyResponse => "empty",
            Self::Search(_) => "error",
        }
    }
}

/// Configuration for the fetch executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchExecutorConfig {
    /// Number of workers (default: 4).
    pub concurrency: usize,
    /// Per-range retry policy.
    pub retry: RetryPolicy,
}

impl Default for FetchExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            retry: RetryPolicy::default(),
        }
    }
}

/// Concurrent sub-range fetcher.
pub struct FetchExecutor<S: SearchPort + ?Sized + 'static> {
    search: Arc<S>,
    config: FetchExecutorConfig,
}

impl<S: SearchPort + ?Sized + 'static> FetchExecutor<S> {
    /// Create an executor over `search`.
    pub const fn new(search: Arc<S>, config: FetchExecutorConfig) -> Self {
        Self { search, config }
    }

    /// Fetch every range in `ranges` with the filters in `base_query`.
    ///
    /// Never fails: ranges whose retries run out, or whose worker died, are
    /// listed in [`AggregateResult::degraded_ranges`]. Record order is
    /// unspecified.
    pub async fn fetch_all(&self, ranges: &[PriceRange], base_query: &SearchQuery) -> AggregateResult {
        if ranges.is_empty() {
            return AggregateResult::default();
        }

        let workers = self.config.concurrency.clamp(1, ranges.len());
        let (tx, rx) = mpsc::channel::<PriceRange>(workers);
        let rx = Arc::new(Mutex::new(rx));

        tracing::info!(ranges = ranges.len(), workers, "Fetching sub-ranges");

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let rx = Arc::clone(&rx);
            let search = Arc::clone(&self.search);
            let query = base_query.clone();
            let retry = self.config.retry;

            pool.spawn(async move {
                let mut results = Vec::new();
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(range) = next else {
                        break;
                    };
                    results.push(fetch_range(search.as_ref(), &query, range, retry, worker).await);
                }
                results
            });
        }

        // Workers hold the only receivers, so the queue closes if they all stop.
        drop(rx);

        for range in ranges {
            if tx.send(*range).await.is_err() {
                tracing::error!(%range, "All fetch workers stopped before the queue drained");
                break;
            }
        }
        drop(tx);

        let mut results = Vec::with_capacity(ranges.len());
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(worker_results) => results.extend(worker_results),
                Err(e) => tracing::error!(error = %e, "Fetch worker failed"),
            }
        }

        // Ranges queued behind or held by a failed worker have no result.
        let fetched: HashSet<PriceRange> = results.iter().map(|r| r.range).collect();
        for range in ranges.iter().filter(|r| !fetched.contains(r)) {
            tracing::warn!(%range, "Range never fetched, marking degraded");
            results.push(SubqueryResult {
                range: *range,
                records: Vec::new(),
                attempts: 0,
                exhausted: true,
            });
        }

        let aggregate = AggregateResult::merge(results);
        tracing::info!(
            records = aggregate.len(),
            subqueries = aggregate.subqueries,
            degraded = aggregate.degraded_ranges.len(),
            "Fetch complete"
        );
        aggregate
    }
}

/// Fetch one range, retrying empty or failed responses.
async fn fetch_range<S: SearchPort + ?Sized>(
    search: &S,
    base_query: &SearchQuery,
    range: PriceRange,
    retry: RetryPolicy,
    worker: usize,
) -> SubqueryResult {
    let query = base_query.with_range(range);
    let max_attempts = retry.max_attempts();
    let mut attempts = 0;

    let (records, exhausted) = loop {
        attempts += 1;
        let outcome = match search.search(&query).await {
            Ok(response) if response.is_structurally_empty() => {
                Err(TransientFetchError::EmptyResponse)
            }
            Ok(response) => Ok(response),
            Err(e) => Err(TransientFetchError::Search(e)),
        };

        match outcome {
            Ok(response) => {
                observability::record_fetch_attempt("ok");
                break (response.into_listings(), false);
            }
            Err(e) => {
                observability::record_fetch_attempt(e.label());
                if attempts >= max_attempts {
                    tracing::warn!(
                        %range,
                        worker,
                        attempts,
                        error = %e,
                        "Fetch retries exhausted, range degraded"
                    );
                    break (Vec::new(), true);
                }
                tracing::debug!(
                    %range,
                    worker,
                    attempt = attempts,
                    error = %e,
                    "Fetch failed, retrying"
                );
                tokio::time::sleep(retry.retry_delay).await;
            }
        }
    };

    tracing::debug!(%range, worker, records = records.len(), attempts, "Fetched range");
    observability::record_subquery(records.len(), attempts, exhausted);

    SubqueryResult {
        range,
        records,
        attempts,
        exhausted,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::domain::SearchResponse;

    /// Returns `empty_first` empty responses per range, then one record per
    /// integer in the range.
    struct FlakySearch {
        empty_first: u32,
        calls: StdMutex<HashMap<PriceRange, u32>>,
    }

    impl FlakySearch {
        fn new(empty_first: u32) -> Self {
            Self {
                empty_first,
                calls: StdMutex::new(HashMap::new()),
            }
        }

        fn total_calls(&self) -> u32 {
            self.calls.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl SearchPort for FlakySearch {
        async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
            let range = query.range().unwrap();
            let call = {
                let mut calls = self.calls.lock().unwrap();
                let entry = calls.entry(range).or_insert(0);
                *entry += 1;
                *entry
            };
            if call <= self.empty_first {
                return Ok(SearchResponse::default());
            }
            let records = (range.low()..=range.high())
                .map(|price| json!({ "price": price }))
                .collect::<Vec<_>>();
            Ok(SearchResponse::with_listings(records.len() as u64, records))
        }
    }

    /// Panics on the range starting at zero, answers every other range.
    struct PanickingSearch;

    #[async_trait]
    impl SearchPort for PanickingSearch {
        async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
            let range = query.range().unwrap();
            assert_ne!(range.low(), 0, "search backend crashed");
            Ok(SearchResponse::with_listings(1, vec![json!({ "price": range.low() })]))
        }
    }

    fn executor(search: Arc<FlakySearch>, concurrency: usize) -> FetchExecutor<FlakySearch> {
        FetchExecutor::new(
            search,
            FetchExecutorConfig {
                concurrency,
                retry: RetryPolicy::new(5, Duration::ZERO),
            },
        )
    }

    fn ranges() -> Vec<PriceRange> {
        (0..10)
            .map(|i| PriceRange::new(i * 100, i * 100 + 99).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn aggregates_every_record_once_for_any_pool_size() {
        for concurrency in [1, 4, 32] {
            let search = Arc::new(FlakySearch::new(0));
            let aggregate = executor(Arc::clone(&search), concurrency)
                .fetch_all(&ranges(), &SearchQuery::default())
                .await;

            assert_eq!(aggregate.len(), 1000);
            assert_eq!(aggregate.subqueries, 10);
            assert!(aggregate.degraded_ranges.is_empty());

            let mut prices: Vec<i64> = aggregate
                .records
                .iter()
                .map(|r| r["price"].as_i64().unwrap())
                .collect();
            prices.sort_unstable();
            assert_eq!(prices, (0..1000).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn recovers_after_empty_responses() {
        for empty_first in 0..5 {
            let search = Arc::new(FlakySearch::new(empty_first));
            let range = PriceRange::new(0, 9).unwrap();

            let result = fetch_range(
                search.as_ref(),
                &SearchQuery::default(),
                range,
                RetryPolicy::new(5, Duration::ZERO),
                0,
            )
            .await;

            assert_eq!(result.attempts, empty_first + 1);
            assert!(!result.exhausted);
            assert_eq!(result.records.len(), 10);
        }
    }

    #[tokio::test]
    async fn always_empty_range_is_degraded_not_failed() {
        let search = Arc::new(FlakySearch::new(u32::MAX));
        let aggregate = executor(Arc::clone(&search), 2)
            .fetch_all(&ranges()[..1], &SearchQuery::default())
            .await;

        assert!(aggregate.is_empty());
        assert_eq!(aggregate.degraded_ranges, vec![ranges()[0]]);
        assert_eq!(search.total_calls(), 6);
    }

    #[tokio::test]
    async fn dead_sole_worker_degrades_every_range_without_hanging() {
        let executor = FetchExecutor::new(
            Arc::new(PanickingSearch),
            FetchExecutorConfig {
                concurrency: 1,
                retry: RetryPolicy::new(0, Duration::ZERO),
            },
        );
        let ranges: Vec<PriceRange> = ranges().into_iter().take(8).collect();

        let aggregate = tokio::time::timeout(
            Duration::from_secs(10),
            executor.fetch_all(&ranges, &SearchQuery::default()),
        )
        .await
        .unwrap();

        assert!(aggregate.is_empty());
        assert_eq!(aggregate.subqueries, 8);
        let mut degraded = aggregate.degraded_ranges;
        degraded.sort_by_key(PriceRange::low);
        assert_eq!(degraded, ranges);
    }

    #[tokio::test]
    async fn range_lost_with_its_worker_is_degraded() {
        let executor = FetchExecutor::new(
            Arc::new(PanickingSearch),
            FetchExecutorConfig {
                concurrency: 2,
                retry: RetryPolicy::new(0, Duration::ZERO),
            },
        );

        let aggregate = tokio::time::timeout(
            Duration::from_secs(10),
            executor.fetch_all(&ranges(), &SearchQuery::default()),
        )
        .await
        .unwrap();

        // The crashing range is queued first, so its worker had no other results.
        assert_eq!(aggregate.degraded_ranges, vec![ranges()[0]]);
        assert_eq!(aggregate.len(), 9);
        assert_eq!(aggregate.subqueries, 10);
    }

    #[tokio::test]
    async fn first_success_is_not_retried() {
        let search = Arc::new(FlakySearch::new(0));
        let base = SearchQuery::default_truck_search().with_num_records(3800);

        let result = fetch_range(
            search.as_ref(),
            &base,
            PriceRange::new(5, 6).unwrap(),
            RetryPolicy::default(),
            0,
        )
        .await;

        assert_eq!(result.attempts, 1);
        assert_eq!(result.records.len(), 2);
    }

    #[tokio::test]
    async fn no_ranges_means_no_requests() {
        let search = Arc::new(FlakySearch::new(0));
        let aggregate = executor(Arc::clone(&search), 4)
            .fetch_all(&[], &SearchQuery::default())
            .await;

        assert!(aggregate.is_empty());
        assert_eq!(search.total_calls(), 0);
    }
}
