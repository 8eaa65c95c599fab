//! In-memory search API with a synthetic listing inventory.
//!
//! Serves the same response shape as the live endpoint over a fixed set of
//! prices, honouring the range and `numRecords` parameters. Used for dry runs
//! and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::application::ports::{SearchError, SearchPort};
use crate::domain::{SearchQuery, SearchResponse};

/// Records returned when a request carries no `numRecords`.
const DEFAULT_PAGE_SIZE: u64 = 25;

/// Synthetic listing inventory behind a [`SearchPort`].
#[derive(Debug, Default)]
pub struct SyntheticListingApi {
    prices: Vec<i64>,
    latency: Option<Duration>,
    empty_first: u32,
    calls_by_query: Mutex<HashMap<String, u32>>,
    probe_calls: AtomicU32,
    fetch_calls: AtomicU32,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    max_num_records: AtomicU64,
}

impl SyntheticListingApi {
    /// Inventory with one listing per entry in `prices`.
    #[must_use]
    pub fn from_prices(mut prices: Vec<i64>) -> Self {
        prices.sort_unstable();
        Self {
            prices,
            ..Self::default()
        }
    }

    /// `total` listings spread evenly over `[low, high]`.
    #[must_use]
    pub fn uniform(low: i64, high: i64, total: u64) -> Self {
        let span = (high - low + 1).max(1) as u128;
        let total_wide = u128::from(total.max(1));
        let prices = (0..total)
            .map(|i| low + (u128::from(i) * span / total_wide) as i64)
            .collect();
        Self::from_prices(prices)
    }

    /// Delay every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answer the first `n` calls for each distinct query with `{}`.
    #[must_use]
    pub const fn with_leading_empty_responses(mut self, n: u32) -> Self {
        self.empty_first = n;
        self
    }

    /// Listings in the inventory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the inventory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Count-only requests served.
    #[must_use]
    pub fn probe_calls(&self) -> u32 {
        self.probe_calls.load(Ordering::SeqCst)
    }

    /// Record-fetching requests served.
    #[must_use]
    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Highest number of requests observed in flight at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Largest `numRecords` any request asked for.
    #[must_use]
    pub fn max_num_records_requested(&self) -> Option<u64> {
        match self.max_num_records.load(Ordering::SeqCst) {
            0 => None,
            n => Some(n),
        }
    }

    /// Index range of listings priced within `[low, high]`.
    fn span(&self, query: &SearchQuery) -> std::ops::Range<usize> {
        match query.range() {
            Some(range) => {
                let start = self.prices.partition_point(|&p| p < range.low());
                let end = self.prices.partition_point(|&p| p <= range.high());
                start..end
            }
            None => 0..self.prices.len(),
        }
    }

    fn respond(&self, query: &SearchQuery) -> SearchResponse {
        let key = format!("{:?}", query.params());
        let call = {
            let mut calls = self
                .calls_by_query
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let entry = calls.entry(key).or_insert(0);
            *entry += 1;
            *entry
        };
        if call <= self.empty_first {
            return SearchResponse::default();
        }

        let span = self.span(query);
        let total = span.len() as u64;
        let page = query.num_records().unwrap_or(DEFAULT_PAGE_SIZE) as usize;
        let listings = span
            .take(page)
            .map(|id| json!({ "id": id, "price": self.prices[id] }))
            .collect();

        SearchResponse::with_listings(total, listings)
    }
}

#[async_trait]
impl SearchPort for SyntheticListingApi {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        match query.num_records() {
            Some(0) => self.probe_calls.fetch_add(1, Ordering::SeqCst),
            _ => self.fetch_calls.fetch_add(1, Ordering::SeqCst),
        };
        if let Some(n) = query.num_records() {
            self.max_num_records.fetch_max(n, Ordering::SeqCst);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let response = self.respond(query);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceRange;

    #[test]
    fn uniform_spreads_evenly() {
        let api = SyntheticListingApi::uniform(0, 99, 50);
        assert_eq!(api.len(), 50);
        assert_eq!(api.prices.first(), Some(&0));
        assert_eq!(api.prices.last(), Some(&98));
    }

    #[tokio::test]
    async fn counts_and_caps_records() {
        let api = SyntheticListingApi::uniform(0, 999, 1000);
        let query = SearchQuery::default()
            .with_range(PriceRange::new(100, 199).unwrap())
            .with_num_records(30);

        let response = api.search(&query).await.unwrap();

        assert_eq!(response.total_result_count(), 100);
        assert_eq!(response.listings().len(), 30);
        assert_eq!(response.listings()[0]["price"], 100);
        assert_eq!(api.fetch_calls(), 1);
        assert_eq!(api.max_num_records_requested(), Some(30));
    }

    #[tokio::test]
    async fn probe_returns_count_only() {
        let api = SyntheticListingApi::from_prices(vec![5, 5, 5, 9]);
        let query = SearchQuery::default().probe_for(PriceRange::new(5, 5).unwrap());

        let response = api.search(&query).await.unwrap();

        assert_eq!(response.total_result_count(), 3);
        assert!(response.listings().is_empty());
        assert_eq!(api.probe_calls(), 1);
        assert_eq!(api.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn leading_empty_responses_are_per_query() {
        let api = SyntheticListingApi::uniform(0, 9, 10).with_leading_empty_responses(1);
        let a = SearchQuery::default().with_range(PriceRange::new(0, 4).unwrap());
        let b = SearchQuery::default().with_range(PriceRange::new(5, 9).unwrap());

        assert!(api.search(&a).await.unwrap().is_structurally_empty());
        assert!(api.search(&b).await.unwrap().is_structurally_empty());
        assert_eq!(api.search(&a).await.unwrap().total_result_count(), 5);
    }
}
