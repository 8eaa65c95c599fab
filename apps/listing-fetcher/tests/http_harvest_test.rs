//! End-to-end harvest through the HTTP client against a local listing endpoint.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use listing_fetcher::infrastructure::search_api::TransportRetryConfig;
use listing_fetcher::{
    BoundingSpec, FetchExecutorConfig, HarvestUseCase, PartitionConfig, RetryPolicy,
    SearchApiClient, SearchApiConfig, SearchQuery,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Listing endpoint over a fixed, sorted price list.
struct Inventory {
    prices: Vec<i64>,
}

impl Respond for Inventory {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<i64>().ok())
        };
        let low = param("minPrice").unwrap_or(i64::MIN);
        let high = param("maxPrice").unwrap_or(i64::MAX);
        let page = param("numRecords").unwrap_or(25) as usize;

        let start = self.prices.partition_point(|&p| p < low);
        let end = self.prices.partition_point(|&p| p <= high);
        let listings: Vec<_> = (start..end)
            .take(page)
            .map(|id| json!({ "id": id, "price": self.prices[id] }))
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "totalResultCount": end - start,
            "listings": listings,
        }))
    }
}

#[tokio::test]
async fn test_harvest_over_http() {
    let server = MockServer::start().await;
    let prices: Vec<i64> = (0..12_000).map(|i| i * 5 / 2).collect();

    Mock::given(method("GET"))
        .and(path("/rest/lsc/listing"))
        .and(query_param("vehicleStyleCode", "TRUCKS"))
        .respond_with(Inventory { prices })
        .mount(&server)
        .await;

    let config = SearchApiConfig::new(format!("{}/rest/lsc/listing", server.uri()))
        .with_timeout(Duration::from_secs(5))
        .with_retry(TransportRetryConfig::disabled());
    let client = Arc::new(SearchApiClient::new(&config).unwrap());
    let harvest = HarvestUseCase::new(
        client,
        PartitionConfig::default(),
        FetchExecutorConfig {
            concurrency: 4,
            retry: RetryPolicy::new(2, Duration::ZERO),
        },
    );
    let bounds = BoundingSpec::new(0, 30_000, 2_000).unwrap();

    let outcome = harvest
        .run(&SearchQuery::default_truck_search(), &bounds)
        .await
        .unwrap();

    let ids: HashSet<u64> = outcome
        .aggregate
        .records
        .iter()
        .filter_map(|r| r["id"].as_u64())
        .collect();
    assert_eq!(ids.len(), 12_000);
    assert_eq!(outcome.aggregate.len(), 12_000);
    assert_eq!(outcome.report.initial_estimate, 12_000);
    assert!(outcome.report.degraded_ranges.is_empty());
    assert!(outcome.report.ranges.len() >= 6);
}

#[tokio::test]
async fn test_unreachable_endpoint_aborts_harvest() {
    let config = SearchApiConfig::new("http://127.0.0.1:9/rest/lsc/listing")
        .with_timeout(Duration::from_secs(1))
        .with_retry(TransportRetryConfig::disabled());
    let client = Arc::new(SearchApiClient::new(&config).unwrap());
    let harvest = HarvestUseCase::new(
        client,
        PartitionConfig::default(),
        FetchExecutorConfig {
            concurrency: 2,
            retry: RetryPolicy::new(1, Duration::ZERO),
        },
    );
    let bounds = BoundingSpec::new(0, 30_000, 2_000).unwrap();

    let result = harvest.run(&SearchQuery::default(), &bounds).await;

    assert!(result.is_err());
}
