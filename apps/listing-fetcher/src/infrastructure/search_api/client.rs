//! HTTP client for the listing search API.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;

use super::backoff::{ErrorCategory, ExponentialBackoff, categorize_status, parse_retry_after};
use super::config::{SearchApiConfig, TransportRetryConfig};
use crate::application::ports::{SearchError, SearchPort};
use crate::domain::{SearchQuery, SearchResponse};
use crate::observability;

/// Delay reported when a 429 carries no usable `Retry-After`.
const DEFAULT_RATE_LIMIT_SECS: u64 = 60;

/// [`SearchPort`] backed by reqwest with transport-level retry.
///
/// Compression is negotiated by reqwest (`Accept-Encoding: gzip, deflate`).
#[derive(Debug, Clone)]
pub struct SearchApiClient {
    client: Client,
    endpoint: String,
    retry_config: TransportRetryConfig,
}

impl SearchApiClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &SearchApiConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .deflate(true)
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            retry_config: config.retry.clone(),
        })
    }
}

#[async_trait]
impl SearchPort for SearchApiClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let mut backoff = ExponentialBackoff::new(&self.retry_config);

        loop {
            let started = Instant::now();
            let sent = self
                .client
                .get(&self.endpoint)
                .query(query.params())
                .send()
                .await;

            let response = match sent {
                Ok(resp) => resp,
                Err(e) => {
                    let error = if e.is_timeout() {
                        SearchError::Timeout
                    } else {
                        SearchError::Network(e.to_string())
                    };
                    let label = if e.is_timeout() { "timeout" } else { "network" };
                    observability::record_search_request(label, started.elapsed().as_secs_f64());

                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %error,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt(),
                            "Network error, retrying"
                        );
                        observability::record_search_retry(label);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(exhausted(error, backoff.attempt()));
                }
            };

            let status = response.status();
            observability::record_search_request(status.as_str(), started.elapsed().as_secs_f64());

            if status.is_success() {
                let text = response
                    .text()
                    .await
                    .map_err(|e| SearchError::Network(e.to_string()))?;
                if text.trim().is_empty() {
                    return Ok(SearchResponse::default());
                }
                let value: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| SearchError::JsonParse(e.to_string()))?;
                return Ok(SearchResponse::from_value(value));
            }

            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));

            let body = response.text().await.unwrap_or_default();

            match categorize_status(status) {
                ErrorCategory::RateLimited => {
                    if let Some(delay) = backoff.next_backoff() {
                        // A server-supplied wait is capped like the computed one.
                        let delay = retry_after.map_or(delay, |d| d.min(self.retry_config.max_backoff));
                        tracing::warn!(
                            status = status.as_u16(),
                            delay_ms = delay.as_millis(),
                            "Rate limited, retrying"
                        );
                        observability::record_search_retry(status.as_str());
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(SearchError::RateLimited {
                        retry_after_secs: retry_after
                            .map_or(DEFAULT_RATE_LIMIT_SECS, |d| d.as_secs()),
                    });
                }
                ErrorCategory::Retryable => {
                    let error = SearchError::Http {
                        status: status.as_u16(),
                        body,
                    };
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %error,
                            delay_ms = delay.as_millis(),
                            "Retryable error, retrying"
                        );
                        observability::record_search_retry(status.as_str());
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(exhausted(error, backoff.attempt()));
                }
                ErrorCategory::NonRetryable => {
                    return Err(SearchError::Http {
                        status: status.as_u16(),
                        body,
                    });
                }
            }
        }
    }
}

/// Final error once the backoff gives up; a single attempt keeps its cause.
fn exhausted(error: SearchError, attempts: u32) -> SearchError {
    if attempts > 1 {
        SearchError::MaxRetriesExceeded { attempts }
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::PriceRange;

    fn fast_retry(max_attempts: u32) -> TransportRetryConfig {
        TransportRetryConfig {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    fn client(server: &MockServer, max_attempts: u32) -> SearchApiClient {
        client_with(server, fast_retry(max_attempts))
    }

    fn client_with(server: &MockServer, retry: TransportRetryConfig) -> SearchApiClient {
        let config = SearchApiConfig::new(format!("{}/rest/lsc/listing", server.uri()))
            .with_timeout(Duration::from_secs(2))
            .with_retry(retry);
        SearchApiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn sends_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/lsc/listing"))
            .and(query_param("vehicleStyleCode", "TRUCKS"))
            .and(query_param("minPrice", "0"))
            .and(query_param("maxPrice", "10465"))
            .and(query_param("numRecords", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalResultCount": 3812,
                "listings": [],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = SearchQuery::default_truck_search().probe_for(PriceRange::new(0, 10_465).unwrap());
        let response = client(&server, 3).search(&query).await.unwrap();

        assert_eq!(response.total_result_count(), 3812);
    }

    #[tokio::test]
    async fn empty_object_is_structurally_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let response = client(&server, 3).search(&SearchQuery::default()).await.unwrap();
        assert!(response.is_structurally_empty());
    }

    #[tokio::test]
    async fn blank_body_is_structurally_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let response = client(&server, 3).search(&SearchQuery::default()).await.unwrap();
        assert!(response.is_structurally_empty());
    }

    #[tokio::test]
    async fn retries_on_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalResultCount": 7 })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server, 3).search(&SearchQuery::default()).await.unwrap();
        assert_eq!(response.total_result_count(), 7);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server, 3).search(&SearchQuery::default()).await.unwrap_err();
        assert_eq!(err, SearchError::MaxRetriesExceeded { attempts: 3 });
    }

    #[tokio::test]
    async fn honours_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalResultCount": 1 })))
            .mount(&server)
            .await;

        let retry = TransportRetryConfig {
            max_backoff: Duration::from_secs(5),
            ..fast_retry(3)
        };
        let started = Instant::now();
        let response = client_with(&server, retry)
            .search(&SearchQuery::default())
            .await
            .unwrap();

        assert_eq!(response.total_result_count(), 1);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn retry_after_is_capped_at_max_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3600"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalResultCount": 2 })))
            .mount(&server)
            .await;

        let response = tokio::time::timeout(
            Duration::from_secs(10),
            client(&server, 3).search(&SearchQuery::default()),
        )
        .await
        .expect("an hour-long Retry-After must not be slept in full")
        .unwrap();

        assert_eq!(response.total_result_count(), 2);
    }

    #[tokio::test]
    async fn persistent_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server, 2).search(&SearchQuery::default()).await.unwrap_err();
        assert_eq!(err, SearchError::RateLimited { retry_after_secs: 0 });
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad zip"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, 3).search(&SearchQuery::default()).await.unwrap_err();
        assert_eq!(
            err,
            SearchError::Http {
                status: 400,
                body: "bad zip".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server, 3).search(&SearchQuery::default()).await.unwrap_err();
        assert!(matches!(err, SearchError::JsonParse(_)));
    }

    #[tokio::test]
    async fn connection_refused_without_retry_keeps_cause() {
        let config = SearchApiConfig::new("http://127.0.0.1:9/listing")
            .with_retry(TransportRetryConfig::disabled());
        let err = SearchApiClient::new(&config)
            .unwrap()
            .search(&SearchQuery::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Network(_)));
    }
}
