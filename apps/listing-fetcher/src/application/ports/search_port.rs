//! Search Port (Driven Port)
//!
//! Interface for issuing one request against the capped search API.

use async_trait::async_trait;

use crate::domain::{SearchQuery, SearchResponse};

/// Search request error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Connection-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its timeout.
    #[error("Search request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Rate limited and out of retries.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: u64,
    },

    /// Body was not valid JSON.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Response carried no top-level fields.
    #[error("Search response was empty")]
    EmptyResponse,

    /// Transport retries exhausted.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },
}

/// Port for querying the search API.
#[async_trait]
pub trait SearchPort: Send + Sync {
    /// Issue one search request.
    ///
    /// A structurally empty response is returned as `Ok`; callers decide
    /// whether that warrants a retry.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError>;
}
