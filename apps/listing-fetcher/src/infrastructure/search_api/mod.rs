//! Search API Adapter
//!
//! reqwest client for the listing endpoint plus an in-memory stand-in.

mod backoff;
mod client;
mod config;
mod mock;

pub use backoff::{ErrorCategory, ExponentialBackoff, categorize_status, parse_retry_after};
pub use client::SearchApiClient;
pub use config::{DEFAULT_ENDPOINT, SearchApiConfig, TransportRetryConfig};
pub use mock::SyntheticListingApi;
