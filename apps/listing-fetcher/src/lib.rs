// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Listing Fetcher - Range-Partitioned Search Harvester
//!
//! Collects complete result sets from a search API that caps the number of
//! records returned per request. The price dimension is split into
//! sub-ranges that each fit under the cap, using only count probes, and the
//! sub-ranges are then fetched concurrently and merged.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Value objects and the pure search state machine
//!   - `range`: `PriceRange`, `BoundingSpec`
//!   - `query`: `SearchQuery` and the partitioned dimension
//!   - `partition`: `SearchState` transitions, `PartitionConfig`
//!   - `listing`: responses, per-range results, the aggregate
//!
//! - **Application**: Ports, services and the harvest use case
//!   - `ports`: `SearchPort`, `RangeProbe`
//!   - `services`: `RangePartitioner`, `SearchProbe`, `FetchExecutor`
//!   - `use_cases`: `HarvestUseCase`
//!
//! - **Infrastructure**: Adapters
//!   - `search_api`: reqwest client with backoff, synthetic in-memory API
//!   - `output`: JSON file writer

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Value objects and pure search logic.
pub mod domain;

/// Application layer - Use cases, services and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// YAML configuration loading and validation.
pub mod config;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::ports::{FnProbe, RangeProbe, SearchError, SearchPort};
pub use application::services::{
    FetchExecutor, FetchExecutorConfig, PartitionError, RangePartitioner, RetryPolicy, SearchProbe,
};
pub use application::use_cases::{HarvestError, HarvestOutcome, HarvestReport, HarvestUseCase};
pub use domain::{
    AggregateResult, BoundingSpec, Partition, PartitionConfig, PriceRange, SearchQuery,
    SearchResponse,
};
pub use infrastructure::output::JsonFileWriter;
pub use infrastructure::search_api::{SearchApiClient, SearchApiConfig, SyntheticListingApi};
