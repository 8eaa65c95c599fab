//! Observability module for metrics.
//!
//! Prometheus export of partition, fetch and transport counters.

mod metrics;

pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_fetch_attempt, record_partition,
    record_probe, record_range_accepted, record_search_request, record_search_retry,
    record_subquery,
};
