//! Prometheus metrics for the listing fetcher.
//!
//! Covers the probe phase of partitioning, sub-range fetches, and the
//! search transport.
//!
//! # Example
//!
//! ```ignore
//! use listing_fetcher::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::with_addr("127.0.0.1:9090".parse()?);
//! init_metrics(&config)?;
//!
//! record_probe("BISECT", 3_950);
//! ```

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for request latency (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            // Latency buckets from 10ms to 30s
            latency_buckets: vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Partition Metrics
// ============================================================================

/// Record a count probe.
///
/// # Arguments
///
/// * `phase` - Search phase the probe was issued from (e.g., "SEEK", "BISECT")
/// * `count` - Result count reported for the window
pub fn record_probe(phase: &str, count: u64) {
    counter!("partition_probes_total", "phase" => phase.to_string()).increment(1);
    histogram!("partition_probe_count").record(count as f64);
}

/// Record an accepted sub-range.
pub fn record_range_accepted(count: u64) {
    counter!("partition_ranges_accepted_total").increment(1);
    histogram!("partition_accepted_range_count").record(count as f64);
}

/// Record a finished partition run.
///
/// # Arguments
///
/// * `outcome` - "complete", "degenerate" or "diverged"
/// * `ranges` - Number of sub-ranges produced
pub fn record_partition(outcome: &str, ranges: usize) {
    counter!("partition_runs_total", "outcome" => outcome.to_string()).increment(1);
    gauge!("partition_last_range_count").set(ranges as f64);
}

// ============================================================================
// Fetch Metrics
// ============================================================================

/// Record one sub-range fetch attempt.
///
/// # Arguments
///
/// * `status` - "ok", "empty" or "error"
pub fn record_fetch_attempt(status: &str) {
    counter!("fetch_attempts_total", "status" => status.to_string()).increment(1);
}

/// Record a finished sub-range fetch.
pub fn record_subquery(records: usize, attempts: u32, exhausted: bool) {
    counter!("fetch_records_total").increment(records as u64);
    histogram!("fetch_attempts_per_range").record(f64::from(attempts));
    if exhausted {
        counter!("fetch_degraded_ranges_total").increment(1);
    }
}

// ============================================================================
// Transport Metrics
// ============================================================================

/// Record a search API request.
///
/// # Arguments
///
/// * `status` - HTTP status code, or "network" / "timeout"
/// * `latency_seconds` - Request latency in seconds
pub fn record_search_request(status: &str, latency_seconds: f64) {
    counter!("search_requests_total", "status" => status.to_string()).increment(1);
    histogram!("search_request_latency_seconds").record(latency_seconds);
}

/// Record a transport-level retry.
pub fn record_search_retry(reason: &str) {
    counter!("search_retries_total", "reason" => reason.to_string()).increment(1);
}
