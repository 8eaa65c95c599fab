//! Observability configuration for metrics.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::observability::MetricsConfig;

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Prometheus listener address; metrics are not exported when absent.
    #[serde(default)]
    pub metrics_listen_addr: Option<SocketAddr>,
}

impl ObservabilityConfig {
    /// Exporter configuration, if enabled.
    #[must_use]
    pub fn metrics(&self) -> Option<MetricsConfig> {
        self.metrics_listen_addr.map(MetricsConfig::with_addr)
    }
}
