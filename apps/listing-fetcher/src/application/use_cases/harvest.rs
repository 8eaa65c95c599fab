//! Harvest Use Case
//!
//! Probe, partition, fetch: collects the complete result set for a query
//! whose matches exceed the per-request cap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::ports::SearchPort;
use crate::application::services::{
    FetchExecutor, FetchExecutorConfig, PartitionError, RangePartitioner, SearchProbe,
};
use crate::domain::{AggregateResult, BoundingSpec, Partition, PartitionConfig, PriceRange, SearchQuery};

/// Harvest errors. Only the probe phase can abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    /// Partitioning failed.
    #[error("partition failed: {0}")]
    Partition(#[from] PartitionError),
}

/// Summary of one harvest run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Bounding range that was partitioned.
    pub bounds: PriceRange,
    /// Per-request threshold.
    pub threshold: u64,
    /// Count reported for the whole bounding range.
    pub initial_estimate: u64,
    /// Count probes issued.
    pub probe_count: u32,
    /// Sub-ranges fetched.
    pub ranges: Vec<PriceRange>,
    /// Records collected.
    pub records: usize,
    /// Sub-ranges whose retries were exhausted.
    pub degraded_ranges: Vec<PriceRange>,
}

impl HarvestReport {
    /// Collected records as a fraction of the initial estimate.
    #[must_use]
    pub fn completeness(&self) -> f64 {
        if self.initial_estimate == 0 {
            return 1.0;
        }
        self.records as f64 / self.initial_estimate as f64
    }
}

/// Records plus the run summary.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    /// All collected records.
    pub aggregate: AggregateResult,
    /// Run summary.
    pub report: HarvestReport,
}

/// Use case for harvesting a capped search.
pub struct HarvestUseCase<S: SearchPort + ?Sized + 'static> {
    search: Arc<S>,
    partitioner: RangePartitioner,
    executor: FetchExecutor<S>,
    fetch_config: FetchExecutorConfig,
}

impl<S: SearchPort + ?Sized + 'static> HarvestUseCase<S> {
    /// Create a new HarvestUseCase.
    pub fn new(search: Arc<S>, partition: PartitionConfig, fetch: FetchExecutorConfig) -> Self {
        Self {
            executor: FetchExecutor::new(Arc::clone(&search), fetch),
            search,
            partitioner: RangePartitioner::new(partition),
            fetch_config: fetch,
        }
    }

    /// Execute the use case.
    pub async fn run(
        &self,
        base_query: &SearchQuery,
        bounds: &BoundingSpec,
    ) -> Result<HarvestOutcome, HarvestError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("harvest", %run_id);
        self.run_inner(run_id, base_query, bounds)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        base_query: &SearchQuery,
        bounds: &BoundingSpec,
    ) -> Result<HarvestOutcome, HarvestError> {
        let started_at = Utc::now();
        let probe = SearchProbe::new(
            Arc::clone(&self.search),
            base_query.clone(),
            self.fetch_config.retry,
        );

        let partition = match self.partitioner.partition(bounds, &probe).await {
            Ok(partition) => partition,
            Err(PartitionError::DegenerateInput { range }) => {
                tracing::info!(%range, "Nothing to harvest");
                Partition {
                    ranges: Vec::new(),
                    initial_estimate: 0,
                    probe_count: 1,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Harvest aborted");
                return Err(e.into());
            }
        };

        let fetch_query = base_query.with_num_records(bounds.threshold());
        let aggregate = self.executor.fetch_all(&partition.ranges, &fetch_query).await;

        let report = HarvestReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            bounds: bounds.range(),
            threshold: bounds.threshold(),
            initial_estimate: partition.initial_estimate,
            probe_count: partition.probe_count,
            ranges: partition.ranges,
            records: aggregate.len(),
            degraded_ranges: aggregate.degraded_ranges.clone(),
        };

        Ok(HarvestOutcome { aggregate, report })
    }
}
