//! Range Partitioner Service
//!
//! Drives the forward search over a [`RangeProbe`], one probe at a time,
//! until the bounding range is covered by sub-ranges that each fit under the
//! per-request threshold.

use thiserror::Error;

use crate::application::ports::{RangeProbe, SearchError};
use crate::domain::{BoundingSpec, Partition, PartitionConfig, PriceRange, SearchPhase, SearchState};
use crate::observability;

/// Partition errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// The whole bounding range reported zero results.
    #[error("no results in bounding range {range}")]
    DegenerateInput {
        /// The bounding range.
        range: PriceRange,
    },

    /// The probe budget for one window ran out before a sub-range was accepted.
    #[error("search did not converge for window {range} after {probes} probes")]
    CorrectionDivergence {
        /// Last window probed.
        range: PriceRange,
        /// Probes spent on the window.
        probes: u32,
    },

    /// A count probe failed.
    #[error("probe failed: {0}")]
    Probe(#[from] SearchError),
}

/// Splits a bounding range into threshold-sized sub-ranges.
#[derive(Debug, Clone, Default)]
pub struct RangePartitioner {
    config: PartitionConfig,
}

impl RangePartitioner {
    /// Create a partitioner with the given tunables.
    #[must_use]
    pub const fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    /// Partition `bounds` using sequential count probes.
    ///
    /// Emitted ranges are ascending and abut each other. Every range except
    /// possibly the last has a probed count at or below the threshold.
    pub async fn partition<P>(&self, bounds: &BoundingSpec, probe: &P) -> Result<Partition, PartitionError>
    where
        P: RangeProbe + ?Sized,
    {
        let threshold = bounds.threshold();
        let total = probe.count(bounds.range()).await?;
        let mut probe_count = 1;

        tracing::info!(
            range = %bounds.range(),
            total,
            threshold,
            "Starting partition"
        );

        let Some(mut state) = SearchState::start(bounds, total) else {
            tracing::warn!(range = %bounds.range(), "Bounding range has no results");
            observability::record_partition("degenerate", 0);
            return Err(PartitionError::DegenerateInput {
                range: bounds.range(),
            });
        };

        if total <= threshold {
            observability::record_range_accepted(total);
            observability::record_partition("complete", 1);
            return Ok(Partition {
                ranges: vec![bounds.range()],
                initial_estimate: total,
                probe_count,
            });
        }

        let mut ranges = Vec::new();

        while !state.phase().is_terminal() {
            let window = state.window();
            let phase = state.phase();
            let count = probe.count(window).await?;
            probe_count += 1;
            observability::record_probe(&phase.to_string(), count);

            tracing::debug!(
                %phase,
                range = %window,
                count,
                step = state.step_size(),
                overflow_high = ?state.overflow_high(),
                "Probed window"
            );

            let transition = state.observe(count, bounds, &self.config);
            if let Some(accepted) = transition.accepted {
                if accepted.count > threshold {
                    tracing::warn!(
                        range = %accepted.range,
                        count = accepted.count,
                        threshold,
                        "Accepted range exceeds threshold; results will be truncated"
                    );
                } else {
                    tracing::debug!(range = %accepted.range, count = accepted.count, "Accepted range");
                }
                observability::record_range_accepted(accepted.count);
                ranges.push(accepted.range);
            }
            state = transition.state;
        }

        if state.phase() == SearchPhase::Failed {
            observability::record_partition("diverged", ranges.len());
            return Err(PartitionError::CorrectionDivergence {
                range: state.window(),
                probes: state.probes_in_range(),
            });
        }

        tracing::info!(
            ranges = ranges.len(),
            probes = probe_count,
            unaccounted = state.remaining_estimated_total(),
            "Partition complete"
        );
        observability::record_partition("complete", ranges.len());

        Ok(Partition {
            ranges,
            initial_estimate: total,
            probe_count,
        })
    }
}
