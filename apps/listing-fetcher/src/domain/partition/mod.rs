//! Adaptive Range Partitioning
//!
//! Discovers a covering set of sub-ranges, each under the per-request
//! threshold, using only range-count probes.

mod state;

pub use state::{AcceptedRange, PartitionConfig, SearchPhase, SearchState, Transition};

use super::range::PriceRange;

/// Ordered sub-ranges produced by one partition run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Sub-ranges in ascending order.
    pub ranges: Vec<PriceRange>,
    /// Count reported for the whole bounding range.
    pub initial_estimate: u64,
    /// Probes issued, including the initial whole-range probe.
    pub probe_count: u32,
}

impl Partition {
    /// Whether no sub-ranges were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of sub-ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}
