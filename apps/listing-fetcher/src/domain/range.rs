//! Price Range Value Objects
//!
//! Closed integer intervals over the partitioned dimension and the
//! immutable bounding input to a partition run.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing range value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// Lower bound is above the upper bound.
    #[error("Inverted range: low {low} is greater than high {high}")]
    Inverted {
        /// Requested lower bound.
        low: i64,
        /// Requested upper bound.
        high: i64,
    },

    /// Per-request threshold must be positive.
    #[error("Per-request threshold must be greater than zero")]
    ZeroThreshold,
}

/// Closed interval `[low, high]` over the partitioned dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRange {
    low: i64,
    high: i64,
}

impl PriceRange {
    /// Create a range, rejecting `low > high`.
    pub const fn new(low: i64, high: i64) -> Result<Self, RangeError> {
        if low > high {
            return Err(RangeError::Inverted { low, high });
        }
        Ok(Self { low, high })
    }

    /// Create a range the caller already knows is ordered.
    pub(crate) const fn new_unchecked(low: i64, high: i64) -> Self {
        debug_assert!(low <= high);
        Self { low, high }
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn low(&self) -> i64 {
        self.low
    }

    /// Inclusive upper bound.
    #[must_use]
    pub const fn high(&self) -> i64 {
        self.high
    }

    /// Distance between the bounds (`high - low`).
    #[must_use]
    pub const fn width(&self) -> i64 {
        self.high - self.low
    }

    /// Whether `value` lies inside the range.
    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Whether `next` starts immediately after this range ends.
    #[must_use]
    pub const fn abuts(&self, next: &Self) -> bool {
        self.high + 1 == next.low
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// Immutable input to a partition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingSpec {
    range: PriceRange,
    per_request_threshold: u64,
}

impl BoundingSpec {
    /// Create a bounding spec.
    pub const fn new(low: i64, high: i64, per_request_threshold: u64) -> Result<Self, RangeError> {
        if per_request_threshold == 0 {
            return Err(RangeError::ZeroThreshold);
        }
        match PriceRange::new(low, high) {
            Ok(range) => Ok(Self {
                range,
                per_request_threshold,
            }),
            Err(e) => Err(e),
        }
    }

    /// The full bounding range.
    #[must_use]
    pub const fn range(&self) -> PriceRange {
        self.range
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn low(&self) -> i64 {
        self.range.low
    }

    /// Inclusive upper bound.
    #[must_use]
    pub const fn high(&self) -> i64 {
        self.range.high
    }

    /// Maximum record count the API reliably returns per request.
    #[must_use]
    pub const fn threshold(&self) -> u64 {
        self.per_request_threshold
    }
}
