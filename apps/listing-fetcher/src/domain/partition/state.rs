//! Forward Search State Machine
//!
//! Pure transition logic for the adaptive range search. Every probe result
//! is fed to [`SearchState::observe`], which returns the next state and, when
//! a window is accepted, the emitted sub-range. No I/O happens here.
//!
//! # Transitions
//!
//! | From                 | Observation                              | To     | Emits |
//! |----------------------|------------------------------------------|--------|-------|
//! | Seek, Bisect, Accept | window reaches `bounds.high`             | Done   | yes   |
//! | Seek, Accept         | count is zero, estimate used up          | Done   | no    |
//! | Seek, Bisect, Accept | count within `[threshold - slack, threshold]` | Accept | yes |
//! | Seek, Bisect, Accept | single-point window still over threshold | Accept | yes   |
//! | Seek, Bisect, Accept | probe budget for the window exhausted    | Failed | no    |
//! | Seek, Bisect, Accept | bracket collapsed to adjacent integers   | Accept | best under-band window |
//! | Seek, Bisect, Accept | out of band, no overflow boundary known  | Seek   | no    |
//! | Seek, Bisect, Accept | out of band, overflow boundary known     | Bisect | no    |
//! | Done, Failed         | anything                                 | same   | no    |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::range::{BoundingSpec, PriceRange};

/// Tunables for the forward search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// How far under the threshold a count may fall and still be accepted.
    pub slack: u64,
    /// Minimum change applied to the step on every correction.
    pub min_step_delta: i64,
    /// Maximum factor the step may grow by in one correction.
    pub max_growth_factor: i64,
    /// Probes allowed for a single window before the search gives up.
    pub max_probes_per_range: u32,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            slack: 1000,
            min_step_delta: 500,
            max_growth_factor: 2,
            max_probes_per_range: 64,
        }
    }
}

/// Named phases of the forward search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchPhase {
    /// Extrapolating the step; no over-threshold boundary known.
    Seek,
    /// Narrowing toward a known over-threshold boundary.
    Bisect,
    /// The previous window was accepted; probing a fresh window.
    Accept,
    /// The bounding range is exhausted.
    Done,
    /// The probe budget for a window ran out.
    Failed,
}

impl SearchPhase {
    /// Whether no further probes will be issued.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Seek => "SEEK",
            Self::Bisect => "BISECT",
            Self::Accept => "ACCEPT",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// A window that came back under the band, kept as the lower bisection bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Underflow {
    high: i64,
    count: u64,
}

/// A sub-range accepted by the search together with its probed count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedRange {
    /// The emitted sub-range.
    pub range: PriceRange,
    /// Count reported by the probe that accepted it.
    pub count: u64,
}

/// Result of feeding one probe count to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State to continue from.
    pub state: SearchState,
    /// Sub-range emitted by this step, if any.
    pub accepted: Option<AcceptedRange>,
}

/// Mutable search state, threaded through one partition run.
///
/// Invariant: `current_high == current_low + step_size` and
/// `current_low <= current_high <= bounds.high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    phase: SearchPhase,
    current_low: i64,
    current_high: i64,
    step_size: i64,
    overflow_high: Option<i64>,
    underflow: Option<Underflow>,
    remaining_estimated_total: u64,
    probes_in_range: u32,
}

impl SearchState {
    /// Seed the search from the count for the whole bounding range.
    ///
    /// Returns `None` when `total` is zero: there is nothing to partition and
    /// the extrapolated step would divide by zero.
    #[must_use]
    pub fn start(bounds: &BoundingSpec, total: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }

        let width = bounds.range().width();
        let step = (bounds.threshold() as f64 / total as f64 * width as f64).round() as i64;
        let step = step.clamp(0, width);

        Some(Self {
            phase: SearchPhase::Seek,
            current_low: bounds.low(),
            current_high: bounds.low() + step,
            step_size: step,
            overflow_high: None,
            underflow: None,
            remaining_estimated_total: total,
            probes_in_range: 0,
        })
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// The window the next probe should cover.
    #[must_use]
    pub const fn window(&self) -> PriceRange {
        window(self.current_low, self.current_high)
    }

    /// Width of the current window.
    #[must_use]
    pub const fn step_size(&self) -> i64 {
        self.step_size
    }

    /// Smallest over-threshold `current_high` seen for the current window.
    ///
    /// Any over-threshold high bounds the answer from above, so the smallest
    /// one is the tightest bisection bound.
    #[must_use]
    pub const fn overflow_high(&self) -> Option<i64> {
        self.overflow_high
    }

    /// Initial estimate minus the counts of accepted sub-ranges.
    #[must_use]
    pub const fn remaining_estimated_total(&self) -> u64 {
        self.remaining_estimated_total
    }

    /// Probes issued for the current window since the last acceptance.
    #[must_use]
    pub const fn probes_in_range(&self) -> u32 {
        self.probes_in_range
    }

    /// Feed the count for [`Self::window`] and compute the next state.
    #[must_use]
    pub fn observe(&self, count: u64, bounds: &BoundingSpec, config: &PartitionConfig) -> Transition {
        if self.phase.is_terminal() {
            return self.stay();
        }

        let threshold = bounds.threshold();
        let probes = self.probes_in_range + 1;
        let current = self.window();

        if self.current_high >= bounds.high() {
            return self.finish(Some(AcceptedRange {
                range: current,
                count,
            }));
        }

        // An empty window ends the sweep only once nothing is known to lie
        // to its right: no overflow boundary and the estimate accounted for.
        if count == 0 && self.overflow_high.is_none() && self.remaining_estimated_total == 0 {
            return self.finish(None);
        }

        let in_band = count <= threshold && threshold - count <= config.slack;
        if in_band {
            return self.accept(current, count, current.width(), bounds);
        }

        if count > threshold && self.current_low == self.current_high {
            tracing::warn!(
                range = %current,
                count,
                threshold,
                "Single-point window exceeds threshold and cannot be split"
            );
            return self.accept(current, count, config.min_step_delta, bounds);
        }

        if probes >= config.max_probes_per_range {
            return Transition {
                state: Self {
                    phase: SearchPhase::Failed,
                    probes_in_range: probes,
                    ..*self
                },
                accepted: None,
            };
        }

        let overflowed = count > threshold;
        let mut overflow_high = self.overflow_high;
        let mut underflow = self.underflow;
        if overflowed {
            overflow_high = Some(overflow_high.map_or(self.current_high, |h| h.min(self.current_high)));
        } else if underflow.is_none_or(|u| self.current_high > u.high) {
            underflow = Some(Underflow {
                high: self.current_high,
                count,
            });
        }

        if let (Some(over), Some(under)) = (overflow_high, underflow)
            && over - under.high <= 1
        {
            let accepted = window(self.current_low, under.high);
            let step = accepted.width().max(config.min_step_delta);
            return self.accept(accepted, under.count, step, bounds);
        }

        let step = corrected_step(self.step_size, count, threshold, config);
        let mut next_high = self
            .current_low
            .saturating_add(step)
            .min(bounds.high());

        if overflowed {
            if let Some(under) = underflow
                && next_high <= under.high
            {
                next_high = midpoint(under.high, self.current_high);
            }
        } else if let Some(over) = overflow_high
            && next_high >= over
        {
            next_high = midpoint(self.current_high, over);
        }

        let phase = if overflow_high.is_some() {
            SearchPhase::Bisect
        } else {
            SearchPhase::Seek
        };

        Transition {
            state: Self {
                phase,
                current_low: self.current_low,
                current_high: next_high,
                step_size: next_high - self.current_low,
                overflow_high,
                underflow,
                remaining_estimated_total: self.remaining_estimated_total,
                probes_in_range: probes,
            },
            accepted: None,
        }
    }

    /// Emit `range` and open the next window `next_step` wide.
    ///
    /// In-band accepts reuse the accepted width. Forced accepts (an
    /// irreducible point or a collapsed bracket) reseed the step to at least
    /// `min_step_delta`.
    fn accept(&self, range: PriceRange, count: u64, next_step: i64, bounds: &BoundingSpec) -> Transition {
        let accepted = Some(AcceptedRange { range, count });
        let remaining_estimated_total = self.remaining_estimated_total.saturating_sub(count);

        if range.high() >= bounds.high() {
            return Transition {
                state: Self {
                    phase: SearchPhase::Done,
                    remaining_estimated_total,
                    ..*self
                },
                accepted,
            };
        }

        let next_low = range.high() + 1;
        let next_high = next_low.saturating_add(next_step).min(bounds.high());

        Transition {
            state: Self {
                phase: SearchPhase::Accept,
                current_low: next_low,
                current_high: next_high,
                step_size: next_high - next_low,
                overflow_high: None,
                underflow: None,
                remaining_estimated_total,
                probes_in_range: 0,
            },
            accepted,
        }
    }

    fn finish(&self, accepted: Option<AcceptedRange>) -> Transition {
        let remaining_estimated_total = accepted.map_or(self.remaining_estimated_total, |a| {
            self.remaining_estimated_total.saturating_sub(a.count)
        });
        Transition {
            state: Self {
                phase: SearchPhase::Done,
                remaining_estimated_total,
                ..*self
            },
            accepted,
        }
    }

    const fn stay(&self) -> Transition {
        Transition {
            state: *self,
            accepted: None,
        }
    }
}

/// Step after an out-of-band probe: proportional extrapolation, at least
/// `min_step_delta` in the direction of correction, growth capped.
fn corrected_step(step: i64, count: u64, threshold: u64, config: &PartitionConfig) -> i64 {
    let relative = if count == 0 {
        i64::MAX
    } else {
        (threshold as f64 / count as f64 * step as f64).round() as i64
    };

    if count > threshold {
        relative.min(step - config.min_step_delta).max(0)
    } else {
        let floor = step.saturating_add(config.min_step_delta);
        // The minimum delta wins over the growth cap for tiny steps, otherwise
        // a zero step could never grow.
        let cap = step.saturating_mul(config.max_growth_factor).max(floor);
        relative.max(floor).min(cap)
    }
}

const fn midpoint(low: i64, high: i64) -> i64 {
    low + (high - low) / 2
}

const fn window(low: i64, high: i64) -> PriceRange {
    PriceRange::new_unchecked(low, high)
}
