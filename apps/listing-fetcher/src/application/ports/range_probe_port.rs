//! Range Probe Port (Driven Port)
//!
//! The only capability the partitioner needs: a result count for a range.

use async_trait::async_trait;

use super::SearchError;
use crate::domain::PriceRange;

/// Port answering "how many results are in `[low, high]`?".
#[async_trait]
pub trait RangeProbe: Send + Sync {
    /// Count the results inside `range`.
    async fn count(&self, range: PriceRange) -> Result<u64, SearchError>;
}

/// Probe backed by a plain counting function.
///
/// Useful for synthetic densities and dry runs.
pub struct FnProbe<F>(pub F);

impl<F> std::fmt::Debug for FnProbe<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProbe").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> RangeProbe for FnProbe<F>
where
    F: Fn(PriceRange) -> u64 + Send + Sync,
{
    async fn count(&self, range: PriceRange) -> Result<u64, SearchError> {
        Ok((self.0)(range))
    }
}
