//! Application Services
//!
//! The partition driver, the probe adapter it runs against, and the
//! concurrent fetcher for the ranges it produces.

mod fetch_executor;
mod range_partitioner;
mod retry_policy;
mod search_probe;

pub use fetch_executor::{FetchExecutor, FetchExecutorConfig, TransientFetchError};
pub use range_partitioner::{PartitionError, RangePartitioner};
pub use retry_policy::RetryPolicy;
pub use search_probe::SearchProbe;
