//! Domain Layer
//!
//! Value objects and pure search logic with no I/O:
//! - `range`: closed integer ranges and the bounding input
//! - `query`: search parameters and the partitioned dimension
//! - `listing`: opaque records, responses, and aggregates
//! - `partition`: the forward search state machine

pub mod listing;
pub mod partition;
pub mod query;
pub mod range;

pub use listing::{AggregateResult, Record, SearchResponse, SubqueryResult};
pub use partition::{AcceptedRange, Partition, PartitionConfig, SearchPhase, SearchState, Transition};
pub use query::{DEFAULT_HIGH_PARAM, DEFAULT_LOW_PARAM, NUM_RECORDS_PARAM, RangeDimension, SearchQuery};
pub use range::{BoundingSpec, PriceRange, RangeError};
