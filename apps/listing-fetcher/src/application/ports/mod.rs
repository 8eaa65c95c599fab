//! Application Ports (Driven)
//!
//! Interfaces the core uses to reach the search API.

mod range_probe_port;
mod search_port;

pub use range_probe_port::{FnProbe, RangeProbe};
pub use search_port::{SearchError, SearchPort};
