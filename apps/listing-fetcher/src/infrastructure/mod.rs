//! Infrastructure Layer
//!
//! Adapters for the search API and for writing results.

pub mod output;
pub mod search_api;
