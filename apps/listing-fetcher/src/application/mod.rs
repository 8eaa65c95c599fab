//! Application Layer
//!
//! Ports to the search API, the services that partition and fetch, and the
//! harvest use case that wires them together.

pub mod ports;
pub mod services;
pub mod use_cases;
