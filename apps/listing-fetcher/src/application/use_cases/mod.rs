//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod harvest;

pub use harvest::{HarvestError, HarvestOutcome, HarvestReport, HarvestUseCase};
