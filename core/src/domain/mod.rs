//! Domain layer - Pure data describing a port discovery.
//!
//! This module contains the request/outcome types of a single probe sweep.
//! These types have no I/O dependencies and can be tested in isolation.

mod probe;

// Re-export all domain types
pub use probe::{
    FailureReason, ProbeAttempt, ProbeOutcome, ProbeRequest, DEFAULT_ADDRESS, MAX_PORT,
};
