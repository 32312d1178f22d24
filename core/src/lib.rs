//! PortFinder Core Library
//!
//! Finds a TCP port on the loopback interface that nothing is bound to.
//! Provides functionality to:
//! - Sweep upward from a start port, skipping ports that are in use
//! - Bound the sweep by attempt count and by wall-clock time
//! - Tell "no free port in range" apart from "binding is broken"
//! - Persist search defaults for the CLI
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Request/outcome data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Caveat
//! A found port is only known to be free at the instant it was probed.
//! Another process can bind it before the caller does; this crate does not
//! reserve ports.

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{FailureReason, ProbeAttempt, ProbeOutcome, ProbeRequest};

// Re-export other commonly used types
pub use adapters::LoopbackBinder;
pub use application::{find_free_port, find_free_port_blocking, PortFinder};
pub use config::{ConfigStore, FinderConfig};
pub use error::{Error, FailureKind, Result};
pub use ports::SocketBinder;
