//! Probe request and outcome models.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Highest valid TCP port number.
pub const MAX_PORT: u32 = u16::MAX as u32;

/// Address probed when the caller does not pick one.
pub const DEFAULT_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ============================================================================
// ProbeRequest
// ============================================================================

/// Immutable input to a single discovery sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    start_port: u16,
    max_attempts: u32,
    timeout: Duration,
    address: IpAddr,
}

impl ProbeRequest {
    /// Create a request probing the IPv4 loopback address.
    ///
    /// `start_port` must be in `1..=65535` and `max_attempts` must be positive.
    pub fn new(start_port: u16, max_attempts: u32, timeout_ms: u64) -> Result<Self> {
        if start_port == 0 {
            return Err(Error::InvalidRequest(
                "start port must be between 1 and 65535".to_string(),
            ));
        }
        if max_attempts == 0 {
            return Err(Error::InvalidRequest(
                "max attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            start_port,
            max_attempts,
            timeout: Duration::from_millis(timeout_ms),
            address: DEFAULT_ADDRESS,
        })
    }

    /// Probe a different loopback address (e.g. `::1`).
    pub fn with_address(mut self, address: IpAddr) -> Result<Self> {
        if !address.is_loopback() {
            return Err(Error::InvalidRequest(format!(
                "{} is not a loopback address",
                address
            )));
        }
        self.address = address;
        Ok(self)
    }

    pub fn start_port(&self) -> u16 {
        self.start_port
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Socket address for a candidate, or `None` once it is past 65535.
    pub fn socket_addr(&self, candidate: u32) -> Option<SocketAddr> {
        let port = u16::try_from(candidate).ok()?;
        Some(SocketAddr::new(self.address, port))
    }

    /// Whether `start_port + max_attempts` stays within the valid port range.
    pub fn fits_port_range(&self) -> bool {
        u64::from(self.start_port) + u64::from(self.max_attempts) - 1 <= u64::from(MAX_PORT)
    }
}

// ============================================================================
// ProbeAttempt
// ============================================================================

/// Result of binding a single candidate port.
#[derive(Debug)]
pub enum ProbeAttempt {
    /// Bind succeeded and the socket was released.
    Free,
    /// Someone else holds the port.
    Busy,
    /// Bind failed for any other reason.
    Failed(io::Error),
}

impl ProbeAttempt {
    /// Classify the result of a bind.
    pub fn classify(result: io::Result<()>) -> Self {
        match result {
            Ok(()) => ProbeAttempt::Free,
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => ProbeAttempt::Busy,
            Err(e) => ProbeAttempt::Failed(e),
        }
    }
}

// ============================================================================
// ProbeOutcome
// ============================================================================

/// Why a discovery sweep gave up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FailureReason {
    /// Attempts or time ran out without a free port.
    #[serde(rename_all = "camelCase")]
    Exhausted { attempts: u32, elapsed_ms: u64 },
    /// A non-busy OS error stopped the sweep.
    #[serde(rename_all = "camelCase")]
    BindError {
        port: u32,
        code: Option<i32>,
        message: String,
    },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Exhausted {
                attempts,
                elapsed_ms,
            } => write!(
                f,
                "exhausted after {} attempt(s) in {}ms",
                attempts, elapsed_ms
            ),
            FailureReason::BindError { port, message, .. } => {
                write!(f, "bind error on port {}: {}", port, message)
            }
        }
    }
}

/// Outcome of one discovery: exactly one of found or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ProbeOutcome {
    Found { port: u16 },
    Failed { reason: FailureReason },
}

impl ProbeOutcome {
    /// Convert a discovery result into an outcome.
    ///
    /// Errors that are not discovery failures (bad input, config) are
    /// passed through unchanged.
    pub fn from_result(result: Result<u16>) -> Result<Self> {
        match result {
            Ok(port) => Ok(ProbeOutcome::Found { port }),
            Err(Error::Exhausted {
                attempts, elapsed, ..
            }) => Ok(ProbeOutcome::Failed {
                reason: FailureReason::Exhausted {
                    attempts,
                    elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                },
            }),
            Err(Error::Bind { port, source }) => Ok(ProbeOutcome::Failed {
                reason: FailureReason::BindError {
                    port,
                    code: source.raw_os_error(),
                    message: source.to_string(),
                },
            }),
            Err(e) => Err(e),
        }
    }

    /// The found port, if any.
    pub fn port(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Found { port } => Some(*port),
            ProbeOutcome::Failed { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ProbeOutcome::Found { .. })
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Found { port } => write!(f, "found port {}", port),
            ProbeOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}
