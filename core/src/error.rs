//! Error types for the portfinder-core library.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for portfinder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while probing for a free port.
#[derive(Error, Debug)]
pub enum Error {
    /// Ran out of attempts or time without finding a free port.
    #[error(
        "No free port found starting at {start_port} after {attempts} attempt(s) in {}ms",
        .elapsed.as_millis()
    )]
    Exhausted {
        start_port: u16,
        attempts: u32,
        elapsed: Duration,
    },

    /// Binding failed for a reason other than the port being in use.
    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u32,
        #[source]
        source: std::io::Error,
    },

    /// The probe request is out of range.
    #[error("Invalid probe request: {0}")]
    InvalidRequest(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Caller-visible class of a failed discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Attempt or time budget consumed.
    Exhausted,
    /// Non-transient OS-level bind failure.
    BindError,
}

impl Error {
    /// Classify this error as one of the two discovery failures.
    ///
    /// Returns `None` for errors that never come out of a probe
    /// (bad input, config, serialization).
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Error::Exhausted { .. } => Some(FailureKind::Exhausted),
            Error::Bind { .. } => Some(FailureKind::BindError),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_failure_kind() {
        let exhausted = Error::Exhausted {
            start_port: 7000,
            attempts: 3,
            elapsed: Duration::from_millis(12),
        };
        assert_eq!(exhausted.failure_kind(), Some(FailureKind::Exhausted));

        let bind = Error::Bind {
            port: 80,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(bind.failure_kind(), Some(FailureKind::BindError));

        assert_eq!(Error::Config("bad".into()).failure_kind(), None);
    }

    #[test]
    fn test_display() {
        let err = Error::Exhausted {
            start_port: 7000,
            attempts: 3,
            elapsed: Duration::from_millis(12),
        };
        assert_eq!(
            err.to_string(),
            "No free port found starting at 7000 after 3 attempt(s) in 12ms"
        );
    }

    #[test]
    fn test_bind_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::Bind {
            port: 80,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let source = err.source().expect("bind error should carry its cause");
        assert_eq!(source.to_string(), "denied");
    }
}
