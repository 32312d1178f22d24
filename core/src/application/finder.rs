//! Free port discovery service.

use std::io;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::adapters::LoopbackBinder;
use crate::domain::{ProbeAttempt, ProbeOutcome, ProbeRequest};
use crate::error::{Error, Result};
use crate::ports::SocketBinder;

/// Application service that sweeps candidate ports until one binds.
///
/// Candidates are probed one at a time, starting at the request's start
/// port and moving up by one on every "address in use". The sweep stops at
/// the first of: a free port, `max_attempts` busy ports, the deadline, or
/// any other bind error. Uses the `SocketBinder` trait for the actual bind,
/// allowing different implementations to be injected.
pub struct PortFinder<B: SocketBinder> {
    binder: B,
}

impl PortFinder<LoopbackBinder> {
    /// Create a finder that binds real sockets.
    pub fn loopback() -> Self {
        Self::new(LoopbackBinder::new())
    }
}

impl Default for PortFinder<LoopbackBinder> {
    fn default() -> Self {
        Self::loopback()
    }
}

impl<B: SocketBinder> PortFinder<B> {
    /// Create a new finder with the given binder.
    pub fn new(binder: B) -> Self {
        Self { binder }
    }

    /// Find the first free port at or above the request's start port.
    ///
    /// The port is released before this returns; it may be taken by
    /// someone else before the caller binds it.
    pub async fn find(&self, request: &ProbeRequest) -> Result<u16> {
        let started = Instant::now();
        // A timeout too large to represent means no deadline.
        let deadline = started.checked_add(request.timeout());

        let mut candidate = u32::from(request.start_port());
        let mut attempts: u32 = 0;

        loop {
            let timed_out = deadline.is_some_and(|deadline| Instant::now() >= deadline);
            if attempts >= request.max_attempts() || timed_out {
                let elapsed = started.elapsed();
                debug!(
                    start_port = request.start_port(),
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Port search exhausted"
                );
                return Err(Error::Exhausted {
                    start_port: request.start_port(),
                    attempts,
                    elapsed,
                });
            }

            let Some(addr) = request.socket_addr(candidate) else {
                debug!(port = candidate, "Candidate is past the last valid port");
                return Err(Error::Bind {
                    port: candidate,
                    source: io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("port {} is outside the valid range 1-65535", candidate),
                    ),
                });
            };

            match ProbeAttempt::classify(self.binder.probe(addr).await) {
                ProbeAttempt::Free => {
                    debug!(port = candidate, attempts, "Found free port");
                    return Ok(addr.port());
                }
                ProbeAttempt::Busy => {
                    trace!(port = candidate, "Port in use, trying next");
                    attempts += 1;
                    candidate += 1;
                }
                ProbeAttempt::Failed(source) => {
                    debug!(port = candidate, error = %source, "Bind failed");
                    return Err(Error::Bind {
                        port: candidate,
                        source,
                    });
                }
            }
        }
    }

    /// Same as [`find`](Self::find), reported as a [`ProbeOutcome`].
    pub async fn find_outcome(&self, request: &ProbeRequest) -> Result<ProbeOutcome> {
        ProbeOutcome::from_result(self.find(request).await)
    }
}

/// Find a free loopback port.
///
/// Returns `Err` only when the arguments themselves are invalid; exhaustion
/// and bind errors come back as [`ProbeOutcome::Failed`].
pub async fn find_free_port(
    start_port: u16,
    max_attempts: u32,
    timeout_ms: u64,
) -> Result<ProbeOutcome> {
    let request = ProbeRequest::new(start_port, max_attempts, timeout_ms)?;
    PortFinder::loopback().find_outcome(&request).await
}

/// Blocking variant of [`find_free_port`].
///
/// Drives its own single-threaded runtime, so it must not be called from
/// inside an async context.
pub fn find_free_port_blocking(
    start_port: u16,
    max_attempts: u32,
    timeout_ms: u64,
) -> Result<ProbeOutcome> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(find_free_port(start_port, max_attempts, timeout_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::net::SocketAddr;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::net::TcpListener;

    use crate::domain::FailureReason;

    /// Binder that answers from a script instead of the OS.
    #[derive(Default)]
    struct ScriptedBinder {
        busy: HashSet<u16>,
        failing: HashMap<u16, io::ErrorKind>,
        delay: Duration,
        probed: Mutex<Vec<u16>>,
    }

    impl ScriptedBinder {
        fn busy(ports: impl IntoIterator<Item = u16>) -> Self {
            Self {
                busy: ports.into_iter().collect(),
                ..Default::default()
            }
        }

        fn failing(mut self, port: u16, kind: io::ErrorKind) -> Self {
            self.failing.insert(port, kind);
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn probed(&self) -> Vec<u16> {
            self.probed.lock().clone()
        }
    }

    impl SocketBinder for ScriptedBinder {
        async fn probe(&self, addr: SocketAddr) -> io::Result<()> {
            let port = addr.port();
            self.probed.lock().push(port);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if let Some(kind) = self.failing.get(&port) {
                return Err((*kind).into());
            }
            if self.busy.contains(&port) {
                return Err(io::ErrorKind::AddrInUse.into());
            }
            Ok(())
        }
    }

    fn request(start: u16, attempts: u32, timeout_ms: u64) -> ProbeRequest {
        ProbeRequest::new(start, attempts, timeout_ms).unwrap()
    }

    #[tokio::test]
    async fn test_returns_start_port_when_free() {
        let finder = PortFinder::new(ScriptedBinder::default());

        let port = finder.find(&request(7000, 10, 1000)).await.unwrap();
        assert_eq!(port, 7000);
        assert_eq!(finder.binder.probed(), vec![7000]);
    }

    #[tokio::test]
    async fn test_skips_busy_ports() {
        let finder = PortFinder::new(ScriptedBinder::busy([7000, 7001]));

        let port = finder.find(&request(7000, 10, 1000)).await.unwrap();
        assert_eq!(port, 7002);
        assert_eq!(finder.binder.probed(), vec![7000, 7001, 7002]);
    }

    #[tokio::test]
    async fn test_exhausted_when_whole_range_is_busy() {
        let finder = PortFinder::new(ScriptedBinder::busy(7000..7005));

        let err = finder.find(&request(7000, 5, 60_000)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Exhausted {
                start_port: 7000,
                attempts: 5,
                ..
            }
        ));
        assert_eq!(finder.binder.probed(), vec![7000, 7001, 7002, 7003, 7004]);
    }

    #[tokio::test]
    async fn test_single_attempt_on_busy_port() {
        let finder = PortFinder::new(ScriptedBinder::busy([7000]));

        let err = finder.find(&request(7000, 1, 300_000)).await.unwrap_err();
        assert!(matches!(err, Error::Exhausted { attempts: 1, .. }));
        assert_eq!(finder.binder.probed(), vec![7000]);
    }

    #[tokio::test]
    async fn test_zero_timeout_probes_at_most_once() {
        let finder = PortFinder::new(ScriptedBinder::busy(7000..8000));

        let err = finder.find(&request(7000, 100, 0)).await.unwrap_err();
        assert!(matches!(err, Error::Exhausted { .. }));
        assert!(finder.binder.probed().len() <= 1);
    }

    #[tokio::test]
    async fn test_other_bind_errors_are_not_retried() {
        let binder = ScriptedBinder::busy([7000]).failing(7001, io::ErrorKind::PermissionDenied);
        let finder = PortFinder::new(binder);

        let err = finder.find(&request(7000, 10, 1000)).await.unwrap_err();
        match err {
            Error::Bind { port, source } => {
                assert_eq!(port, 7001);
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected bind error, got {other:?}"),
        }
        assert_eq!(finder.binder.probed(), vec![7000, 7001]);
    }

    #[tokio::test]
    async fn test_candidate_past_last_port_is_a_bind_error() {
        let finder = PortFinder::new(ScriptedBinder::busy([65534, 65535]));

        let err = finder.find(&request(65534, 5, 1000)).await.unwrap_err();
        match err {
            Error::Bind { port, source } => {
                assert_eq!(port, 65536);
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput);
            }
            other => panic!("expected bind error, got {other:?}"),
        }
        assert_eq!(finder.binder.probed(), vec![65534, 65535]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_probe_starts_after_deadline() {
        let binder = ScriptedBinder::busy(7000..8000).with_delay(Duration::from_millis(100));
        let finder = PortFinder::new(binder);

        let err = finder.find(&request(7000, 100, 250)).await.unwrap_err();
        match err {
            Error::Exhausted {
                attempts, elapsed, ..
            } => {
                // Probes start at 0ms, 100ms and 200ms; the check at 300ms stops.
                assert_eq!(attempts, 3);
                assert!(elapsed >= Duration::from_millis(300));
                assert!(elapsed < Duration::from_millis(400));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(finder.binder.probed(), vec![7000, 7001, 7002]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_probe_runs_past_deadline() {
        let binder = ScriptedBinder::busy([7000]).with_delay(Duration::from_millis(400));
        let finder = PortFinder::new(binder);

        let err = finder.find(&request(7000, 100, 250)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Exhausted { attempts: 1, elapsed, .. } if elapsed >= Duration::from_millis(400)
        ));
    }

    #[tokio::test]
    async fn test_huge_timeout_does_not_overflow() {
        let finder = PortFinder::new(ScriptedBinder::busy([7000]));

        let port = finder.find(&request(7000, 5, u64::MAX)).await.unwrap();
        assert_eq!(port, 7001);
    }

    #[tokio::test]
    async fn test_find_outcome() {
        let finder = PortFinder::new(ScriptedBinder::busy([7000]));
        let outcome = finder.find_outcome(&request(7000, 1, 1000)).await.unwrap();
        assert!(matches!(
            outcome,
            ProbeOutcome::Failed {
                reason: FailureReason::Exhausted { attempts: 1, .. }
            }
        ));

        let binder = ScriptedBinder::default().failing(7000, io::ErrorKind::PermissionDenied);
        let finder = PortFinder::new(binder);
        let outcome = finder.find_outcome(&request(7000, 1, 1000)).await.unwrap();
        assert!(matches!(
            outcome,
            ProbeOutcome::Failed {
                reason: FailureReason::BindError { port: 7000, .. }
            }
        ));
    }

    // ------------------------------------------------------------------
    // Real sockets
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_finds_port_in_range_then_skips_held_port() {
        let first = find_free_port(7000, 100, 300_000).await.unwrap();
        let p = first.port().expect("no free port in 7000..7100");
        assert!((7000..7100).contains(&p));

        let _held = TcpListener::bind(("127.0.0.1", p)).await.unwrap();

        let second = find_free_port(7000, 50, 300_000).await.unwrap();
        let q = second.port().expect("no free port in 7000..7050");
        assert!(q >= 7000);
        assert_ne!(q, p);
    }

    #[tokio::test]
    async fn test_held_port_with_one_attempt_is_exhausted() {
        let held = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = held.local_addr().unwrap().port();

        let outcome = find_free_port(port, 1, 300_000).await.unwrap();
        assert!(matches!(
            outcome,
            ProbeOutcome::Failed {
                reason: FailureReason::Exhausted { attempts: 1, .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_rejects_invalid_arguments() {
        assert!(matches!(
            find_free_port(0, 10, 1000).await,
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            find_free_port(7000, 0, 1000).await,
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_blocking_facade() {
        let outcome = find_free_port_blocking(7000, 100, 300_000).unwrap();
        let port = outcome.port().expect("no free port in 7000..7100");
        assert!((7000..7100).contains(&port));
    }
}
