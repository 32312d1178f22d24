//! Socket binder port (interface).

use std::io;
use std::net::SocketAddr;

/// Port for binding (and immediately releasing) a listening socket.
///
/// This trait defines the only OS interaction of a discovery sweep.
/// Implementations must not keep the socket open after returning: the
/// caller owns the real listen once it decides to use the port.
pub trait SocketBinder: Send + Sync {
    /// Bind a listener at `addr`, then release it.
    ///
    /// Returns the raw bind error so the caller can tell "address in use"
    /// apart from every other failure.
    fn probe(&self, addr: SocketAddr) -> impl std::future::Future<Output = io::Result<()>> + Send;
}
