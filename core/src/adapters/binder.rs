//! Loopback socket binder adapter.

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::trace;

use crate::ports::SocketBinder;

/// Binds a real TCP listener and drops it straight away.
///
/// Two binders probing the same port at the same instant can both see it
/// as free. Nothing here (or in any in-process lock) can prevent another
/// process from taking the port after the probe returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopbackBinder;

impl LoopbackBinder {
    pub fn new() -> Self {
        Self
    }
}

impl SocketBinder for LoopbackBinder {
    async fn probe(&self, addr: SocketAddr) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        trace!(%addr, "Bound probe listener, releasing");
        drop(listener);
        Ok(())
    }
}
