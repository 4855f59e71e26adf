//! TCP connect probing

use crate::report::PortResult;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

/// Open/closed check for a single TCP port.
///
/// Closed, filtered, refused and timed out all come back as `open = false`;
/// a port probe has no error outcome.
#[async_trait::async_trait]
pub trait PortProbe: Send + Sync {
    async fn probe(&self, target: Ipv4Addr, port: u16) -> PortResult;
}

/// Full three-way handshake with a deadline
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl PortProbe for TcpConnectProbe {
    async fn probe(&self, target: Ipv4Addr, port: u16) -> PortResult {
        let addr = SocketAddr::new(IpAddr::V4(target), port);

        // The stream, or the pending connect on timeout, is dropped at the end
        // of this match, which closes the socket on every path.
        let open = match tokio::time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                log::trace!("{} closed: {}", addr, e);
                false
            }
            Err(_) => {
                log::trace!("{} timed out after {:?}", addr, self.timeout);
                false
            }
        };

        PortResult::new(target, port, open)
    }
}
