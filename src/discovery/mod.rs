//! Host discovery - address enumeration and liveness probing
//!
//! [`HostRange`] expands the target network, a [`LivenessProbe`] decides for
//! each address whether anything answers. The default probe shells out to the
//! system `ping`, which keeps the scanner free of raw sockets and privileges.

pub mod ping;
pub mod range;

use crate::report::LivenessResult;
use std::net::Ipv4Addr;

pub use ping::PingProbe;
pub use range::{enumerate_hosts, HostRange, Hosts};

/// Reachability check for a single host.
///
/// Implementations never fail: a host that does not answer is reported as
/// `Down`, a probe that cannot be run is reported as `Error` for that host
/// only. Each call must finish within the implementation's own deadline.
#[async_trait::async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, target: Ipv4Addr) -> LivenessResult;

    fn method_name(&self) -> &str;
}
