//! hostsweep - find the live hosts of an IPv4 range and their open TCP ports
//!
//! A scan expands a CIDR block, checks every host for reachability under a
//! bounded worker pool, then connects to the requested ports of the hosts
//! that answered. Results come back as an immutable [`ScanReport`], and can
//! also be streamed as [`ScanEvent`]s while the scan runs.

pub mod config;
pub mod discovery;
pub mod error;
pub mod output;
pub mod ports;
pub mod report;
pub mod scanner;
pub mod utils;

// Re-export commonly used types
pub use config::ScanConfig;
pub use discovery::{enumerate_hosts, HostRange, LivenessProbe, PingProbe};
pub use error::{ScanError, ScanResult};
pub use ports::PortSpec;
pub use report::{HostStatus, LivenessResult, PortResult, ScanReport};
pub use scanner::{PortProbe, ScanCoordinator, ScanEvent, TcpConnectProbe};

pub type Result<T> = std::result::Result<T, ScanError>;
