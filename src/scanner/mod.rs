//! Scanner module containing the scan coordinator and the port probe

pub mod engine;
pub mod probe;

use crate::report::{LivenessResult, PortResult};
use tokio::sync::mpsc;

pub use engine::ScanCoordinator;
pub use probe::{PortProbe, TcpConnectProbe};

/// Progress notifications, sent in the order probes complete
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A host finished its liveness check
    HostProbed(LivenessResult),
    /// Liveness sweep is over and port probing begins
    PortPhaseStarted { hosts: usize, ports: usize },
    /// A port accepted a connection
    PortOpen(PortResult),
}

pub(crate) type EventSink = mpsc::UnboundedSender<ScanEvent>;
