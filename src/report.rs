//! Scan results handed to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Outcome of a single reachability check.
///
/// `Down` means the probe ran and nobody answered. `Error` means the probe
/// could not be run at all for this host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HostStatus {
    Up { latency_ms: f64 },
    Down,
    Error { detail: String },
}

impl HostStatus {
    /// Build an `Up` status, rounding the latency to two decimals
    pub fn up(latency_ms: f64) -> Self {
        HostStatus::Up {
            latency_ms: (latency_ms * 100.0).round() / 100.0,
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        HostStatus::Error {
            detail: detail.into(),
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, HostStatus::Up { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostStatus::Up { .. } => "Up",
            HostStatus::Down => "Down",
            HostStatus::Error { .. } => "Error",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Liveness result for one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessResult {
    pub address: Ipv4Addr,
    #[serde(flatten)]
    pub status: HostStatus,
}

impl LivenessResult {
    pub fn new(address: Ipv4Addr, status: HostStatus) -> Self {
        Self { address, status }
    }

    pub fn up(address: Ipv4Addr, latency_ms: f64) -> Self {
        Self::new(address, HostStatus::up(latency_ms))
    }

    pub fn down(address: Ipv4Addr) -> Self {
        Self::new(address, HostStatus::Down)
    }

    pub fn error(address: Ipv4Addr, detail: impl Into<String>) -> Self {
        Self::new(address, HostStatus::error(detail))
    }

    pub fn is_up(&self) -> bool {
        self.status.is_up()
    }

    /// Round-trip time, present only for `Up` hosts
    pub fn latency_ms(&self) -> Option<f64> {
        match self.status {
            HostStatus::Up { latency_ms } => Some(latency_ms),
            _ => None,
        }
    }

    /// Failure description, present only for `Error` hosts
    pub fn error_detail(&self) -> Option<&str> {
        match &self.status {
            HostStatus::Error { detail } => Some(detail),
            _ => None,
        }
    }
}

/// Result of a single TCP port probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortResult {
    pub address: Ipv4Addr,
    pub port: u16,
    pub open: bool,
}

impl PortResult {
    pub fn new(address: Ipv4Addr, port: u16, open: bool) -> Self {
        Self { address, port, open }
    }
}

/// Complete result of one scan invocation. Read-only once built.
///
/// Only a [`ScanCoordinator`](crate::ScanCoordinator) builds reports. They
/// serialize for output but cannot be read back in:
///
/// ```compile_fail
/// let report: hostsweep::ScanReport = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    target: String,
    started_at: DateTime<Utc>,
    duration: Duration,
    up_hosts: Vec<LivenessResult>,
    down_count: usize,
    error_count: usize,
    open_ports: BTreeMap<Ipv4Addr, Vec<u16>>,
}

impl ScanReport {
    /// Range that was scanned, as given by the caller
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Hosts that answered, ordered by address
    pub fn up_hosts(&self) -> &[LivenessResult] {
        &self.up_hosts
    }

    pub fn up_count(&self) -> usize {
        self.up_hosts.len()
    }

    pub fn down_count(&self) -> usize {
        self.down_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Number of enumerated hosts, i.e. up + down + error
    pub fn total_hosts(&self) -> usize {
        self.up_hosts.len() + self.down_count + self.error_count
    }

    /// Open ports per host, both levels ascending
    pub fn open_ports(&self) -> &BTreeMap<Ipv4Addr, Vec<u16>> {
        &self.open_ports
    }

    /// Open ports of one host; empty when none were found or not probed
    pub fn open_ports_for(&self, address: Ipv4Addr) -> &[u16] {
        self.open_ports
            .get(&address)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn open_port_count(&self) -> usize {
        self.open_ports.values().map(Vec::len).sum()
    }
}

/// Accumulates probe outcomes while a scan runs
#[derive(Debug)]
pub(crate) struct ReportBuilder {
    target: String,
    started_at: DateTime<Utc>,
    up_hosts: BTreeMap<Ipv4Addr, LivenessResult>,
    down_count: usize,
    error_count: usize,
    open_ports: BTreeMap<Ipv4Addr, BTreeSet<u16>>,
}

impl ReportBuilder {
    pub(crate) fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            started_at: Utc::now(),
            up_hosts: BTreeMap::new(),
            down_count: 0,
            error_count: 0,
            open_ports: BTreeMap::new(),
        }
    }

    pub(crate) fn record_liveness(&mut self, result: LivenessResult) {
        match result.status {
            HostStatus::Up { .. } => {
                self.up_hosts.insert(result.address, result);
            }
            HostStatus::Down => self.down_count += 1,
            HostStatus::Error { .. } => self.error_count += 1,
        }
    }

    /// Addresses recorded as up so far, ascending
    pub(crate) fn up_addresses(&self) -> Vec<Ipv4Addr> {
        self.up_hosts.keys().copied().collect()
    }

    /// Keep an open port. Closed results and ports of hosts that are not up
    /// are dropped.
    pub(crate) fn record_port(&mut self, result: PortResult) {
        if !result.open {
            return;
        }
        if !self.up_hosts.contains_key(&result.address) {
            log::debug!(
                "Dropping port result for {} which is not up",
                result.address
            );
            return;
        }
        self.open_ports
            .entry(result.address)
            .or_default()
            .insert(result.port);
    }

    pub(crate) fn finish(self, duration: Duration) -> ScanReport {
        ScanReport {
            target: self.target,
            started_at: self.started_at,
            duration,
            up_hosts: self.up_hosts.into_values().collect(),
            down_count: self.down_count,
            error_count: self.error_count,
            open_ports: self
                .open_ports
                .into_iter()
                .map(|(address, ports)| (address, ports.into_iter().collect()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    #[test]
    fn latency_is_rounded_to_two_decimals() {
        let result = LivenessResult::up(addr(1), 12.3456);
        assert_eq!(result.latency_ms(), Some(12.35));
        assert_eq!(result.error_detail(), None);
    }

    #[test]
    fn error_detail_only_on_error() {
        let result = LivenessResult::error(addr(1), "ping: not found");
        assert_eq!(result.error_detail(), Some("ping: not found"));
        assert_eq!(result.latency_ms(), None);
        assert_eq!(LivenessResult::down(addr(2)).error_detail(), None);
    }

    #[test]
    fn builder_orders_hosts_and_ports() {
        let mut builder = ReportBuilder::new("10.0.0.0/29");
        builder.record_liveness(LivenessResult::up(addr(5), 1.0));
        builder.record_liveness(LivenessResult::down(addr(3)));
        builder.record_liveness(LivenessResult::up(addr(2), 2.0));
        builder.record_liveness(LivenessResult::error(addr(4), "boom"));

        builder.record_port(PortResult::new(addr(5), 443, true));
        builder.record_port(PortResult::new(addr(5), 22, true));
        builder.record_port(PortResult::new(addr(5), 22, true));
        builder.record_port(PortResult::new(addr(5), 80, false));
        // host 3 is down, must never show up in open_ports
        builder.record_port(PortResult::new(addr(3), 22, true));

        let report = builder.finish(Duration::from_millis(10));

        let up: Vec<_> = report.up_hosts().iter().map(|r| r.address).collect();
        assert_eq!(up, vec![addr(2), addr(5)]);
        assert_eq!(report.down_count(), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.total_hosts(), 4);
        assert_eq!(report.open_ports_for(addr(5)), &[22, 443]);
        assert!(report.open_ports_for(addr(3)).is_empty());
        assert_eq!(report.open_ports().len(), 1);
        assert_eq!(report.open_port_count(), 2);
    }

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_value(LivenessResult::up(addr(1), 0.5)).unwrap();
        assert_eq!(json["status"], "up");
        assert_eq!(json["latency_ms"], 0.5);
        assert_eq!(json["address"], "10.0.0.1");
    }
}
