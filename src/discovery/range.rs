//! CIDR expansion into the usable host addresses of a network

use crate::ScanError;
use ipnetwork::Ipv4Network;
use std::fmt;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// The usable hosts of an IPv4 network, in ascending order.
///
/// Network and broadcast addresses are skipped for prefixes up to /30.
/// A /31 yields both of its addresses (point-to-point link, RFC 3021) and a
/// /32 yields its single address. Host bits in the address part are masked
/// off, so `10.0.0.5/30` describes the same range as `10.0.0.4/30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRange {
    network: Ipv4Network,
    first: u32,
    last: u32,
}

impl HostRange {
    /// Parse `a.b.c.d/len`. A bare address without prefix is rejected.
    pub fn parse(cidr: &str) -> crate::Result<Self> {
        let cidr = cidr.trim();
        if !cidr.contains('/') {
            return Err(ScanError::InvalidRange(format!(
                "{} is missing a /prefix",
                cidr
            )));
        }

        let parsed = Ipv4Network::from_str(cidr)
            .map_err(|e| ScanError::InvalidRange(format!("{}: {}", cidr, e)))?;
        // re-anchor on the network address so set host bits don't leak through
        let network = Ipv4Network::new(parsed.network(), parsed.prefix())
            .map_err(|e| ScanError::InvalidRange(format!("{}: {}", cidr, e)))?;

        let base = u32::from(network.network());
        let top = u32::from(network.broadcast());
        let (first, last) = if network.prefix() >= 31 {
            (base, top)
        } else {
            (base + 1, top - 1)
        };

        Ok(Self {
            network,
            first,
            last,
        })
    }

    pub fn network(&self) -> Ipv4Network {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    /// Number of usable hosts
    pub fn len(&self) -> u64 {
        u64::from(self.last - self.first) + 1
    }

    /// Always false, every valid prefix has at least one usable host
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.first)
    }

    pub fn last(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.last)
    }

    pub fn contains(&self, address: Ipv4Addr) -> bool {
        (self.first..=self.last).contains(&u32::from(address))
    }

    pub fn iter(&self) -> Hosts {
        Hosts {
            inner: self.first..=self.last,
        }
    }

    /// Collect every usable host. Prefer [`HostRange::iter`] for large ranges.
    pub fn hosts(&self) -> Vec<Ipv4Addr> {
        self.iter().collect()
    }
}

impl FromStr for HostRange {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HostRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.network)
    }
}

impl IntoIterator for HostRange {
    type Item = Ipv4Addr;
    type IntoIter = Hosts;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &HostRange {
    type Item = Ipv4Addr;
    type IntoIter = Hosts;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the addresses of a [`HostRange`]
#[derive(Debug, Clone)]
pub struct Hosts {
    inner: RangeInclusive<u32>,
}

impl Iterator for Hosts {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Ipv4Addr::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Hosts {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Ipv4Addr::from)
    }
}

/// Expand a CIDR string into its usable host addresses
pub fn enumerate_hosts(cidr: &str) -> crate::Result<Vec<Ipv4Addr>> {
    HostRange::parse(cidr).map(|range| range.hosts())
}
