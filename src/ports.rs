//! Port specification parsing
//!
//! Grammar: `token (',' token)*` where `token := INT | INT '-' INT`.
//! Ranges are inclusive, overlaps collapse, and the result is ascending.

use crate::ScanError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Sorted set of unique TCP ports, each in `1..=65535`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortSpec {
    ports: BTreeSet<u16>,
}

impl PortSpec {
    /// Parse a specification such as `22,80,8000-8010`
    pub fn parse(spec: &str) -> crate::Result<Self> {
        if spec.trim().is_empty() {
            return Err(ScanError::InvalidPortSpec(
                "port specification is empty".to_string(),
            ));
        }

        let mut ports = BTreeSet::new();
        for token in spec.split(',') {
            let token = token.trim();
            match token.split_once('-') {
                Some((start, end)) => {
                    let start = parse_port(start, token)?;
                    let end = parse_port(end, token)?;
                    if start > end {
                        return Err(ScanError::InvalidPortSpec(format!(
                            "start port {} is greater than end port {} in '{}'",
                            start, end, token
                        )));
                    }
                    ports.extend(start..=end);
                }
                None => {
                    ports.insert(parse_port(token, token)?);
                }
            }
        }

        Ok(Self { ports })
    }

    /// Build a spec from already-known port numbers. Port 0 is rejected.
    pub fn from_ports<I>(ports: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = u16>,
    {
        let ports: BTreeSet<u16> = ports.into_iter().collect();
        if ports.contains(&0) {
            return Err(ScanError::InvalidPortSpec(
                "port 0 is not valid".to_string(),
            ));
        }
        Ok(Self { ports })
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    /// Ports in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u16> {
        self.iter().collect()
    }
}

fn parse_port(value: &str, token: &str) -> crate::Result<u16> {
    let value = value.trim();
    // `u32::from_str` would also take a leading '+'
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ScanError::InvalidPortSpec(format!(
            "'{}' is not a valid port or range",
            token
        )));
    }
    let port: u32 = value.parse().map_err(|_| {
        ScanError::InvalidPortSpec(format!("'{}' is not a valid port or range", token))
    })?;

    if port == 0 || port > u32::from(u16::MAX) {
        return Err(ScanError::InvalidPortSpec(format!(
            "port {} is outside 1-65535",
            port
        )));
    }

    Ok(port as u16)
}

impl FromStr for PortSpec {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PortSpec {
    type Error = ScanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PortSpec> for String {
    fn from(spec: PortSpec) -> Self {
        spec.to_string()
    }
}

/// Renders the set back in compact form, collapsing runs into ranges
impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(u16, u16)> = Vec::new();
        for port in self.iter() {
            match runs.last_mut() {
                Some((_, end)) if u32::from(*end) + 1 == u32::from(port) => *end = port,
                _ => runs.push((port, port)),
            }
        }

        let rendered: Vec<String> = runs
            .into_iter()
            .map(|(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{}-{}", start, end)
                }
            })
            .collect();
        f.write_str(&rendered.join(","))
    }
}

impl<'a> IntoIterator for &'a PortSpec {
    type Item = u16;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, u16>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ports.iter().copied()
    }
}
