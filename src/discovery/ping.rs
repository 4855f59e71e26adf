//! Liveness probing through the system `ping` executable
//!
//! This is the only place that knows about `ping` command lines, exit codes
//! and output text. Everything above it sees a typed [`HostStatus`].

use super::LivenessProbe;
use crate::report::{HostStatus, LivenessResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// Exit codes meaning "sent, but nobody answered"
#[cfg(target_os = "macos")]
const NO_REPLY_EXIT_CODES: &[i32] = &[2];
#[cfg(not(target_os = "macos"))]
const NO_REPLY_EXIT_CODES: &[i32] = &[1];

// Linux/macOS print "time=0.045 ms", Windows prints "time=12ms" or "time<1ms"
static ROUND_TRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"time[=<]\s*([0-9]+(?:[.,][0-9]+)?)\s*ms").unwrap());

/// Liveness probe running one `ping` per host
#[derive(Debug, Clone)]
pub struct PingProbe {
    program: String,
    timeout: Duration,
}

impl PingProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "ping".to_string(),
            timeout,
        }
    }

    /// Use a different executable, e.g. an absolute path to `ping`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_command(&self, target: Ipv4Addr) -> Command {
        let mut command = Command::new(&self.program);
        command.args(ping_args(target, self.timeout));
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait::async_trait]
impl LivenessProbe for PingProbe {
    async fn probe(&self, target: Ipv4Addr) -> LivenessResult {
        let started = Instant::now();

        let child = match self.build_command(target).spawn() {
            Ok(child) => child,
            Err(e) => {
                return LivenessResult::error(target, describe_spawn_error(&self.program, &e));
            }
        };

        // The configured deadline is the whole budget. On expiry the future,
        // and with it the child, is dropped and killed.
        let status = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => classify(
                output.status.code(),
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
                started.elapsed(),
            ),
            Ok(Err(e)) => HostStatus::error(format!("waiting for {} failed: {}", self.program, e)),
            Err(_) => {
                log::debug!("{} did not finish within {:?}", target, self.timeout);
                HostStatus::Down
            }
        };

        log::debug!("{} - {}", target, status);
        LivenessResult::new(target, status)
    }

    fn method_name(&self) -> &str {
        "icmp-echo"
    }
}

/// One echo request, bounded by `timeout`
#[cfg(target_os = "windows")]
fn ping_args(target: Ipv4Addr, timeout: Duration) -> Vec<String> {
    vec![
        "-n".to_string(),
        "1".to_string(),
        "-w".to_string(),
        timeout.as_millis().max(1).to_string(),
        target.to_string(),
    ]
}

/// One echo request, bounded by `timeout` (milliseconds on macOS)
#[cfg(target_os = "macos")]
fn ping_args(target: Ipv4Addr, timeout: Duration) -> Vec<String> {
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        timeout.as_millis().max(1).to_string(),
        target.to_string(),
    ]
}

/// One echo request, bounded by `timeout` (whole seconds for iputils/busybox)
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn ping_args(target: Ipv4Addr, timeout: Duration) -> Vec<String> {
    let secs = ((timeout.as_millis() + 999) / 1000).max(1);
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        secs.to_string(),
        target.to_string(),
    ]
}

fn describe_spawn_error(program: &str, err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => format!("{} executable not found", program),
        io::ErrorKind::PermissionDenied => format!("permission denied running {}", program),
        _ => format!("failed to run {}: {}", program, err),
    }
}

/// Map a finished `ping` run onto a host status.
///
/// Success with a parsable round-trip is Up with that latency; success
/// without one falls back to the wall-clock time of the run. The platform's
/// no-reply exit code is Down. Anything else means the probe itself failed.
pub(crate) fn classify(
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
    elapsed: Duration,
) -> HostStatus {
    match exit_code {
        Some(0) => {
            let latency = parse_round_trip(stdout)
                .unwrap_or_else(|| elapsed.as_secs_f64() * 1000.0);
            HostStatus::up(latency)
        }
        Some(code) if NO_REPLY_EXIT_CODES.contains(&code) => HostStatus::Down,
        Some(code) => {
            let detail = first_line(stderr)
                .or_else(|| first_line(stdout))
                .map(str::to_string)
                .unwrap_or_else(|| format!("ping exited with status {}", code));
            HostStatus::error(detail)
        }
        None => HostStatus::error("ping was terminated by a signal"),
    }
}

/// Round-trip time in milliseconds from `ping` output
pub(crate) fn parse_round_trip(output: &str) -> Option<f64> {
    let captures = ROUND_TRIP.captures(output)?;
    captures[1].replace(',', ".").parse().ok()
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}
