//! Output formatting and management

use crate::report::{HostStatus, LivenessResult, PortResult, ScanReport};
use crate::scanner::ScanEvent;
use colored::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Greppable,
}

impl OutputFormat {
    /// Whether results are printed while the scan runs
    pub fn is_incremental(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "greppable" | "grep" => Ok(OutputFormat::Greppable),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub file: Option<String>,
    pub colored: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            file: None,
            colored: true,
        }
    }
}

/// Renders scan events and the final report
pub struct OutputManager {
    config: OutputConfig,
}

impl OutputManager {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn format(&self) -> OutputFormat {
        self.config.format
    }

    /// Line printed when the scan starts
    pub fn format_header(&self, target: &str) -> String {
        format!("Scanning network {}", target)
    }

    /// Line for a single progress event, if the format prints one
    pub fn format_event(&self, event: &ScanEvent) -> Option<String> {
        if !self.config.format.is_incremental() {
            return None;
        }

        match event {
            ScanEvent::HostProbed(result) => Some(self.format_host(result)),
            ScanEvent::PortOpen(result) => Some(self.format_open_port(result)),
            ScanEvent::PortPhaseStarted { hosts, ports } => Some(self.colorize(
                &format!("Probing {} ports on {} live hosts", ports, hosts),
                "blue",
            )),
        }
    }

    fn format_host(&self, result: &LivenessResult) -> String {
        match &result.status {
            HostStatus::Up { latency_ms } => self.colorize(
                &format!("{} - Up ({:.2}ms)", result.address, latency_ms),
                "green",
            ),
            HostStatus::Down => {
                self.colorize(&format!("{} - Down (No response)", result.address), "gray")
            }
            HostStatus::Error { detail } => {
                self.colorize(&format!("{} - Error ({})", result.address, detail), "red")
            }
        }
    }

    fn format_open_port(&self, result: &PortResult) -> String {
        self.colorize(&format!("{}:{} open", result.address, result.port), "orange")
    }

    /// Render the final report in the configured format
    pub fn format_report(&self, report: &ScanReport) -> io::Result<String> {
        match self.config.format {
            OutputFormat::Text => Ok(self.format_text(report)),
            OutputFormat::Json => self.format_json(report),
            OutputFormat::Greppable => Ok(self.format_greppable(report)),
        }
    }

    /// Write the final report to the configured file, or stdout
    pub fn write_report(&self, report: &ScanReport) -> io::Result<()> {
        let output = self.format_report(report)?;

        match &self.config.file {
            Some(filename) => {
                let mut file = File::create(filename)?;
                file.write_all(output.as_bytes())?;
            }
            None => {
                print!("{}", output);
            }
        }

        Ok(())
    }

    fn format_text(&self, report: &ScanReport) -> String {
        let mut output = String::new();

        if report.open_port_count() > 0 {
            output.push('\n');
            output.push_str(&self.colorize("OPEN PORTS:", "bold"));
            output.push('\n');
            for (address, ports) in report.open_ports() {
                let ports: Vec<String> = ports.iter().map(u16::to_string).collect();
                output.push_str(&format!("  {:<15} {}\n", address, ports.join(", ")));
            }
        }

        output.push_str("Scan complete.\n");
        output.push_str(&format!(
            "Found {} active hosts, {} down, and {} errors\n",
            report.up_count(),
            report.down_count(),
            report.error_count()
        ));
        output
    }

    fn format_json(&self, report: &ScanReport) -> io::Result<String> {
        let mut json = serde_json::to_string_pretty(report)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        json.push('\n');
        Ok(json)
    }

    /// One line per live host, nmap `-oG` style
    fn format_greppable(&self, report: &ScanReport) -> String {
        let mut output = String::new();

        for host in report.up_hosts() {
            let ports = report.open_ports_for(host.address);
            if ports.is_empty() {
                output.push_str(&format!("Host: {} () Status: Up\n", host.address));
            } else {
                let ports: Vec<String> = ports
                    .iter()
                    .map(|port| format!("{}/open/tcp//", port))
                    .collect();
                output.push_str(&format!(
                    "Host: {} () Ports: {}\n",
                    host.address,
                    ports.join(", ")
                ));
            }
        }

        output
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.config.colored {
            return text.to_string();
        }

        match color {
            "green" => text.bright_green().to_string(),
            "red" => text.bright_red().to_string(),
            "gray" => text.bright_black().to_string(),
            "blue" => text.bright_blue().to_string(),
            "orange" => text.truecolor(255, 135, 0).to_string(),
            "bold" => text.bold().to_string(),
            _ => text.to_string(),
        }
    }
}
