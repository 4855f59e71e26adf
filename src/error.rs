//! Error handling for the hostsweep scanner
//!
//! Only caller input problems and failures of the scan machinery itself are
//! errors. A host that does not answer, a probe that could not be invoked for
//! one host, or a closed port are scan results and live in [`crate::report`].

use thiserror::Error;

/// Main error type for scanning operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid port specification: {0}")]
    InvalidPortSpec(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Scan failed: {0}")]
    Orchestration(String),
}

/// Result type alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

impl ScanError {
    /// Whether the error was caused by what the caller passed in, as opposed
    /// to something going wrong while the scan was running.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidRange(_) | ScanError::InvalidPortSpec(_) | ScanError::ConfigError(_)
        )
    }

    /// Process exit code the command line front end uses for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_input_error() {
            1
        } else {
            2
        }
    }
}
