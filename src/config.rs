//! Configuration module for the hostsweep scanner

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-host reachability deadline
pub const DEFAULT_LIVENESS_TIMEOUT_MS: u64 = 1000;

/// Default per-port connection deadline
pub const DEFAULT_PORT_TIMEOUT_MS: u64 = 500;

/// Default worker pool size
pub const DEFAULT_MAX_CONCURRENCY: usize = 50;

/// Name of the optional per-user configuration file in the home directory
pub const CONFIG_FILE_NAME: &str = ".hostsweep.toml";

/// Tunables of a scan. Everything the coordinator needs is passed in through
/// this struct; there are no process-wide defaults anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Deadline for a single host reachability check, in milliseconds
    pub liveness_timeout_ms: u64,

    /// Deadline for a single TCP handshake, in milliseconds
    pub port_timeout_ms: u64,

    /// Maximum number of probes in flight at once
    pub max_concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            liveness_timeout_ms: DEFAULT_LIVENESS_TIMEOUT_MS,
            port_timeout_ms: DEFAULT_PORT_TIMEOUT_MS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the liveness timeout
    pub fn with_liveness_timeout(mut self, timeout_ms: u64) -> Self {
        self.liveness_timeout_ms = timeout_ms;
        self
    }

    /// Set the port timeout
    pub fn with_port_timeout(mut self, timeout_ms: u64) -> Self {
        self.port_timeout_ms = timeout_ms;
        self
    }

    /// Set the worker pool size
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn port_timeout(&self) -> Duration {
        Duration::from_millis(self.port_timeout_ms)
    }

    /// Load configuration from TOML file. Keys missing from the file keep
    /// their default values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            crate::ScanError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: ScanConfig = toml::from_str(content)
            .map_err(|e| crate::ScanError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Path of the per-user configuration file, if a home directory exists
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Load `~/.hostsweep.toml` when present, defaults otherwise
    pub fn load_default_config() -> Self {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                match Self::from_toml_file(&path) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
                }
            }
        }

        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.liveness_timeout_ms == 0 {
            return Err(crate::ScanError::ConfigError(
                "liveness_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.port_timeout_ms == 0 {
            return Err(crate::ScanError::ConfigError(
                "port_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrency == 0 {
            return Err(crate::ScanError::ConfigError(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
