//! Configuration loading and validation tests

use hostsweep::config::{
    DEFAULT_LIVENESS_TIMEOUT_MS, DEFAULT_MAX_CONCURRENCY, DEFAULT_PORT_TIMEOUT_MS,
};
use hostsweep::{ScanConfig, ScanCoordinator, ScanError};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults() {
    let config = ScanConfig::default();
    assert_eq!(config.liveness_timeout_ms, DEFAULT_LIVENESS_TIMEOUT_MS);
    assert_eq!(config.port_timeout_ms, DEFAULT_PORT_TIMEOUT_MS);
    assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    assert_eq!(config.liveness_timeout(), Duration::from_millis(1000));
    assert_eq!(config.port_timeout(), Duration::from_millis(500));
    assert_ok!(config.validate());
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
liveness_timeout_ms = 250
port_timeout_ms = 100
max_concurrency = 16
"#,
    );

    let config = ScanConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(
        config,
        ScanConfig::new()
            .with_liveness_timeout(250)
            .with_port_timeout(100)
            .with_max_concurrency(16)
    );
}

#[test]
fn test_missing_keys_keep_defaults() {
    let file = write_config("max_concurrency = 8\n");

    let config = ScanConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.max_concurrency, 8);
    assert_eq!(config.liveness_timeout_ms, DEFAULT_LIVENESS_TIMEOUT_MS);
    assert_eq!(config.port_timeout_ms, DEFAULT_PORT_TIMEOUT_MS);
}

#[test]
fn test_zero_values_are_rejected() {
    for content in [
        "liveness_timeout_ms = 0",
        "port_timeout_ms = 0",
        "max_concurrency = 0",
    ] {
        match ScanConfig::from_toml_str(content) {
            Err(ScanError::ConfigError(msg)) => assert!(msg.contains("greater than 0"), "{}", msg),
            other => panic!("{:?} should be rejected, got {:?}", content, other),
        }
    }
}

#[test]
fn test_bad_files() {
    assert!(matches!(
        ScanConfig::from_toml_str("max_concurrency = \"lots\""),
        Err(ScanError::ConfigError(_))
    ));
    assert!(matches!(
        ScanConfig::from_toml_str("max_concurrency = -4"),
        Err(ScanError::ConfigError(_))
    ));

    let err = ScanConfig::from_toml_file("/nonexistent/dir/.hostsweep.toml").unwrap_err();
    assert!(matches!(err, ScanError::ConfigError(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_toml_roundtrip_through_file() {
    let config = ScanConfig::new().with_max_concurrency(200);
    let file = write_config(&toml::to_string(&config).unwrap());

    assert_eq!(ScanConfig::from_toml_file(file.path()).unwrap(), config);
}

#[test]
fn test_coordinator_refuses_invalid_config() {
    let err = ScanCoordinator::new(ScanConfig::new().with_max_concurrency(0)).err();
    assert!(matches!(err, Some(ScanError::ConfigError(_))));
    assert_err!(ScanConfig::new().with_liveness_timeout(0).validate());

    let coordinator = ScanCoordinator::new(ScanConfig::new().with_port_timeout(42)).unwrap();
    assert_eq!(coordinator.config().port_timeout_ms, 42);
}
