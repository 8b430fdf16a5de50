//! Integration tests for the config crate

use std::io::Write;
use tee_swap_config::{
    validate_config, AppConfig, ConfigLoader, Environment, VerificationMode,
};

fn checked_in(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
}

#[test]
fn test_load_devnet_config() {
    let config =
        ConfigLoader::from_file(&checked_in("devnet.toml")).expect("Failed to load devnet config");

    assert_eq!(config.network.environment, Environment::Devnet);
    assert_eq!(config.domain.verification, VerificationMode::Strict);
    assert_eq!(config.submission.max_attempts, 3);
    assert!(!config.submission.allow_simulated);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_load_local_config() {
    let config =
        ConfigLoader::from_file(&checked_in("local.toml")).expect("Failed to load local config");

    assert_eq!(config.network.environment, Environment::Local);
    assert_eq!(config.network.log_level, "trace");
    assert_eq!(config.domain.verification, VerificationMode::AllowUnverified);
    assert!(config.submission.allow_simulated);

    // Sections left out of the file fall back to defaults
    assert_eq!(config.quote.staleness_secs, 30);
    assert_eq!(
        config.domain.validator,
        "FnE6VJT5QNZdedZPnCoLsARgBwoE6DeJNjBs2H1gySXA"
    );
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_invalid_log_level() {
    let mut config = AppConfig::default();
    config.network.log_level = "invalid".to_string();

    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_rejects_bad_program_id() {
    let mut config = AppConfig::default();
    config.ledger.program_id = "0xdeadbeef".to_string();

    let err = validate_config(&config).unwrap_err().to_string();
    assert!(err.contains("ledger.program_id"));
}

#[test]
fn test_config_merge() {
    let base = AppConfig::default();
    let mut overlay = AppConfig::default();
    overlay.network.environment = Environment::Devnet;
    overlay.network.log_level = "debug".to_string();
    overlay.submission.max_attempts = 5;

    let merged = ConfigLoader::merge(base, overlay);

    assert_eq!(merged.network.environment, Environment::Devnet);
    assert_eq!(merged.network.log_level, "debug");
    assert_eq!(merged.submission.max_attempts, 5);
}

#[test]
fn test_config_builder() {
    let toml = r#"
[network]
environment = "devnet"
log_level = "debug"

[submission]
backoff_ms = 250
    "#;

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    file.flush().unwrap();

    let config = ConfigLoader::builder()
        .add_file(file.path(), true)
        .build()
        .expect("Failed to build config");

    assert_eq!(config.network.log_level, "debug");
    assert_eq!(config.submission.backoff_ms, 250);
    assert_eq!(config.submission.max_attempts, 3);
}

#[test]
fn test_builder_set_default() {
    let config = ConfigLoader::builder()
        .set_default("quote.staleness_secs", "12")
        .build()
        .expect("Failed to build config");

    assert_eq!(config.quote.staleness_secs, 12);
}

#[test]
fn test_yaml_format() {
    let yaml = r#"
network:
  environment: devnet
  log_level: debug

domain:
  endpoint: https://tee.example.org
  verification: allow_unverified

submission:
  max_attempts: 4
    "#;

    let config = ConfigLoader::from_yaml(yaml).expect("Failed to parse YAML");
    assert_eq!(config.network.log_level, "debug");
    assert_eq!(config.domain.endpoint, "https://tee.example.org");
    assert_eq!(config.domain.verification, VerificationMode::AllowUnverified);
    assert_eq!(config.submission.max_attempts, 4);
}

#[test]
fn test_json_format() {
    let json = r#"{
  "network": {
    "environment": "mainnet",
    "log_level": "warn"
  },
  "quote": {
    "default_slippage_bps": 100,
    "staleness_secs": 10
  }
}"#;

    let config = ConfigLoader::from_json(json).expect("Failed to parse JSON");
    assert_eq!(config.network.environment, Environment::Mainnet);
    assert_eq!(config.quote.default_slippage_bps, 100);
    assert_eq!(config.quote.staleness_secs, 10);
}

#[test]
fn test_default_values() {
    let minimal_toml = r#"
[network]
environment = "local"
    "#;

    let config = ConfigLoader::from_toml(minimal_toml).expect("Failed to parse TOML");

    assert_eq!(config.network.log_level, "info");
    assert!(config.network.metrics_enabled);
    assert_eq!(config.submission.max_attempts, 3);
    assert_eq!(config.submission.backoff_ms, 1000);
    assert_eq!(config.submission.confirmation_timeout_ms, 30000);
    assert_eq!(config.quote.default_slippage_bps, 50);
    assert_eq!(config.domain.endpoint, "https://tee.magicblock.app");
}

#[test]
fn test_unsupported_extension() {
    let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
    assert!(ConfigLoader::from_file(file.path()).is_err());
}
