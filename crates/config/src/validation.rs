//! Configuration validation

use crate::{AppConfig, ConfigError, Result};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Upper bound for any basis-point setting
const MAX_BPS: u16 = 10_000;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
///
/// Every problem is collected so a single run reports all of them.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    // Ledger
    check_url(&mut errors, "ledger.rpc_url", &config.ledger.rpc_url);
    check_pubkey(&mut errors, "ledger.program_id", &config.ledger.program_id);
    match config.ledger.commitment.as_str() {
        "processed" | "confirmed" | "finalized" => {}
        other => errors.push(ValidationError::new(
            "ledger.commitment",
            format!("invalid commitment '{other}', must be one of: processed, confirmed, finalized"),
        )),
    }
    check_nonzero(
        &mut errors,
        "ledger.request_timeout_ms",
        config.ledger.request_timeout_ms,
    );

    // Domain
    check_url(&mut errors, "domain.endpoint", &config.domain.endpoint);
    check_pubkey(&mut errors, "domain.validator", &config.domain.validator);
    check_pubkey(
        &mut errors,
        "domain.delegation_program_id",
        &config.domain.delegation_program_id,
    );
    check_nonzero(
        &mut errors,
        "domain.probe_timeout_ms",
        config.domain.probe_timeout_ms,
    );

    // Submission
    if config.submission.max_attempts == 0 {
        errors.push(ValidationError::new(
            "submission.max_attempts",
            "at least one attempt is required",
        ));
    }
    check_nonzero(
        &mut errors,
        "submission.confirmation_timeout_ms",
        config.submission.confirmation_timeout_ms,
    );
    check_nonzero(
        &mut errors,
        "submission.poll_interval_ms",
        config.submission.poll_interval_ms,
    );
    if config.submission.poll_interval_ms > config.submission.confirmation_timeout_ms {
        errors.push(ValidationError::new(
            "submission.poll_interval_ms",
            "must not exceed confirmation_timeout_ms",
        ));
    }

    // Delegation
    check_nonzero(
        &mut errors,
        "delegation.poll_interval_ms",
        config.delegation.poll_interval_ms,
    );
    check_nonzero(&mut errors, "delegation.timeout_ms", config.delegation.timeout_ms);
    if config.delegation.max_polls == 0 {
        errors.push(ValidationError::new(
            "delegation.max_polls",
            "must be greater than 0",
        ));
    }

    // Quote
    check_url(&mut errors, "quote.base_url", &config.quote.base_url);
    if config.quote.default_slippage_bps > MAX_BPS {
        errors.push(ValidationError::new(
            "quote.default_slippage_bps",
            "must be <= 10000 (100%)",
        ));
    }
    check_nonzero(&mut errors, "quote.staleness_secs", config.quote.staleness_secs);
    check_nonzero(
        &mut errors,
        "quote.request_timeout_ms",
        config.quote.request_timeout_ms,
    );

    // Compliance
    check_url(&mut errors, "compliance.base_url", &config.compliance.base_url);
    check_nonzero(
        &mut errors,
        "compliance.request_timeout_ms",
        config.compliance.request_timeout_ms,
    );

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str) -> std::result::Result<(), String> {
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    // Basic URL validation - check for scheme
    if !url.starts_with("http://")
        && !url.starts_with("https://")
        && !url.starts_with("ws://")
        && !url.starts_with("wss://")
    {
        return Err("URL must start with http://, https://, ws://, or wss://".to_string());
    }

    Ok(())
}

/// Validate a base58 public key
pub fn validate_pubkey(value: &str) -> std::result::Result<Pubkey, String> {
    if value.is_empty() {
        return Err("public key is required".to_string());
    }
    Pubkey::from_str(value).map_err(|e| format!("invalid public key '{value}': {e}"))
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, url: &str) {
    if let Err(e) = validate_url(url) {
        errors.push(ValidationError::new(field, e));
    }
}

fn check_pubkey(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if let Err(e) = validate_pubkey(value) {
        errors.push(ValidationError::new(field, e));
    }
}

fn check_nonzero(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::new(field, "must be greater than 0"));
    }
}

/// Validate log level
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "network.log_level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_collects_every_error() {
        let mut config = AppConfig::default();
        config.network.log_level = "loud".to_string();
        config.submission.max_attempts = 0;
        config.domain.validator = "not-a-key".to_string();
        config.quote.default_slippage_bps = 20_000;

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("network.log_level"));
        assert!(err.contains("submission.max_attempts"));
        assert!(err.contains("domain.validator"));
        assert!(err.contains("quote.default_slippage_bps"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://tee.magicblock.app").is_ok());
        assert!(validate_url("wss://api.devnet.solana.com").is_ok());
        assert!(validate_url("").is_err());
        assert!(validate_url("tee.magicblock.app").is_err());
    }

    #[test]
    fn test_poll_interval_bounded_by_timeout() {
        let mut config = AppConfig::default();
        config.submission.poll_interval_ms = 60_000;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("must not exceed confirmation_timeout_ms"));
    }
}
