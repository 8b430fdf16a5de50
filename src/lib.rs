//! Private swap saga across a public ledger and an isolated execution domain.
//!
//! The workspace crates are re-exported here; this crate adds the wiring
//! that turns an [`AppConfig`] into a ready [`SwapOrchestrator`] and a
//! [`ComplianceEngine`].

use anyhow::{anyhow, Context, Result};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;

pub use tee_swap_compliance as compliance;
pub use tee_swap_config as config;
pub use tee_swap_domain as domain;
pub use tee_swap_ledger as ledger;
pub use tee_swap_metrics as metrics;
pub use tee_swap_orchestrator as orchestrator;
pub use tee_swap_quote as quote;
pub use tee_swap_submitter as submitter;
pub use tee_swap_types as types;

/// Environment prefix for configuration overrides, e.g. `TEE_SWAP__LEDGER__RPC_URL`
pub use tee_swap_config::ENV_PREFIX;

use tee_swap_compliance::{ComplianceEngine, RangeClient};
use tee_swap_config::{validate_config, validate_pubkey, AppConfig, VerificationMode};
use tee_swap_domain::{ConnectionManager, DomainSettings, RpcChannelOpener, VerificationPolicy};
use tee_swap_ledger::{LedgerClient, LedgerClientConfig, RpcLedgerClient};
use tee_swap_metrics::MetricsCollector;
use tee_swap_orchestrator::{DegradedMode, DelegationPolicy, OrchestratorConfig, SwapOrchestrator};
use tee_swap_quote::{JupiterClient, QuoteProvider};
use tee_swap_submitter::{RetryPolicy, Submitter, SubmitterConfig};

fn pubkey(field: &str, value: &str) -> Result<Pubkey> {
    validate_pubkey(value).map_err(|e| anyhow!("{field}: {e}"))
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Submitter settings from the `ledger`, `domain`, `submission` and `quote` sections
pub fn submitter_config(config: &AppConfig) -> Result<SubmitterConfig> {
    let program_id = pubkey("ledger.program_id", &config.ledger.program_id)?;
    let validator = pubkey("domain.validator", &config.domain.validator)?;
    let submission = &config.submission;

    Ok(SubmitterConfig::new(program_id)
        .with_validator(validator)
        .with_retry(RetryPolicy::fixed(
            submission.max_attempts,
            millis(submission.backoff_ms),
        ))
        .with_confirmation(
            millis(submission.confirmation_timeout_ms),
            millis(submission.poll_interval_ms),
        )
        .with_allow_simulated(submission.allow_simulated)
        .with_quote_staleness(Duration::from_secs(config.quote.staleness_secs)))
}

/// Orchestrator settings; simulated outcomes are accepted exactly when the
/// submitter may produce them
pub fn orchestrator_config(config: &AppConfig) -> Result<OrchestratorConfig> {
    let delegation_program_id = pubkey(
        "domain.delegation_program_id",
        &config.domain.delegation_program_id,
    )?;
    let degraded_mode = if config.submission.allow_simulated {
        DegradedMode::Allowed
    } else {
        DegradedMode::Strict
    };

    Ok(OrchestratorConfig {
        delegation_program_id,
        degraded_mode,
        delegation: DelegationPolicy {
            poll_interval: millis(config.delegation.poll_interval_ms),
            max_polls: config.delegation.max_polls,
            timeout: millis(config.delegation.timeout_ms),
        },
    })
}

pub fn domain_settings(config: &AppConfig) -> Result<DomainSettings> {
    let policy = match config.domain.verification {
        VerificationMode::Strict => VerificationPolicy::Strict,
        VerificationMode::AllowUnverified => VerificationPolicy::AllowUnverified,
    };

    Ok(DomainSettings {
        endpoint: config.domain.endpoint.clone(),
        validator: pubkey("domain.validator", &config.domain.validator)?,
        policy,
        probe_timeout: millis(config.domain.probe_timeout_ms),
    })
}

pub fn ledger_client(config: &AppConfig) -> Result<Arc<dyn LedgerClient>> {
    let client_config = LedgerClientConfig::new(config.ledger.rpc_url.clone())
        .with_commitment(&config.ledger.commitment)
        .context("ledger.commitment")?
        .with_request_timeout(millis(config.ledger.request_timeout_ms));
    Ok(Arc::new(RpcLedgerClient::new(client_config)))
}

pub fn quote_provider(config: &AppConfig) -> Result<Arc<dyn QuoteProvider>> {
    let client = JupiterClient::with_timeout(
        config.quote.base_url.clone(),
        millis(config.quote.request_timeout_ms),
    )
    .context("building quote client")?
    .with_default_slippage_bps(config.quote.default_slippage_bps);
    Ok(Arc::new(client))
}

/// Validate `config` and wire the production collaborators into an orchestrator
pub fn build_orchestrator(
    config: &AppConfig,
    metrics: Arc<MetricsCollector>,
) -> Result<SwapOrchestrator> {
    validate_config(config).context("invalid configuration")?;

    let domain = ConnectionManager::new(domain_settings(config)?).with_opener(Arc::new(
        RpcChannelOpener::new(
            config.ledger.commitment.clone(),
            millis(config.ledger.request_timeout_ms),
        ),
    ));

    SwapOrchestrator::builder()
        .with_ledger(ledger_client(config)?)
        .with_quotes(quote_provider(config)?)
        .with_domain(domain)
        .with_submitter_config(submitter_config(config)?)
        .with_config(orchestrator_config(config)?)
        .with_metrics(metrics)
        .build()
        .context("building orchestrator")
}

/// Submitter over the configured ledger and quote provider, for executing a
/// routed swap transaction outside the saga
pub fn build_submitter(config: &AppConfig, metrics: Arc<MetricsCollector>) -> Result<Submitter> {
    validate_config(config).context("invalid configuration")?;

    Ok(Submitter::new(
        ledger_client(config)?,
        quote_provider(config)?,
        submitter_config(config)?,
    )
    .with_metrics(metrics))
}

/// Compliance engine backed by the configured risk API
pub fn build_compliance_engine(
    config: &AppConfig,
    metrics: Arc<MetricsCollector>,
) -> Result<ComplianceEngine> {
    if config.compliance.api_key.is_empty() {
        return Err(anyhow!("compliance.api_key is not set"));
    }
    let client = RangeClient::with_timeout(
        config.compliance.base_url.clone(),
        config.compliance.api_key.clone(),
        millis(config.compliance.request_timeout_ms),
    )
    .context("building risk client")?;

    Ok(ComplianceEngine::new(Arc::new(client)).with_metrics(metrics))
}
