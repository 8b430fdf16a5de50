//! Cross-crate scenarios: configuration file through screening, the full
//! saga and recovery assessment, with in-memory ledger, domain and risk API.

use std::io::Write;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tee_swap::compliance::{
    ComplianceEngine, ComplianceRule, RiskAssessment, RiskExposure, StaticRiskSource,
};
use tee_swap::config::{AppConfig, ConfigLoader};
use tee_swap::domain::{
    ConnectionManager, DomainVerification, StaticChannelOpener, StaticHealthProbe,
};
use tee_swap::ledger::{MockLedgerClient, SendBehavior};
use tee_swap::metrics::MetricsCollector;
use tee_swap::orchestrator::{assess, RecoveryAction, SwapOrchestrator};
use tee_swap::quote::MockQuoteProvider;
use tee_swap::types::{
    AccountStatus, KnownAsset, Phase, SwapAccount, SwapRequest, SwapStatus, TxOutcome,
};
use tee_swap::{domain_settings, orchestrator_config, submitter_config};

const CONFIG: &str = r#"
[network]
environment = "local"
log_level = "debug"
json_logs = false

[ledger]
rpc_url = "http://127.0.0.1:8899"
program_id = "11111111111111111111111111111111"

[domain]
endpoint = "http://127.0.0.1:7799"
verification = "strict"

[submission]
max_attempts = 3
backoff_ms = 1000
confirmation_timeout_ms = 30000
poll_interval_ms = 500

[delegation]
poll_interval_ms = 100
max_polls = 5
timeout_ms = 2000

[quote]
staleness_secs = 30

[compliance]
base_url = "http://127.0.0.1:9000"
"#;

// ═══════════════════════════════════════════════════════════════════════════
// HARNESS
// ═══════════════════════════════════════════════════════════════════════════

fn load_config() -> AppConfig {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    ConfigLoader::from_file(file.path()).unwrap()
}

struct Harness {
    orchestrator: SwapOrchestrator,
    ledger: Arc<MockLedgerClient>,
    domain: Arc<MockLedgerClient>,
    metrics: Arc<MetricsCollector>,
}

/// Production settings from `config`, in-memory collaborators
fn harness(config: &AppConfig, ledger: MockLedgerClient, domain: MockLedgerClient) -> Harness {
    let orchestrator_config = orchestrator_config(config).unwrap();
    let ledger = Arc::new(
        ledger
            .with_journal(domain.journal())
            .delegate_on_accept(orchestrator_config.delegation_program_id),
    );
    let domain = Arc::new(domain);
    let metrics = Arc::new(MetricsCollector::new());

    let manager = ConnectionManager::new(domain_settings(config).unwrap())
        .with_probe(Arc::new(StaticHealthProbe(DomainVerification::Verified)))
        .with_opener(Arc::new(StaticChannelOpener(domain.clone())));

    let orchestrator = SwapOrchestrator::builder()
        .with_ledger(ledger.clone())
        .with_quotes(Arc::new(MockQuoteProvider::new()))
        .with_domain(manager)
        .with_submitter_config(submitter_config(config).unwrap())
        .with_config(orchestrator_config)
        .with_metrics(metrics.clone())
        .build()
        .unwrap();

    Harness {
        orchestrator,
        ledger,
        domain,
        metrics,
    }
}

fn sol_to_usdc(signer: &Keypair) -> SwapRequest {
    SwapRequest::new(
        signer.pubkey(),
        1_000_000_000,
        900_000_000,
        KnownAsset::Sol.mint(),
        KnownAsset::Usdc.mint(),
    )
    .unwrap()
}

fn risk(address: &Pubkey, risk_score: f64, sanctioned: bool) -> RiskAssessment {
    RiskAssessment {
        address: address.to_string(),
        risk_score,
        is_sanctioned: sanctioned,
        labels: Vec::new(),
        exposure: RiskExposure::default(),
        first_seen: None,
        last_activity: None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SCREENED SAGA
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_screened_swap_finalizes_from_config_file() {
    let config = load_config();
    let h = harness(
        &config,
        MockLedgerClient::new("mock://ledger"),
        MockLedgerClient::new("mock://domain"),
    );
    let signer = Keypair::new();

    let engine = ComplianceEngine::new(Arc::new(
        StaticRiskSource::new().with(risk(&signer.pubkey(), 12.0, false)),
    ))
    .with_metrics(h.metrics.clone());
    let decision = engine.check(&signer.pubkey().to_string()).await.unwrap();
    assert!(decision.allowed);

    let outcome = h.orchestrator.run(&sol_to_usdc(&signer), &signer).await;
    assert!(outcome.is_finalized(), "{:?}", outcome.error);
    assert_eq!(assess(&outcome), RecoveryAction::NoActionNeeded);

    let record = outcome.record.unwrap();
    assert!(record.is_ledger_confirmed());
    assert_eq!(record.status, SwapStatus::Finalized);

    let phases: Vec<_> = h
        .ledger
        .journal()
        .lock()
        .await
        .iter()
        .filter(|sent| sent.accepted)
        .map(|sent| (sent.endpoint.clone(), sent.phase))
        .collect();
    assert_eq!(
        phases,
        vec![
            ("mock://ledger".to_string(), Some(Phase::Init)),
            ("mock://ledger".to_string(), Some(Phase::Delegate)),
            ("mock://domain".to_string(), Some(Phase::Execute)),
            ("mock://ledger".to_string(), Some(Phase::Finalize)),
        ]
    );

    let exported = h.metrics.export_metrics().unwrap();
    assert!(exported.contains("tee_swap_runs_total"));
    assert!(exported.contains("tee_swap_phase_total"));
}

#[tokio::test]
async fn test_sanctioned_requester_is_denied_before_any_send() {
    let config = load_config();
    let h = harness(
        &config,
        MockLedgerClient::new("mock://ledger"),
        MockLedgerClient::new("mock://domain"),
    );
    let signer = Keypair::new();

    let engine = ComplianceEngine::new(Arc::new(
        StaticRiskSource::new().with(risk(&signer.pubkey(), 5.0, true)),
    ));
    let decision = engine.check(&signer.pubkey().to_string()).await.unwrap();

    assert!(!decision.allowed);
    assert_eq!(decision.violated, Some(ComplianceRule::Sanctioned));
    assert_eq!(h.ledger.send_attempts().await, 0);
    assert_eq!(h.domain.send_attempts().await, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// OUTAGES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_strict_config_ledger_outage_is_safe_to_retry() {
    let config = load_config();
    let h = harness(
        &config,
        MockLedgerClient::new("mock://ledger").with_default_send(SendBehavior::Unavailable),
        MockLedgerClient::new("mock://domain"),
    );
    let signer = Keypair::new();

    let outcome = h.orchestrator.run(&sol_to_usdc(&signer), &signer).await;

    assert!(outcome.record.is_none());
    assert_eq!(outcome.error.as_ref().map(|e| e.phase()), Some(Phase::Init));
    assert_eq!(h.ledger.send_attempts().await, 3);
    assert_eq!(assess(&outcome), RecoveryAction::SafeToRetry);
}

#[tokio::test(start_paused = true)]
async fn test_degraded_config_carries_simulated_receipts() {
    let mut config = load_config();
    config.submission.allow_simulated = true;
    let h = harness(
        &config,
        MockLedgerClient::new("mock://ledger").with_default_send(SendBehavior::Unavailable),
        MockLedgerClient::new("mock://domain").with_default_send(SendBehavior::Unavailable),
    );
    let signer = Keypair::new();

    let outcome = h.orchestrator.run(&sol_to_usdc(&signer), &signer).await;
    assert!(outcome.is_finalized(), "{:?}", outcome.error);

    let record = outcome.record.unwrap();
    assert!(!record.is_ledger_confirmed());
    assert!(record
        .receipts
        .iter()
        .all(|receipt| matches!(receipt.outcome, TxOutcome::Simulated(_))));
    assert!(record
        .receipts
        .iter()
        .all(|receipt| receipt.outcome.confirmed().is_none()));
    assert_eq!(h.ledger.owner_queries().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_execute_rejected_after_delegation_awaits_undelegation() {
    let config = load_config();
    let h = harness(
        &config,
        MockLedgerClient::new("mock://ledger"),
        MockLedgerClient::new("mock://domain")
            .with_default_send(SendBehavior::Reject("slippage exceeded".into())),
    );
    let signer = Keypair::new();

    let outcome = h.orchestrator.run(&sol_to_usdc(&signer), &signer).await;

    let record = outcome.record.as_ref().unwrap();
    assert_eq!(record.status, SwapStatus::Failed);
    assert_eq!(record.failed_phase, Some(Phase::Execute));
    assert_eq!(assess(&outcome), RecoveryAction::AwaitUndelegation);
}

// ═══════════════════════════════════════════════════════════════════════════
// ON-LEDGER STATE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_fetch_swap_state_at_configured_program() {
    let config = load_config();
    let owner = Pubkey::new_unique();
    let program_id = submitter_config(&config).unwrap().program_id;
    let (address, bump) = tee_swap::types::derive_swap_address(&owner, &program_id);

    let account = SwapAccount {
        user: owner,
        amount_in: 1_000_000_000,
        minimum_amount_out: 900_000_000,
        status: AccountStatus::Executed,
        executed_at: 1_700_000_000,
        bump,
    };
    let h = harness(
        &config,
        MockLedgerClient::new("mock://ledger").with_account_data(address, account.encode()),
        MockLedgerClient::new("mock://domain"),
    );

    assert_eq!(h.orchestrator.swap_address(&owner), address);
    assert_eq!(
        h.orchestrator.fetch_swap_state(&owner).await.unwrap(),
        Some(account)
    );
    assert_eq!(
        h.orchestrator
            .fetch_swap_state(&Pubkey::new_unique())
            .await
            .unwrap(),
        None
    );
}
