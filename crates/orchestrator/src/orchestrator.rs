use chrono::Utc;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tee_swap_domain::{ConnectionError, ConnectionManager, DomainChannel};
use tee_swap_ledger::LedgerClient;
use tee_swap_metrics::{
    CorrelationId, ErrorContext, MetricsCollector, PhaseOutcome, RunOutcomeLabel, RunSpan,
};
use tee_swap_quote::QuoteProvider;
use tee_swap_submitter::{
    PhaseContext, Route, SubmissionError, SubmissionReport, Submitter, SubmitterConfig,
};
use tee_swap_types::{
    derive_swap_address, Domain, Phase, SwapAccount, SwapRecord, SwapRequest, SwapStatus,
    TxOutcome, DELEGATION_PROGRAM_ID,
};
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};

use crate::error::{BuilderError, OrchestratorError, StateError};

/// Whether a simulated phase outcome may stand in for a confirmed one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedMode {
    /// Every phase must be ledger-confirmed before the next is built
    Strict,

    /// Simulated outcomes advance the record and are kept on it
    Allowed,
}

/// Bounds on waiting for the swap account to change hands after Delegate
#[derive(Debug, Clone)]
pub struct DelegationPolicy {
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub timeout: Duration,
}

impl Default for DelegationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_polls: 20,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Owner the swap account must report once delegated
    pub delegation_program_id: Pubkey,

    pub degraded_mode: DegradedMode,

    pub delegation: DelegationPolicy,
}

impl OrchestratorConfig {
    pub fn with_degraded_mode(mut self, mode: DegradedMode) -> Self {
        self.degraded_mode = mode;
        self
    }

    pub fn with_delegation(mut self, delegation: DelegationPolicy) -> Self {
        self.delegation = delegation;
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            delegation_program_id: Pubkey::from_str(DELEGATION_PROGRAM_ID).unwrap_or_default(),
            degraded_mode: DegradedMode::Strict,
            delegation: DelegationPolicy::default(),
        }
    }
}

/// Best-known state of a run plus the reason it stopped, if it did
#[derive(Debug)]
pub struct RunOutcome {
    pub correlation_id: CorrelationId,

    /// `None` only when the Init phase itself did not complete
    pub record: Option<SwapRecord>,

    pub error: Option<OrchestratorError>,
}

impl RunOutcome {
    pub fn is_finalized(&self) -> bool {
        self.error.is_none()
            && self
                .record
                .as_ref()
                .is_some_and(|record| record.status == SwapStatus::Finalized)
    }

    pub fn into_result(self) -> Result<SwapRecord, OrchestratorError> {
        match (self.record, self.error) {
            (_, Some(error)) => Err(error),
            (Some(record), None) => Ok(record),
            (None, None) => Err(OrchestratorError::Unconfirmed {
                phase: Phase::Init,
                id: "missing record".to_string(),
            }),
        }
    }

    fn label(&self) -> RunOutcomeLabel {
        match &self.record {
            Some(record) if self.error.is_none() && record.has_simulated_phase() => {
                RunOutcomeLabel::Degraded
            }
            Some(_) if self.error.is_none() => RunOutcomeLabel::Finalized,
            _ => RunOutcomeLabel::Failed,
        }
    }
}

/// Builder for SwapOrchestrator
pub struct SwapOrchestratorBuilder {
    ledger: Option<Arc<dyn LedgerClient>>,
    quotes: Option<Arc<dyn QuoteProvider>>,
    domain: Option<ConnectionManager>,
    submitter_config: Option<SubmitterConfig>,
    config: OrchestratorConfig,
    metrics: Option<Arc<MetricsCollector>>,
}

impl SwapOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            ledger: None,
            quotes: None,
            domain: None,
            submitter_config: None,
            config: OrchestratorConfig::default(),
            metrics: None,
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_quotes(mut self, quotes: Arc<dyn QuoteProvider>) -> Self {
        self.quotes = Some(quotes);
        self
    }

    pub fn with_domain(mut self, domain: ConnectionManager) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn with_submitter_config(mut self, config: SubmitterConfig) -> Self {
        self.submitter_config = Some(config);
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the SwapOrchestrator, validating that all required fields are set
    pub fn build(self) -> Result<SwapOrchestrator, BuilderError> {
        let ledger = self.ledger.ok_or_else(|| BuilderError::MissingField {
            field: "ledger".to_string(),
        })?;

        let quotes = self.quotes.ok_or_else(|| BuilderError::MissingField {
            field: "quotes".to_string(),
        })?;

        let domain = self.domain.ok_or_else(|| BuilderError::MissingField {
            field: "domain".to_string(),
        })?;

        let submitter_config = self.submitter_config.ok_or_else(|| BuilderError::MissingField {
            field: "submitter_config".to_string(),
        })?;

        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(MetricsCollector::new()));
        let submitter =
            Submitter::new(ledger, quotes, submitter_config).with_metrics(metrics.clone());

        Ok(SwapOrchestrator {
            submitter,
            domain,
            config: self.config,
            metrics,
        })
    }
}

impl Default for SwapOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives one swap through Init, Delegate, Execute and Finalize.
///
/// Holds no per-run state: the record and the domain channel live on the
/// stack of [`SwapOrchestrator::run`], so one orchestrator can serve
/// concurrent runs for different requesters.
pub struct SwapOrchestrator {
    submitter: Submitter,
    domain: ConnectionManager,
    config: OrchestratorConfig,
    metrics: Arc<MetricsCollector>,
}

impl SwapOrchestrator {
    pub fn builder() -> SwapOrchestratorBuilder {
        SwapOrchestratorBuilder::new()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.submitter.config().program_id
    }

    /// Derived swap account address for `owner`
    pub fn swap_address(&self, owner: &Pubkey) -> Pubkey {
        derive_swap_address(owner, self.program_id()).0
    }

    /// Run all four phases in order for `request`, signing with `signer`
    pub async fn run(&self, request: &SwapRequest, signer: &Keypair) -> RunOutcome {
        let (swap_address, bump) = derive_swap_address(&request.requester, self.program_id());
        let run_span = RunSpan::new(request.requester, swap_address);
        let correlation_id = run_span.correlation_id;

        self.metrics.record_run_started();
        let started = Instant::now();

        let (record, error) = self
            .drive(request, signer, swap_address, bump)
            .instrument(run_span.span())
            .await;

        let outcome = RunOutcome {
            correlation_id,
            record,
            error,
        };
        self.metrics
            .record_run_finished(outcome.label(), started.elapsed());

        match &outcome.error {
            None => info!(
                correlation_id = %correlation_id,
                swap_address = %swap_address,
                degraded = outcome.label() == RunOutcomeLabel::Degraded,
                "Swap finalized"
            ),
            // Phase failures were already logged with their error
            Some(e @ OrchestratorError::Phase { .. }) => warn!(
                correlation_id = %correlation_id,
                swap_address = %swap_address,
                phase = %e.phase(),
                error_kind = e.kind(),
                "Swap stopped"
            ),
            Some(e) => warn!(
                correlation_id = %correlation_id,
                swap_address = %swap_address,
                phase = %e.phase(),
                error_kind = e.kind(),
                error = %e,
                "Swap stopped"
            ),
        }
        outcome
    }

    /// Like [`SwapOrchestrator::run`] but collapsed into a `Result`
    pub async fn run_checked(
        &self,
        request: &SwapRequest,
        signer: &Keypair,
    ) -> Result<SwapRecord, OrchestratorError> {
        self.run(request, signer).await.into_result()
    }

    /// Read the on-ledger swap account of `owner`
    pub async fn fetch_swap_state(&self, owner: &Pubkey) -> Result<Option<SwapAccount>, StateError> {
        let address = self.swap_address(owner);
        let Some(data) = self.submitter.ledger().account_data(&address).await? else {
            return Ok(None);
        };
        Ok(Some(SwapAccount::decode(&data)?))
    }

    async fn drive(
        &self,
        request: &SwapRequest,
        signer: &Keypair,
        swap_address: Pubkey,
        bump: u8,
    ) -> (Option<SwapRecord>, Option<OrchestratorError>) {
        if let Err(e) = request.validate() {
            return (None, Some(e.into()));
        }
        if signer.pubkey() != request.requester {
            return (
                None,
                Some(OrchestratorError::SignerMismatch {
                    expected: request.requester,
                    actual: signer.pubkey(),
                }),
            );
        }

        info!(
            amount_in = request.amount_in,
            minimum_amount_out = request.minimum_amount_out,
            input_mint = %request.input_mint,
            output_mint = %request.output_mint,
            "Starting swap"
        );

        let ctx = PhaseContext {
            signer,
            request,
            swap_address,
        };

        let init = match self.submit_phase(Phase::Init, &ctx, Route::Ledger).await {
            Ok(report) => report,
            Err(e) => return (None, Some(e)),
        };
        let mut record =
            SwapRecord::initialized(request, swap_address, bump, init.outcome, Utc::now());

        let mut channel: Option<DomainChannel> = None;
        let mut phase = Phase::Init;

        while let Some(next) = phase.next() {
            phase = next;

            if phase == Phase::Execute {
                if let Err(e) = self.prepare_execute(&record, &mut channel, signer).await {
                    return Self::stop(record, phase, e);
                }
            }

            let route = match (phase.domain(), channel.as_ref()) {
                (Domain::Isolated, Some(channel)) => Route::Domain(channel),
                _ => Route::Ledger,
            };

            let report = match self.submit_phase(phase, &ctx, route).await {
                Ok(report) => report,
                Err(e) => return Self::stop(record, phase, e),
            };

            if let Err(source) = record.advance(phase, report.outcome, Utc::now()) {
                return Self::stop(record, phase, OrchestratorError::Record { phase, source });
            }
            if report.quote.is_some() {
                record.quote = report.quote;
            }
            debug!(phase = %phase, status = %record.status, "Record advanced");
        }

        (Some(record), None)
    }

    /// Mark the record failed at `phase` and end the run
    fn stop(
        mut record: SwapRecord,
        phase: Phase,
        error: OrchestratorError,
    ) -> (Option<SwapRecord>, Option<OrchestratorError>) {
        if let Err(e) = record.fail(phase, Utc::now()) {
            warn!(phase = %phase, error = %e, "Record already terminal");
        }
        (Some(record), Some(error))
    }

    /// Submit one phase and hold its outcome to the degraded-mode policy
    async fn submit_phase(
        &self,
        phase: Phase,
        ctx: &PhaseContext<'_>,
        route: Route<'_>,
    ) -> Result<SubmissionReport, OrchestratorError> {
        let started = Instant::now();
        info!(phase = %phase, "Submitting phase");

        let result = self
            .submitter
            .submit_with_report(phase, ctx, route)
            .await
            .with_phase(phase, SubmissionError::kind);

        let report = match result {
            Ok(report) => report,
            Err(source) => {
                self.metrics
                    .record_phase(phase, PhaseOutcome::Failed, started.elapsed());
                return Err(OrchestratorError::Phase { phase, source });
            }
        };

        match &report.outcome {
            TxOutcome::Confirmed(_) => {
                self.metrics
                    .record_phase(phase, PhaseOutcome::Confirmed, started.elapsed());
            }
            TxOutcome::Simulated(id) => {
                self.metrics
                    .record_phase(phase, PhaseOutcome::Simulated, started.elapsed());
                if self.config.degraded_mode == DegradedMode::Strict {
                    return Err(OrchestratorError::Unconfirmed {
                        phase,
                        id: id.to_string(),
                    });
                }
                warn!(phase = %phase, simulated_id = %id, "Continuing on simulated outcome");
            }
        }
        Ok(report)
    }

    /// Wait for delegation to land, then make sure a domain channel exists
    async fn prepare_execute(
        &self,
        record: &SwapRecord,
        channel: &mut Option<DomainChannel>,
        signer: &Keypair,
    ) -> Result<(), OrchestratorError> {
        let delegate_simulated = record
            .receipt(Phase::Delegate)
            .is_some_and(|receipt| receipt.outcome.is_simulated());

        if delegate_simulated {
            warn!(
                swap_address = %record.swap_address,
                "Delegate outcome is simulated, skipping delegation poll"
            );
        } else {
            self.await_delegation(&record.swap_address).await?;
        }

        let result = self
            .domain
            .ensure_channel(channel, &record.owner, signer)
            .await;
        match result {
            Ok(channel) => {
                self.metrics
                    .record_domain_verification(channel.verification.label());
                Ok(())
            }
            Err(source) => {
                if let ConnectionError::DomainUntrusted { verification, .. } = &source {
                    self.metrics
                        .record_domain_verification(verification.label());
                }
                Err(OrchestratorError::Domain { source })
            }
        }
    }

    /// Poll the account owner until it is the delegation program
    async fn await_delegation(&self, swap_address: &Pubkey) -> Result<(), OrchestratorError> {
        let policy = &self.config.delegation;
        let ledger = self.submitter.ledger();
        let expected = self.config.delegation_program_id;

        let poll = async {
            let mut last_owner = None;
            for poll in 1..=policy.max_polls {
                self.metrics.record_delegation_poll();

                match ledger.account_owner(swap_address).await {
                    Ok(Some(owner)) if owner == expected => {
                        info!(swap_address = %swap_address, polls = poll, "Delegation observed");
                        return Ok(());
                    }
                    Ok(owner) => last_owner = owner,
                    Err(e) => {
                        debug!(swap_address = %swap_address, error = %e, "Owner query failed");
                    }
                }

                if poll < policy.max_polls {
                    tokio::time::sleep(policy.poll_interval).await;
                }
            }

            Err(OrchestratorError::DelegationNotConfirmed {
                swap_address: *swap_address,
                reason: match last_owner {
                    Some(owner) => format!(
                        "owner still {owner} after {} polls",
                        policy.max_polls
                    ),
                    None => format!("owner unknown after {} polls", policy.max_polls),
                },
            })
        };

        match tokio::time::timeout(policy.timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(OrchestratorError::DelegationNotConfirmed {
                swap_address: *swap_address,
                reason: format!("timed out after {:?}", policy.timeout),
            }),
        }
    }
}
