use chrono::Utc;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tee_swap_domain::DomainChannel;
use tee_swap_ledger::{LedgerClient, LedgerError, SignatureState};
use tee_swap_metrics::{ErrorContext, MetricsCollector};
use tee_swap_quote::{QuoteError, QuoteProvider, QuoteRequest};
use tee_swap_types::{Domain, Phase, Quote, SimulatedTxId, SwapRequest, TxOutcome, TEE_VALIDATOR};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{phase_instruction, RetryPolicy, SubmissionError};

/// Submission settings
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Swap program the phase instructions target
    pub program_id: Pubkey,

    /// Validator named in the delegate instruction
    pub validator: Pubkey,

    /// Hard bound on waiting for confirmation after a successful send
    pub confirmation_timeout: Duration,

    pub poll_interval: Duration,

    /// Return a simulated id when every attempt found the target unavailable
    pub allow_simulated: bool,

    /// Oldest quote the execute phase accepts
    pub quote_staleness: Duration,

    pub retry: RetryPolicy,
}

impl SubmitterConfig {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            validator: Pubkey::from_str(TEE_VALIDATOR).unwrap_or_default(),
            confirmation_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            allow_simulated: false,
            quote_staleness: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_validator(mut self, validator: Pubkey) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_confirmation(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_allow_simulated(mut self, allow: bool) -> Self {
        self.allow_simulated = allow;
        self
    }

    pub fn with_quote_staleness(mut self, window: Duration) -> Self {
        self.quote_staleness = window;
        self
    }
}

/// Per-run inputs a phase is built from
#[derive(Clone, Copy)]
pub struct PhaseContext<'a> {
    pub signer: &'a Keypair,
    pub request: &'a SwapRequest,
    pub swap_address: Pubkey,
}

/// Where a phase is sent
#[derive(Clone, Copy)]
pub enum Route<'a> {
    Ledger,
    Domain(&'a DomainChannel),
}

impl Route<'_> {
    fn domain(&self) -> Domain {
        match self {
            Route::Ledger => Domain::Ledger,
            Route::Domain(_) => Domain::Isolated,
        }
    }
}

/// Outcome of one phase plus what was learned along the way
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    pub outcome: TxOutcome,

    /// Send attempts made, including the successful one
    pub attempts: u32,

    /// Quote the execute phase accepted
    pub quote: Option<Quote>,
}

enum AttemptError {
    Ledger(LedgerError),
    Sign(String),
}

/// Builds, signs, sends and confirms saga phases
pub struct Submitter {
    ledger: Arc<dyn LedgerClient>,
    quotes: Arc<dyn QuoteProvider>,
    config: SubmitterConfig,
    metrics: Arc<MetricsCollector>,
}

impl Submitter {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        quotes: Arc<dyn QuoteProvider>,
        config: SubmitterConfig,
    ) -> Self {
        Self {
            ledger,
            quotes,
            config,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    pub fn quotes(&self) -> &Arc<dyn QuoteProvider> {
        &self.quotes
    }

    pub async fn submit(
        &self,
        phase: Phase,
        ctx: &PhaseContext<'_>,
        route: Route<'_>,
    ) -> Result<TxOutcome, SubmissionError> {
        self.submit_with_report(phase, ctx, route)
            .await
            .map(|report| report.outcome)
    }

    /// Submit one phase and report attempts and the accepted quote
    pub async fn submit_with_report(
        &self,
        phase: Phase,
        ctx: &PhaseContext<'_>,
        route: Route<'_>,
    ) -> Result<SubmissionReport, SubmissionError> {
        let result = self.run_phase(phase, ctx, route).await;

        if let Err(e) = &result {
            self.metrics.record_submission_failure(phase, e.kind());
        }
        result
    }

    /// Sign the routed swap transaction for `quote` and send it to the ledger
    ///
    /// The provider fixes the blockhash, so the transaction is signed once and
    /// every retry resends the same bytes. Attempts follow the configured
    /// [`RetryPolicy`] and a successful send is confirmed under the same
    /// timeout as a phase. Unavailability never degrades into a simulated
    /// outcome here.
    pub async fn submit_swap_transaction(
        &self,
        quote: &Quote,
        signer: &Keypair,
    ) -> Result<SubmissionReport, SubmissionError> {
        let phase = Phase::Execute;
        let result = self.run_swap_transaction(phase, quote, signer).await;

        if let Err(e) = &result {
            self.metrics.record_submission_failure(phase, e.kind());
        }
        result.with_phase(phase, SubmissionError::kind)
    }

    async fn run_swap_transaction(
        &self,
        phase: Phase,
        quote: &Quote,
        signer: &Keypair,
    ) -> Result<SubmissionReport, SubmissionError> {
        self.check_fresh(phase, quote)?;

        let unsigned = self
            .quotes
            .build_swap_transaction(quote, &signer.pubkey())
            .await
            .map_err(|source| SubmissionError::Quote { phase, source })?;
        let tx = VersionedTransaction::try_new(unsigned.message, &[signer]).map_err(|e| {
            SubmissionError::Build {
                phase,
                reason: e.to_string(),
            }
        })?;

        let client = self.ledger.as_ref();
        let max_attempts = self.config.retry.max_attempts();
        let backoff = self.config.retry.backoff();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.metrics.record_submission_attempt(phase);

            match client.send_versioned_transaction(&tx).await {
                Ok(signature) => {
                    info!(
                        endpoint = %client.endpoint(),
                        attempt = attempt,
                        signature = %signature,
                        in_amount = quote.in_amount,
                        other_amount_threshold = quote.other_amount_threshold,
                        "Swap transaction sent"
                    );
                    self.confirm(phase, client, signature).await?;
                    info!(signature = %signature, "Swap transaction confirmed");

                    return Ok(SubmissionReport {
                        outcome: TxOutcome::Confirmed(signature),
                        attempts: attempt,
                        quote: Some(quote.clone()),
                    });
                }
                Err(e) => {
                    warn!(
                        endpoint = %client.endpoint(),
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Swap transaction send failed"
                    );
                    last_error = Some(e);

                    if attempt < max_attempts {
                        tokio::time::sleep(backoff.next_delay()).await;
                    }
                }
            }
        }

        Err(SubmissionError::SubmissionFailed {
            phase,
            attempts: max_attempts,
            last_error: last_error.unwrap_or_else(|| {
                LedgerError::Unavailable(format!("{} not attempted", client.endpoint()))
            }),
        })
    }

    async fn run_phase(
        &self,
        phase: Phase,
        ctx: &PhaseContext<'_>,
        route: Route<'_>,
    ) -> Result<SubmissionReport, SubmissionError> {
        let client = self.resolve(phase, route)?;

        let quote = if phase == Phase::Execute {
            Some(self.checked_quote(phase, ctx.request).await?)
        } else {
            None
        };

        let instruction = phase_instruction(
            phase,
            &self.config.program_id,
            &ctx.swap_address,
            &ctx.signer.pubkey(),
            &self.config.validator,
            ctx.request.amount_in,
            ctx.request.minimum_amount_out,
        );

        let max_attempts = self.config.retry.max_attempts();
        let backoff = self.config.retry.backoff();
        let mut signed: Option<Transaction> = None;
        let mut all_unavailable = true;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.metrics.record_submission_attempt(phase);

            match self
                .send_once(client, &instruction, ctx.signer, &mut signed)
                .await
            {
                Ok(signature) => {
                    info!(
                        phase = %phase,
                        endpoint = %client.endpoint(),
                        attempt = attempt,
                        signature = %signature,
                        "Transaction sent"
                    );
                    self.confirm(phase, client, signature).await?;
                    info!(phase = %phase, signature = %signature, "Phase confirmed");

                    return Ok(SubmissionReport {
                        outcome: TxOutcome::Confirmed(signature),
                        attempts: attempt,
                        quote,
                    });
                }
                Err(AttemptError::Sign(reason)) => {
                    return Err(SubmissionError::Build { phase, reason });
                }
                Err(AttemptError::Ledger(e)) => {
                    warn!(
                        phase = %phase,
                        endpoint = %client.endpoint(),
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Send attempt failed"
                    );
                    all_unavailable &= e.is_unavailable();
                    last_error = Some(e);

                    if attempt < max_attempts {
                        tokio::time::sleep(backoff.next_delay()).await;
                    }
                }
            }
        }

        if all_unavailable && self.config.allow_simulated {
            let simulated = SimulatedTxId::new(phase);
            warn!(
                phase = %phase,
                endpoint = %client.endpoint(),
                simulated_id = %simulated,
                "Target unavailable, returning simulated outcome"
            );
            return Ok(SubmissionReport {
                outcome: TxOutcome::Simulated(simulated),
                attempts: max_attempts,
                quote,
            });
        }

        Err(SubmissionError::SubmissionFailed {
            phase,
            attempts: max_attempts,
            last_error: last_error.unwrap_or_else(|| {
                LedgerError::Unavailable(format!("{} not attempted", client.endpoint()))
            }),
        })
    }

    /// Client the phase must be sent through
    fn resolve<'r>(
        &'r self,
        phase: Phase,
        route: Route<'r>,
    ) -> Result<&'r dyn LedgerClient, SubmissionError> {
        match (phase.domain(), route) {
            (Domain::Ledger, Route::Ledger) => Ok(self.ledger.as_ref()),
            (Domain::Isolated, Route::Domain(channel)) => Ok(channel.client()),
            (Domain::Isolated, Route::Ledger) => Err(SubmissionError::MissingChannel { phase }),
            (expected, route) => Err(SubmissionError::Build {
                phase,
                reason: format!("phase targets {expected:?}, routed to {:?}", route.domain()),
            }),
        }
    }

    /// Fetch a quote and hold it to the staleness window and the minimum output
    async fn checked_quote(
        &self,
        phase: Phase,
        request: &SwapRequest,
    ) -> Result<Quote, SubmissionError> {
        let quote_request = QuoteRequest::from(request);

        let quote = match self.quotes.get_quote(&quote_request).await {
            Ok(quote) => quote,
            Err(QuoteError::NoRouteFound { .. }) => {
                self.metrics.record_quote("no_route");
                return Err(SubmissionError::NoRouteFound { phase });
            }
            Err(source) => {
                self.metrics.record_quote("error");
                return Err(SubmissionError::Quote { phase, source });
            }
        };

        self.check_fresh(phase, &quote)?;

        if !quote.meets_minimum(request.minimum_amount_out) {
            self.metrics.record_quote("below_minimum");
            return Err(SubmissionError::QuoteBelowMinimum {
                phase,
                quoted: quote.other_amount_threshold,
                minimum: request.minimum_amount_out,
            });
        }

        self.metrics.record_quote("accepted");
        debug!(
            phase = %phase,
            in_amount = quote.in_amount,
            out_amount = quote.out_amount,
            route_hops = quote.route_hops,
            price_impact_pct = %quote.price_impact_pct,
            "Quote accepted"
        );
        Ok(quote)
    }

    fn check_fresh(&self, phase: Phase, quote: &Quote) -> Result<(), SubmissionError> {
        let now = Utc::now();
        let window = chrono::Duration::seconds(self.config.quote_staleness.as_secs() as i64);
        if quote.is_stale(now, window) {
            self.metrics.record_quote("stale");
            return Err(SubmissionError::QuoteStale {
                phase,
                age_secs: quote.age(now).num_seconds(),
                max_secs: window.num_seconds(),
            });
        }
        Ok(())
    }

    /// Sign on first use; later attempts resend the identical payload
    async fn send_once(
        &self,
        client: &dyn LedgerClient,
        instruction: &Instruction,
        signer: &Keypair,
        signed: &mut Option<Transaction>,
    ) -> Result<Signature, AttemptError> {
        if signed.is_none() {
            let blockhash = client
                .latest_blockhash()
                .await
                .map_err(AttemptError::Ledger)?;

            let mut tx =
                Transaction::new_with_payer(&[instruction.clone()], Some(&signer.pubkey()));
            tx.try_sign(&[signer], blockhash)
                .map_err(|e| AttemptError::Sign(e.to_string()))?;
            *signed = Some(tx);
        }

        match signed.as_ref() {
            Some(tx) => client
                .send_transaction(tx)
                .await
                .map_err(AttemptError::Ledger),
            None => Err(AttemptError::Sign("transaction was not signed".to_string())),
        }
    }

    /// Poll the signature status until it settles or the timeout elapses
    async fn confirm(
        &self,
        phase: Phase,
        client: &dyn LedgerClient,
        signature: Signature,
    ) -> Result<(), SubmissionError> {
        let started = Instant::now();
        let poll_interval = self.config.poll_interval;

        let poll = async {
            loop {
                match client.signature_status(&signature).await {
                    Ok(SignatureState::Confirmed) => return Ok(()),
                    Ok(SignatureState::Failed(reason)) => {
                        return Err(SubmissionError::TransactionRejected { phase, reason });
                    }
                    Ok(SignatureState::Pending) => {}
                    Err(e) => {
                        debug!(phase = %phase, signature = %signature, error = %e, "Status poll failed");
                    }
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        match tokio::time::timeout(self.config.confirmation_timeout, poll).await {
            Ok(Ok(())) => {
                self.metrics.record_confirmation(started.elapsed());
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SubmissionError::ConfirmationTimeout { phase, signature }),
        }
    }
}
