use serde::Serialize;
use solana_sdk::signature::Signature;
use tee_swap_types::{Phase, SwapRecord, SwapStatus};
use tracing::info;

use crate::error::OrchestratorError;
use crate::orchestrator::RunOutcome;

/// What the caller should do about a run that stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecoveryAction {
    /// Nothing landed on the ledger; the run can start over
    SafeToRetry,

    /// Confirmation timed out; the transaction may still land
    CheckTransaction { phase: Phase, signature: Signature },

    /// The swap account is held by the domain validator and must be handed back
    AwaitUndelegation,

    /// Requires manual intervention
    ManualIntervention { reason: String },

    NoActionNeeded,
}

/// Classify a stopped run into a recovery action
pub fn assess(outcome: &RunOutcome) -> RecoveryAction {
    let action = assess_parts(outcome.record.as_ref(), outcome.error.as_ref());
    if action != RecoveryAction::NoActionNeeded {
        info!(
            correlation_id = %outcome.correlation_id,
            action = ?action,
            "Recovery assessed"
        );
    }
    action
}

fn assess_parts(record: Option<&SwapRecord>, error: Option<&OrchestratorError>) -> RecoveryAction {
    if record.is_some_and(|r| r.status == SwapStatus::Finalized) {
        return RecoveryAction::NoActionNeeded;
    }
    let Some(error) = error else {
        return match record {
            Some(_) => RecoveryAction::ManualIntervention {
                reason: "run ended without finalizing".to_string(),
            },
            None => RecoveryAction::NoActionNeeded,
        };
    };

    if let Some(signature) = error.submission().and_then(|e| e.pending_signature()) {
        return RecoveryAction::CheckTransaction {
            phase: error.phase(),
            signature: *signature,
        };
    }

    let Some(record) = record else {
        return match error.submission() {
            Some(e) if !e.nothing_sent() => RecoveryAction::ManualIntervention {
                reason: error.to_string(),
            },
            _ => RecoveryAction::SafeToRetry,
        };
    };

    let delegated = record
        .receipt(Phase::Delegate)
        .is_some_and(|receipt| receipt.outcome.is_confirmed());
    if delegated {
        return RecoveryAction::AwaitUndelegation;
    }

    RecoveryAction::ManualIntervention {
        reason: format!(
            "swap account {} initialized, stopped at {}: {error}",
            record.swap_address,
            error.phase()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use solana_sdk::pubkey::Pubkey;
    use tee_swap_ledger::LedgerError;
    use tee_swap_metrics::CorrelationId;
    use tee_swap_submitter::SubmissionError;
    use tee_swap_types::{SimulatedTxId, SwapRequest, TxOutcome};

    fn record_through(phases: &[Phase]) -> SwapRecord {
        let request = SwapRequest::new(
            Pubkey::new_unique(),
            1_000,
            900,
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        )
        .unwrap();
        let mut record = SwapRecord::initialized(
            &request,
            Pubkey::new_unique(),
            254,
            TxOutcome::Confirmed(Signature::new_unique()),
            Utc::now(),
        );
        for phase in phases {
            record
                .advance(*phase, TxOutcome::Confirmed(Signature::new_unique()), Utc::now())
                .unwrap();
        }
        record
    }

    fn failed(phase: Phase) -> OrchestratorError {
        OrchestratorError::Phase {
            phase,
            source: SubmissionError::SubmissionFailed {
                phase,
                attempts: 3,
                last_error: LedgerError::Rejected("insufficient funds".into()),
            },
        }
    }

    fn outcome(record: Option<SwapRecord>, error: Option<OrchestratorError>) -> RunOutcome {
        RunOutcome {
            correlation_id: CorrelationId::new(),
            record,
            error,
        }
    }

    #[test]
    fn test_finalized_needs_nothing() {
        let record = record_through(&[Phase::Delegate, Phase::Execute, Phase::Finalize]);
        assert_eq!(
            assess(&outcome(Some(record), None)),
            RecoveryAction::NoActionNeeded
        );
    }

    #[test]
    fn test_init_failure_is_safe_to_retry() {
        assert_eq!(
            assess(&outcome(None, Some(failed(Phase::Init)))),
            RecoveryAction::SafeToRetry
        );
    }

    #[test]
    fn test_timeout_points_at_transaction() {
        let signature = Signature::new_unique();
        let error = OrchestratorError::Phase {
            phase: Phase::Delegate,
            source: SubmissionError::ConfirmationTimeout {
                phase: Phase::Delegate,
                signature,
            },
        };
        let mut record = record_through(&[]);
        record.fail(Phase::Delegate, Utc::now()).unwrap();

        assert_eq!(
            assess(&outcome(Some(record), Some(error))),
            RecoveryAction::CheckTransaction {
                phase: Phase::Delegate,
                signature,
            }
        );
    }

    #[test]
    fn test_failure_after_delegation_awaits_undelegation() {
        let mut record = record_through(&[Phase::Delegate]);
        record.fail(Phase::Execute, Utc::now()).unwrap();

        assert_eq!(
            assess(&outcome(Some(record), Some(failed(Phase::Execute)))),
            RecoveryAction::AwaitUndelegation
        );
    }

    #[test]
    fn test_simulated_delegate_is_not_delegation() {
        let mut record = record_through(&[]);
        record
            .advance(
                Phase::Delegate,
                TxOutcome::Simulated(SimulatedTxId::new(Phase::Delegate)),
                Utc::now(),
            )
            .unwrap();
        record.fail(Phase::Execute, Utc::now()).unwrap();

        assert!(matches!(
            assess(&outcome(Some(record), Some(failed(Phase::Execute)))),
            RecoveryAction::ManualIntervention { .. }
        ));
    }

    #[test]
    fn test_delegate_failure_needs_intervention() {
        let mut record = record_through(&[]);
        record.fail(Phase::Delegate, Utc::now()).unwrap();

        match assess(&outcome(Some(record), Some(failed(Phase::Delegate)))) {
            RecoveryAction::ManualIntervention { reason } => {
                assert!(reason.contains("stopped at delegate"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
