use solana_sdk::pubkey::Pubkey;
use tee_swap_domain::ConnectionError;
use tee_swap_ledger::LedgerError;
use tee_swap_submitter::SubmissionError;
use tee_swap_types::{AccountError, Phase, RecordError, RequestError};
use thiserror::Error;

/// Why a run stopped; every variant resolves to the phase that could not complete
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid swap request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("signer {actual} is not the requester {expected}")]
    SignerMismatch { expected: Pubkey, actual: Pubkey },

    #[error("{phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: SubmissionError,
    },

    #[error("{phase} produced unconfirmed outcome {id} and degraded mode is off")]
    Unconfirmed { phase: Phase, id: String },

    #[error("delegation of {swap_address} not observed: {reason}")]
    DelegationNotConfirmed { swap_address: Pubkey, reason: String },

    #[error("domain channel unavailable: {source}")]
    Domain {
        #[source]
        source: ConnectionError,
    },

    #[error("record rejected {phase}: {source}")]
    Record {
        phase: Phase,
        #[source]
        source: RecordError,
    },
}

impl OrchestratorError {
    /// Phase that could not complete
    pub fn phase(&self) -> Phase {
        match self {
            OrchestratorError::InvalidRequest(_) | OrchestratorError::SignerMismatch { .. } => {
                Phase::Init
            }
            OrchestratorError::Phase { phase, .. }
            | OrchestratorError::Unconfirmed { phase, .. }
            | OrchestratorError::Record { phase, .. } => *phase,
            // Both are preconditions of the execute phase
            OrchestratorError::DelegationNotConfirmed { .. } | OrchestratorError::Domain { .. } => {
                Phase::Execute
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::InvalidRequest(_) => "invalid_request",
            OrchestratorError::SignerMismatch { .. } => "signer_mismatch",
            OrchestratorError::Phase { source, .. } => source.kind(),
            OrchestratorError::Unconfirmed { .. } => "unconfirmed",
            OrchestratorError::DelegationNotConfirmed { .. } => "delegation_not_confirmed",
            OrchestratorError::Domain { source } => match source {
                ConnectionError::DomainUntrusted { .. } => "domain_untrusted",
                _ => "domain_connection",
            },
            OrchestratorError::Record { .. } => "record",
        }
    }

    /// Underlying submission failure, if the phase itself failed
    pub fn submission(&self) -> Option<&SubmissionError> {
        match self {
            OrchestratorError::Phase { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure reading the on-ledger swap account
#[derive(Debug, Error)]
pub enum StateError {
    #[error("ledger query failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("swap account malformed: {0}")]
    Decode(#[from] AccountError),
}

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tee_swap_domain::DomainVerification;

    #[test]
    fn test_every_error_names_a_phase() {
        let submission = OrchestratorError::Phase {
            phase: Phase::Finalize,
            source: SubmissionError::MissingChannel {
                phase: Phase::Finalize,
            },
        };
        assert_eq!(submission.phase(), Phase::Finalize);
        assert_eq!(submission.kind(), "missing_channel");

        let untrusted = OrchestratorError::Domain {
            source: ConnectionError::DomainUntrusted {
                endpoint: "https://tee.example".to_string(),
                verification: DomainVerification::Rejected { status: 503 },
            },
        };
        assert_eq!(untrusted.phase(), Phase::Execute);
        assert_eq!(untrusted.kind(), "domain_untrusted");

        let invalid = OrchestratorError::from(RequestError::ZeroAmount);
        assert_eq!(invalid.phase(), Phase::Init);
        assert!(invalid.submission().is_none());
    }
}
