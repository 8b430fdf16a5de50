use solana_sdk::signature::Signature;
use tee_swap_ledger::LedgerError;
use tee_swap_quote::QuoteError;
use tee_swap_types::Phase;
use thiserror::Error;

/// Why a phase could not be submitted; every variant names its phase
#[derive(Debug, Clone, Error)]
pub enum SubmissionError {
    #[error("{phase}: submission failed after {attempts} attempts: {last_error}")]
    SubmissionFailed {
        phase: Phase,
        attempts: u32,
        last_error: LedgerError,
    },

    #[error("{phase}: confirmation timed out for {signature}")]
    ConfirmationTimeout { phase: Phase, signature: Signature },

    #[error("{phase}: transaction rejected: {reason}")]
    TransactionRejected { phase: Phase, reason: String },

    #[error("{phase}: no route found")]
    NoRouteFound { phase: Phase },

    #[error("{phase}: quote failed: {source}")]
    Quote { phase: Phase, source: QuoteError },

    #[error("{phase}: quote is {age_secs}s old, limit is {max_secs}s")]
    QuoteStale {
        phase: Phase,
        age_secs: i64,
        max_secs: i64,
    },

    #[error("{phase}: quoted output {quoted} is below minimum {minimum}")]
    QuoteBelowMinimum {
        phase: Phase,
        quoted: u64,
        minimum: u64,
    },

    #[error("{phase}: could not build transaction: {reason}")]
    Build { phase: Phase, reason: String },

    #[error("{phase}: no domain channel available")]
    MissingChannel { phase: Phase },
}

impl SubmissionError {
    pub fn phase(&self) -> Phase {
        match self {
            SubmissionError::SubmissionFailed { phase, .. }
            | SubmissionError::ConfirmationTimeout { phase, .. }
            | SubmissionError::TransactionRejected { phase, .. }
            | SubmissionError::NoRouteFound { phase }
            | SubmissionError::Quote { phase, .. }
            | SubmissionError::QuoteStale { phase, .. }
            | SubmissionError::QuoteBelowMinimum { phase, .. }
            | SubmissionError::Build { phase, .. }
            | SubmissionError::MissingChannel { phase } => *phase,
        }
    }

    /// Short classification for metrics labels and recovery decisions
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionError::SubmissionFailed { last_error, .. } if last_error.is_unavailable() => {
                "unavailable"
            }
            SubmissionError::SubmissionFailed { .. } => "send_failed",
            SubmissionError::ConfirmationTimeout { .. } => "confirmation_timeout",
            SubmissionError::TransactionRejected { .. } => "rejected",
            SubmissionError::NoRouteFound { .. } => "no_route",
            SubmissionError::Quote { .. } => "quote",
            SubmissionError::QuoteStale { .. } => "quote_stale",
            SubmissionError::QuoteBelowMinimum { .. } => "quote_below_minimum",
            SubmissionError::Build { .. } => "build",
            SubmissionError::MissingChannel { .. } => "missing_channel",
        }
    }

    /// Signature that may or may not have landed
    pub fn pending_signature(&self) -> Option<&Signature> {
        match self {
            SubmissionError::ConfirmationTimeout { signature, .. } => Some(signature),
            _ => None,
        }
    }

    /// True when nothing reached the ledger for this phase
    pub fn nothing_sent(&self) -> bool {
        !matches!(
            self,
            SubmissionError::ConfirmationTimeout { .. }
                | SubmissionError::TransactionRejected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_always_named() {
        let err = SubmissionError::QuoteBelowMinimum {
            phase: Phase::Execute,
            quoted: 10,
            minimum: 20,
        };
        assert_eq!(err.phase(), Phase::Execute);
        assert!(err.to_string().starts_with("execute:"));
    }

    #[test]
    fn test_kind_separates_unavailable() {
        let down = SubmissionError::SubmissionFailed {
            phase: Phase::Init,
            attempts: 3,
            last_error: LedgerError::Unavailable("refused".into()),
        };
        let refused = SubmissionError::SubmissionFailed {
            phase: Phase::Init,
            attempts: 3,
            last_error: LedgerError::Rejected("bad blockhash".into()),
        };
        assert_eq!(down.kind(), "unavailable");
        assert_eq!(refused.kind(), "send_failed");
    }

    #[test]
    fn test_pending_signature_only_on_timeout() {
        let signature = Signature::new_unique();
        let timeout = SubmissionError::ConfirmationTimeout {
            phase: Phase::Finalize,
            signature,
        };
        assert_eq!(timeout.pending_signature(), Some(&signature));
        assert!(!timeout.nothing_sent());

        let missing = SubmissionError::MissingChannel {
            phase: Phase::Execute,
        };
        assert_eq!(missing.pending_signature(), None);
        assert!(missing.nothing_sent());
    }
}
