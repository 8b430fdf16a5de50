use serde::{Deserialize, Serialize};
use solana_sdk::signature::Signature;
use std::fmt;
use uuid::Uuid;

use crate::Phase;

/// Locally generated stand-in for a transaction id, produced only in degraded mode
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulatedTxId {
    pub phase: Phase,
    pub nonce: Uuid,
}

impl SimulatedTxId {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            nonce: Uuid::new_v4(),
        }
    }
}

impl fmt::Display for SimulatedTxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulated:{}:{}", self.phase, self.nonce)
    }
}

/// Successful outcome of one phase submission.
///
/// Only [`TxOutcome::Confirmed`] carries a ledger signature; there is no way to
/// obtain a [`Signature`] from a simulated outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TxOutcome {
    /// Landed and confirmed by the target domain
    Confirmed(Signature),

    /// Synthetic id; the submission path was unavailable
    Simulated(SimulatedTxId),
}

impl TxOutcome {
    pub fn confirmed(&self) -> Option<&Signature> {
        match self {
            TxOutcome::Confirmed(signature) => Some(signature),
            TxOutcome::Simulated(_) => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, TxOutcome::Confirmed(_))
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, TxOutcome::Simulated(_))
    }

    /// Display id, prefixed for simulated outcomes
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TxOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxOutcome::Confirmed(signature) => write!(f, "{signature}"),
            TxOutcome::Simulated(id) => write!(f, "{id}"),
        }
    }
}
