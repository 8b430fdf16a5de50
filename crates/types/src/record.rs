use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use thiserror::Error;

use crate::{Phase, Quote, SwapRequest, TxOutcome};

/// Lifecycle status of a swap record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Pending,
    Delegated,
    Executed,
    Finalized,
    Failed,
}

impl SwapStatus {
    fn rank(&self) -> Option<u8> {
        match self {
            SwapStatus::Pending => Some(0),
            SwapStatus::Delegated => Some(1),
            SwapStatus::Executed => Some(2),
            SwapStatus::Finalized => Some(3),
            SwapStatus::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapStatus::Finalized | SwapStatus::Failed)
    }

    /// Forward by exactly one stage, or to `Failed` from any non-terminal status
    pub fn can_transition_to(&self, next: SwapStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to == from + 1,
            (None, Some(_)) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Delegated => "delegated",
            SwapStatus::Executed => "executed",
            SwapStatus::Finalized => "finalized",
            SwapStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is terminal ({status}), no further mutation allowed")]
    Terminal { status: SwapStatus },

    #[error("phase {phase} out of order: expected {expected:?}")]
    OutOfOrder {
        phase: Phase,
        expected: Option<Phase>,
    },

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: SwapStatus, to: SwapStatus },
}

/// Outcome of one completed phase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReceipt {
    pub phase: Phase,
    pub outcome: TxOutcome,
    pub recorded_at: DateTime<Utc>,
}

/// Durable state of one swap attempt.
///
/// A record exists once the Init phase has produced an outcome. Only
/// [`SwapRecord::advance`] and [`SwapRecord::fail`] mutate it, and both refuse
/// to touch a record that reached `Finalized` or `Failed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwapRecord {
    pub owner: Pubkey,
    pub swap_address: Pubkey,
    pub bump: u8,
    pub amount_in: u64,
    pub minimum_amount_out: u64,
    pub status: SwapStatus,
    pub receipts: Vec<PhaseReceipt>,
    pub failed_phase: Option<Phase>,
    pub quote: Option<Quote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRecord {
    /// Create the record from the Init phase outcome
    pub fn initialized(
        request: &SwapRequest,
        swap_address: Pubkey,
        bump: u8,
        init_outcome: TxOutcome,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            owner: request.requester,
            swap_address,
            bump,
            amount_in: request.amount_in,
            minimum_amount_out: request.minimum_amount_out,
            status: SwapStatus::Pending,
            receipts: vec![PhaseReceipt {
                phase: Phase::Init,
                outcome: init_outcome,
                recorded_at: now,
            }],
            failed_phase: None,
            quote: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn highest_completed_phase(&self) -> Option<Phase> {
        self.receipts.last().map(|r| r.phase)
    }

    /// Phase that should run next, `None` once finalized or failed
    pub fn next_phase(&self) -> Option<Phase> {
        if self.status.is_terminal() {
            return None;
        }
        self.highest_completed_phase()
            .map_or(Some(Phase::Init), |phase| phase.next())
    }

    /// Record a completed phase and move status forward
    pub fn advance(
        &mut self,
        phase: Phase,
        outcome: TxOutcome,
        now: DateTime<Utc>,
    ) -> Result<(), RecordError> {
        if self.status.is_terminal() {
            return Err(RecordError::Terminal {
                status: self.status,
            });
        }
        let expected = self.next_phase();
        if expected != Some(phase) {
            return Err(RecordError::OutOfOrder { phase, expected });
        }
        let next_status = phase.status_on_success();
        if !self.status.can_transition_to(next_status) {
            return Err(RecordError::InvalidTransition {
                from: self.status,
                to: next_status,
            });
        }

        self.status = next_status;
        self.receipts.push(PhaseReceipt {
            phase,
            outcome,
            recorded_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Mark the record failed at `phase`
    pub fn fail(&mut self, phase: Phase, now: DateTime<Utc>) -> Result<(), RecordError> {
        if !self.status.can_transition_to(SwapStatus::Failed) {
            return Err(RecordError::Terminal {
                status: self.status,
            });
        }
        self.status = SwapStatus::Failed;
        self.failed_phase = Some(phase);
        self.updated_at = now;
        Ok(())
    }

    pub fn receipt(&self, phase: Phase) -> Option<&PhaseReceipt> {
        self.receipts.iter().find(|r| r.phase == phase)
    }

    pub fn phase_id(&self, phase: Phase) -> Option<String> {
        self.receipt(phase).map(|r| r.outcome.id())
    }

    /// True only when every recorded phase is ledger-confirmed
    pub fn is_ledger_confirmed(&self) -> bool {
        self.receipts.iter().all(|r| r.outcome.is_confirmed())
    }

    pub fn has_simulated_phase(&self) -> bool {
        self.receipts.iter().any(|r| r.outcome.is_simulated())
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.receipt(Phase::Execute).map(|r| r.recorded_at)
    }
}
