use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SwapStatus;

/// One ordered step of the swap saga
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Create the swap account on the ledger
    Init,

    /// Hand the swap account to the isolated domain's validator
    Delegate,

    /// Run the swap inside the isolated domain
    Execute,

    /// Commit the result back to the ledger
    Finalize,
}

/// Execution domain a phase is submitted to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Ledger,
    Isolated,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Init, Phase::Delegate, Phase::Execute, Phase::Finalize];

    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Init => Some(Phase::Delegate),
            Phase::Delegate => Some(Phase::Execute),
            Phase::Execute => Some(Phase::Finalize),
            Phase::Finalize => None,
        }
    }

    /// Status a record reaches once this phase is confirmed
    pub fn status_on_success(&self) -> SwapStatus {
        match self {
            Phase::Init => SwapStatus::Pending,
            Phase::Delegate => SwapStatus::Delegated,
            Phase::Execute => SwapStatus::Executed,
            Phase::Finalize => SwapStatus::Finalized,
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Phase::Execute => Domain::Isolated,
            Phase::Init | Phase::Delegate | Phase::Finalize => Domain::Ledger,
        }
    }

    /// Instruction name in the on-ledger program
    pub fn instruction_name(&self) -> &'static str {
        match self {
            Phase::Init => "initialize_swap",
            Phase::Delegate => "delegate_swap",
            Phase::Execute => "execute_swap",
            Phase::Finalize => "finalize_swap",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Delegate => "delegate",
            Phase::Execute => "execute",
            Phase::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
