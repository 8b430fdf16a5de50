//! Four-phase swap saga across the public ledger and the isolated domain

pub mod error;
pub mod orchestrator;
pub mod recovery;


pub use error::{BuilderError, OrchestratorError, StateError};
pub use orchestrator::{
    DegradedMode, DelegationPolicy, OrchestratorConfig, RunOutcome, SwapOrchestrator,
    SwapOrchestratorBuilder,
};
pub use recovery::{assess, RecoveryAction};
