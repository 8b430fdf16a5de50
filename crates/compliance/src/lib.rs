//! Wallet risk screening
//!
//! A caller screens the requester before starting a swap. Denial is a normal
//! result, not an error; errors only mean the screening service could not
//! answer.

mod client;
mod engine;
mod rules;

pub use client::{
    ComplianceError, RangeClient, RiskAssessment, RiskExposure, RiskSource, StaticRiskSource,
    DEFAULT_RANGE_URL,
};
pub use engine::ComplianceEngine;
pub use rules::{evaluate, risk_level, ComplianceDecision, ComplianceRule, RiskLevel};
