use serde::Serialize;
use std::fmt;

use crate::RiskAssessment;

const MAX_RISK_SCORE: f64 = 70.0;
const MAX_MIXER_EXPOSURE: f64 = 50.0;
const MAX_SCAM_EXPOSURE: f64 = 30.0;

/// Screening rules, in the order they are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRule {
    Sanctioned,
    RiskScore,
    MixerExposure,
    ScamExposure,
}

impl ComplianceRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceRule::Sanctioned => "sanctioned",
            ComplianceRule::RiskScore => "risk_score",
            ComplianceRule::MixerExposure => "mixer_exposure",
            ComplianceRule::ScamExposure => "scam_exposure",
        }
    }
}

/// Allow or deny, with the first rule violated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceDecision {
    pub allowed: bool,
    pub reason: String,
    pub violated: Option<ComplianceRule>,
}

impl ComplianceDecision {
    fn deny(rule: ComplianceRule, reason: String) -> Self {
        Self {
            allowed: false,
            reason,
            violated: Some(rule),
        }
    }
}

/// Apply the screening rules; the first violation decides
pub fn evaluate(assessment: &RiskAssessment) -> ComplianceDecision {
    if assessment.is_sanctioned {
        return ComplianceDecision::deny(
            ComplianceRule::Sanctioned,
            "Wallet is on sanctions list (OFAC)".to_string(),
        );
    }
    if assessment.risk_score > MAX_RISK_SCORE {
        return ComplianceDecision::deny(
            ComplianceRule::RiskScore,
            format!("High risk score: {}/100", assessment.risk_score),
        );
    }
    if assessment.exposure.mixers > MAX_MIXER_EXPOSURE {
        return ComplianceDecision::deny(
            ComplianceRule::MixerExposure,
            "Significant mixer exposure detected".to_string(),
        );
    }
    if assessment.exposure.scams > MAX_SCAM_EXPOSURE {
        return ComplianceDecision::deny(
            ComplianceRule::ScamExposure,
            "High scam exposure detected".to_string(),
        );
    }

    ComplianceDecision {
        allowed: true,
        reason: "Compliance checks passed".to_string(),
        violated: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(label)
    }
}

pub fn risk_level(score: f64) -> RiskLevel {
    if score < 30.0 {
        RiskLevel::Low
    } else if score < 50.0 {
        RiskLevel::Medium
    } else if score < 70.0 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}
