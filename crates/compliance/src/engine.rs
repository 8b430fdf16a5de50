use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tee_swap_metrics::MetricsCollector;
use tracing::{info, warn};

use crate::{evaluate, risk_level, ComplianceDecision, ComplianceError, RiskLevel, RiskSource};

/// Screens wallets against the risk rules
pub struct ComplianceEngine {
    source: Arc<dyn RiskSource>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ComplianceEngine {
    pub fn new(source: Arc<dyn RiskSource>) -> Self {
        Self {
            source,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Assess `address` and apply the rules
    pub async fn check(&self, address: &str) -> Result<ComplianceDecision, ComplianceError> {
        let assessment = match self.source.assess(address).await {
            Ok(assessment) => assessment,
            Err(e) => {
                self.record("error");
                return Err(e);
            }
        };

        let decision = evaluate(&assessment);
        info!(
            address = %address,
            allowed = decision.allowed,
            risk_score = assessment.risk_score,
            risk_level = %risk_level(assessment.risk_score),
            reason = %decision.reason,
            "Compliance decision"
        );
        self.record(if decision.allowed { "allowed" } else { "denied" });
        Ok(decision)
    }

    /// Check every address concurrently; a failed check counts as denied
    pub async fn batch_check(&self, addresses: &[String]) -> HashMap<String, bool> {
        let checks = addresses.iter().map(|address| async move {
            let allowed = match self.check(address).await {
                Ok(decision) => decision.allowed,
                Err(e) => {
                    warn!(address = %address, error = %e, "Compliance check failed");
                    false
                }
            };
            (address.clone(), allowed)
        });

        join_all(checks).await.into_iter().collect()
    }

    pub fn risk_level(&self, score: f64) -> RiskLevel {
        risk_level(score)
    }

    fn record(&self, decision: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_compliance_check(decision);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComplianceRule, RiskAssessment, RiskExposure, StaticRiskSource};

    fn assessment(address: &str, risk_score: f64, mixers: f64) -> RiskAssessment {
        RiskAssessment {
            address: address.to_string(),
            risk_score,
            is_sanctioned: false,
            labels: Vec::new(),
            exposure: RiskExposure {
                mixers,
                ..Default::default()
            },
            first_seen: None,
            last_activity: None,
        }
    }

    fn engine() -> ComplianceEngine {
        let source = StaticRiskSource::new()
            .with(assessment("clean", 5.0, 0.0))
            .with(assessment("risky", 75.0, 10.0));
        ComplianceEngine::new(Arc::new(source)).with_metrics(Arc::new(MetricsCollector::new()))
    }

    #[tokio::test]
    async fn test_check_reports_first_violation() {
        let decision = engine().check("risky").await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.violated, Some(ComplianceRule::RiskScore));
    }

    #[tokio::test]
    async fn test_check_propagates_source_error() {
        assert!(engine().check("unknown").await.is_err());
    }

    #[tokio::test]
    async fn test_batch_check_denies_on_error() {
        let addresses = vec![
            "clean".to_string(),
            "risky".to_string(),
            "unknown".to_string(),
        ];
        let results = engine().batch_check(&addresses).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results["clean"], true);
        assert_eq!(results["risky"], false);
        assert_eq!(results["unknown"], false);
    }

    #[test]
    fn test_risk_level_passthrough() {
        assert_eq!(engine().risk_level(55.0), RiskLevel::High);
    }
}
