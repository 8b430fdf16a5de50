use std::time::Duration;

use prometheus::{Encoder, TextEncoder};
use tee_swap_types::Phase;

use crate::metrics::*;

/// Metrics collector for the private swap saga
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RUN METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_run_started(&self) {
        ACTIVE_RUNS.inc();
    }

    /// Record a run reaching a terminal status
    pub fn record_run_finished(&self, outcome: RunOutcomeLabel, duration: Duration) {
        RUNS_TOTAL.with_label_values(&[outcome.as_str()]).inc();
        ACTIVE_RUNS.dec();
        RUN_DURATION.observe(duration.as_millis() as f64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PHASE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_phase(&self, phase: Phase, outcome: PhaseOutcome, duration: Duration) {
        PHASE_TOTAL
            .with_label_values(&[phase.as_str(), outcome.as_str()])
            .inc();
        PHASE_DURATION
            .with_label_values(&[phase.as_str()])
            .observe(duration.as_millis() as f64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBMISSION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_submission_attempt(&self, phase: Phase) {
        SUBMISSION_ATTEMPTS.with_label_values(&[phase.as_str()]).inc();
    }

    pub fn record_submission_failure(&self, phase: Phase, kind: &str) {
        SUBMISSION_FAILURES
            .with_label_values(&[phase.as_str(), kind])
            .inc();
    }

    pub fn record_confirmation(&self, latency: Duration) {
        CONFIRMATION_LATENCY.observe(latency.as_millis() as f64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DOMAIN METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_domain_verification(&self, result: &str) {
        DOMAIN_VERIFICATIONS.with_label_values(&[result]).inc();
    }

    pub fn record_delegation_poll(&self) {
        DELEGATION_POLLS.inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUOTE AND COMPLIANCE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_quote(&self, outcome: &str) {
        QUOTE_REQUESTS.with_label_values(&[outcome]).inc();
    }

    pub fn record_compliance_check(&self, decision: &str) {
        COMPLIANCE_CHECKS.with_label_values(&[decision]).inc();
    }

    pub fn record_error_event(&self, kind: &str) {
        ERROR_EVENTS.with_label_values(&[kind]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Export metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome label for a single phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Confirmed,
    Simulated,
    Failed,
}

impl PhaseOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseOutcome::Confirmed => "confirmed",
            PhaseOutcome::Simulated => "simulated",
            PhaseOutcome::Failed => "failed",
        }
    }
}

/// Outcome label for a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcomeLabel {
    Finalized,
    /// Finalized with at least one simulated phase
    Degraded,
    Failed,
}

impl RunOutcomeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcomeLabel::Finalized => "finalized",
            RunOutcomeLabel::Degraded => "degraded",
            RunOutcomeLabel::Failed => "failed",
        }
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        assert!(collector.export_metrics().is_ok());
    }

    #[test]
    fn test_record_run_metrics() {
        let collector = MetricsCollector::new();

        collector.record_run_started();
        collector.record_run_finished(RunOutcomeLabel::Finalized, Duration::from_secs(4));

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("tee_swap_runs_total"));
        assert!(metrics.contains("tee_swap_active_runs"));
        assert!(metrics.contains("tee_swap_run_duration_ms"));
    }

    #[test]
    fn test_phase_tracking() {
        let collector = MetricsCollector::new();

        collector.record_phase(
            Phase::Delegate,
            PhaseOutcome::Confirmed,
            Duration::from_millis(800),
        );
        collector.record_phase(
            Phase::Execute,
            PhaseOutcome::Simulated,
            Duration::from_millis(20),
        );

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("tee_swap_phase_duration_ms"));
        assert!(metrics.contains("phase=\"delegate\""));
        assert!(metrics.contains("outcome=\"simulated\""));
    }

    #[test]
    fn test_record_submission_metrics() {
        let collector = MetricsCollector::new();

        collector.record_submission_attempt(Phase::Init);
        collector.record_submission_failure(Phase::Init, "unavailable");
        collector.record_confirmation(Duration::from_millis(1200));

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("tee_swap_submission_attempts_total"));
        assert!(metrics.contains("kind=\"unavailable\""));
        assert!(metrics.contains("tee_swap_confirmation_latency_ms"));
    }

    #[test]
    fn test_record_collaborator_metrics() {
        let collector = MetricsCollector::new();

        collector.record_domain_verification("verified");
        collector.record_delegation_poll();
        collector.record_quote("accepted");
        collector.record_compliance_check("denied");

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("tee_swap_domain_verifications_total"));
        assert!(metrics.contains("tee_swap_delegation_polls_total"));
        assert!(metrics.contains("tee_swap_quote_requests_total"));
        assert!(metrics.contains("tee_swap_compliance_checks_total"));
    }
}
