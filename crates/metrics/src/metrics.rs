use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // RUN METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Runs by terminal outcome
    pub static ref RUNS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tee_swap_runs_total",
        "Total swap runs by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Runs currently in flight
    pub static ref ACTIVE_RUNS: IntGauge = register_int_gauge!(
        "tee_swap_active_runs",
        "Current number of swap runs in flight"
    )
    .unwrap();

    /// End-to-end run duration (in milliseconds)
    pub static ref RUN_DURATION: Histogram = register_histogram!(
        "tee_swap_run_duration_ms",
        "Swap run duration in milliseconds",
        vec![500.0, 1000.0, 5000.0, 10000.0, 30000.0, 60000.0, 120000.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // PHASE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Phase completions by phase and outcome (confirmed, simulated, failed)
    pub static ref PHASE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tee_swap_phase_total",
        "Total phase submissions by phase and outcome",
        &["phase", "outcome"]
    )
    .unwrap();

    /// Phase duration by phase (in milliseconds)
    pub static ref PHASE_DURATION: HistogramVec = register_histogram_vec!(
        "tee_swap_phase_duration_ms",
        "Phase duration in milliseconds",
        &["phase"],
        vec![100.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 30000.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBMISSION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Individual send attempts by phase
    pub static ref SUBMISSION_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "tee_swap_submission_attempts_total",
        "Total send attempts by phase",
        &["phase"]
    )
    .unwrap();

    /// Failed submissions by phase and error kind
    pub static ref SUBMISSION_FAILURES: IntCounterVec = register_int_counter_vec!(
        "tee_swap_submission_failures_total",
        "Total failed submissions by phase and kind",
        &["phase", "kind"]
    )
    .unwrap();

    /// Confirmation latency after a successful send (in milliseconds)
    pub static ref CONFIRMATION_LATENCY: Histogram = register_histogram!(
        "tee_swap_confirmation_latency_ms",
        "Time from send to confirmation in milliseconds",
        vec![100.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 30000.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // DOMAIN METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Domain verifications by result (verified, unreachable, rejected)
    pub static ref DOMAIN_VERIFICATIONS: IntCounterVec = register_int_counter_vec!(
        "tee_swap_domain_verifications_total",
        "Total isolated domain verifications by result",
        &["result"]
    )
    .unwrap();

    /// Owner polls spent waiting for delegation
    pub static ref DELEGATION_POLLS: IntCounter = register_int_counter!(
        "tee_swap_delegation_polls_total",
        "Total account owner polls while awaiting delegation"
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // QUOTE AND COMPLIANCE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Quote requests by outcome (accepted, stale, below_minimum, no_route, error)
    pub static ref QUOTE_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "tee_swap_quote_requests_total",
        "Total route quote requests by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Compliance checks by decision (allowed, denied, error)
    pub static ref COMPLIANCE_CHECKS: IntCounterVec = register_int_counter_vec!(
        "tee_swap_compliance_checks_total",
        "Total compliance checks by decision",
        &["decision"]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // SYSTEM METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Error-level log events by kind
    pub static ref ERROR_EVENTS: IntCounterVec = register_int_counter_vec!(
        "tee_swap_error_events_total",
        "Total error events by kind",
        &["kind"]
    )
    .unwrap();
}
