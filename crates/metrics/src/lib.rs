//! Metrics and monitoring for the private swap saga
//!
//! Prometheus counters for runs, phases and submissions, plus tracing
//! initialization with a layer that counts error events by kind.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tee_swap_metrics::{init_tracing_with_metrics, MetricsCollector, TracingConfig};
//!
//! let collector = Arc::new(MetricsCollector::new());
//! init_tracing_with_metrics(collector.clone(), &TracingConfig::default()).unwrap();
//!
//! collector.record_run_started();
//! println!("{}", collector.export_metrics().unwrap());
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError, PhaseOutcome, RunOutcomeLabel};
pub use self::tracing::{
    init_tracing_with_metrics, CorrelationId, ErrorContext, MetricsLayer, RunSpan, TracingConfig,
    TracingError,
};
