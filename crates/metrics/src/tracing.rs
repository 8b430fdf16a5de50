use std::sync::Arc;
use tee_swap_types::Phase;
use tracing::{field::Visit, Event, Level, Subscriber};
use tracing_subscriber::{
    fmt,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::collector::MetricsCollector;

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl TracingConfig {
    /// Filter directive for a plain log level such as `debug`
    pub fn with_level(level: &str) -> Self {
        Self {
            default_filter: format!("{level},tee_swap=debug"),
            ..Self::default()
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info,tee_swap=debug".to_string(),
            json: true,
        }
    }
}

/// Initialize tracing with metrics integration
pub fn init_tracing_with_metrics(
    collector: Arc<MetricsCollector>,
    config: &TracingConfig,
) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let json_layer = config.json.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .json()
    });
    let text_layer = (!config.json).then(|| fmt::layer().with_target(true).with_level(true));

    let metrics_layer = MetricsLayer::new(collector);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(metrics_layer)
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Tracing layer that counts error events by their `error_kind` field
pub struct MetricsLayer {
    collector: Arc<MetricsCollector>,
}

impl MetricsLayer {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }
}

impl<S> Layer<S> for MetricsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = ErrorKindVisitor::default();
        event.record(&mut visitor);
        let kind = visitor.error_kind.as_deref().unwrap_or("unclassified");
        self.collector.record_error_event(kind);
    }
}

/// Visitor to extract the error kind from events
#[derive(Default)]
struct ErrorKindVisitor {
    error_kind: Option<String>,
}

impl Visit for ErrorKindVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "error_kind" {
            self.error_kind = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "error_kind" {
            self.error_kind = Some(value.to_string());
        }
    }
}

/// Correlation ID tying together every log line of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    /// Generate a new correlation ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the correlation ID as a string
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span context for one swap run
#[derive(Debug, Clone)]
pub struct RunSpan {
    pub correlation_id: CorrelationId,
    pub owner: String,
    pub swap_address: String,
}

impl RunSpan {
    pub fn new(owner: impl ToString, swap_address: impl ToString) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            owner: owner.to_string(),
            swap_address: swap_address.to_string(),
        }
    }

    /// Span to instrument the run future with
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "swap_run",
            correlation_id = %self.correlation_id,
            owner = %self.owner,
            swap_address = %self.swap_address,
        )
    }
}

/// Error enrichment for adding context to errors
pub trait ErrorContext<E> {
    /// Log the error against a phase as the single error-level event of the
    /// failure, labelled with `kind(&error)`
    fn with_phase<K>(self, phase: Phase, kind: K) -> Self
    where
        K: FnOnce(&E) -> &'static str;
}

impl<T, E> ErrorContext<E> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_phase<K>(self, phase: Phase, kind: K) -> Self
    where
        K: FnOnce(&E) -> &'static str,
    {
        self.map_err(|e| {
            tracing::error!(
                phase = %phase,
                error_kind = kind(&e),
                error = %e,
                "phase failed"
            );
            e
        })
    }
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
}
