use pulse::error::PulseError;
use pulse_config::LoadConfigError;
use pulse_config::shared::ValidationError;
use pulse_telemetry::tracing::TracingError;
use thiserror::Error;

/// Result type of the demo binary.
pub type DemoResult<T> = Result<T, DemoError>;

/// Errors that stop the demo.
///
/// Everything except [`DemoError::Pipeline`] happens before any worker is started.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] LoadConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to initialize tracing: {0}")]
    Tracing(#[from] TracingError),

    #[error("failed to initialize metrics: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to connect to the events database: {0}")]
    StoreConnection(#[source] sqlx::Error),

    #[error("failed to bootstrap the events table: {0}")]
    Bootstrap(#[source] sqlx::Error),

    #[error("failed to build the async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("pipeline failed: {0}")]
    Pipeline(#[from] PulseError),
}
