//! Tracing subscriber setup.
//!
//! The dashboard owns standard output, so logs never go there. In development they are
//! written to a daily rolling file under `logs/`, in production they are emitted as JSON on
//! standard error.

use std::io;
use std::sync::Once;

use pulse_config::{Environment, UnknownEnvironment};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Directory receiving development log files.
const LOG_DIRECTORY: &str = "logs";

/// Env variable which enables log output in tests.
const ENABLE_TEST_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[source] UnknownEnvironment),

    #[error("failed to install the global tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Flushes buffered log lines when dropped.
///
/// Keep it alive until the process exits, otherwise the tail of the log is lost.
#[must_use = "dropping the flusher stops log output"]
pub struct LogFlusher {
    _guard: WorkerGuard,
}

/// Installs the global subscriber for `app_name`.
///
/// The filter comes from `RUST_LOG` and defaults to `info` for the pulse crates.
pub fn init_tracing(app_name: &str) -> Result<LogFlusher, TracingError> {
    let environment = Environment::load().map_err(TracingError::Environment)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info,pulse=info", crate_target(app_name))));

    let guard = match environment {
        Environment::Dev => {
            let appender = tracing_appender::rolling::daily(LOG_DIRECTORY, format!("{app_name}.log"));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init()?;
            guard
        }
        Environment::Prod => {
            let (writer, guard) = tracing_appender::non_blocking(io::stderr());
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_current_span(false).with_writer(writer))
                .try_init()?;
            guard
        }
    };

    Ok(LogFlusher { _guard: guard })
}

/// Installs a test subscriber once per process when `ENABLE_TRACING` is set.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var(ENABLE_TEST_TRACING_ENV_NAME).is_err() {
            return;
        }

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}

/// Binary names use dashes, tracing targets use underscores.
fn crate_target(app_name: &str) -> String {
    app_name.replace('-', "_")
}
