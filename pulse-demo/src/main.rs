//! Demo binary running the event pipeline for a fixed duration.
//!
//! Loads configuration, initializes tracing and metrics, bootstraps the configured store and
//! runs the pipeline until the run duration elapses or Ctrl+C is pressed.

use pulse::metrics::describe_metrics;
use pulse_config::shared::DemoConfig;
use pulse_telemetry::metrics::init_metrics;
use pulse_telemetry::tracing::init_tracing;
use tracing::{error, info};

use crate::config::load_demo_config;
use crate::core::start_demo_with_config;
use crate::error::DemoResult;

mod config;
mod core;
mod error;

fn main() -> DemoResult<()> {
    // A configuration error is fatal, no worker is started.
    let demo_config = load_demo_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(demo_config))?;

    Ok(())
}

async fn async_main(demo_config: DemoConfig) -> DemoResult<()> {
    // The exporter spawns its HTTP listener on the runtime.
    if demo_config.metrics.enabled {
        init_metrics(env!("CARGO_BIN_NAME"), demo_config.metrics.port)?;
        describe_metrics();
        info!(port = demo_config.metrics.port, "metrics exporter listening");
    }

    if let Err(err) = start_demo_with_config(demo_config).await {
        error!(error = %err, "demo failed");
        return Err(err);
    }

    info!("demo complete");

    Ok(())
}
