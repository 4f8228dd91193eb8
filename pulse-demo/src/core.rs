use pulse::codec::JsonEventCodec;
use pulse::counters::CountersSnapshot;
use pulse::dashboard::sink::TerminalSink;
use pulse::pipeline::Pipeline;
use pulse::store::base::EventStore;
use pulse::store::memory::MemoryEventStore;
use pulse::store::postgres::PostgresEventStore;
use pulse_config::shared::{DashboardConfig, DemoConfig, PipelineConfig, StoreConfig};
use pulse_postgres::db::connect_to_events_database;
use pulse_postgres::schema::bootstrap_events_table;
use tracing::{info, warn};

use crate::error::{DemoError, DemoResult};

/// Builds the configured store and runs the pipeline on it.
pub async fn start_demo_with_config(config: DemoConfig) -> DemoResult<()> {
    let DemoConfig {
        store,
        pipeline,
        dashboard,
        ..
    } = config;

    // We build each store separately to keep static dispatch in the pipeline.
    match store {
        StoreConfig::Postgres {
            connection,
            max_connections,
        } => {
            info!("connecting to postgres");
            let pool = connect_to_events_database(&connection, max_connections)
                .await
                .map_err(DemoError::StoreConnection)?;
            bootstrap_events_table(&pool)
                .await
                .map_err(DemoError::Bootstrap)?;

            let result =
                run_pipeline(pipeline, dashboard, PostgresEventStore::new(pool.clone())).await;
            pool.close().await;

            result
        }
        StoreConfig::Memory => {
            info!("using in-memory store, events are lost on exit");
            let store = MemoryEventStore::new();

            run_pipeline(pipeline, dashboard, store.clone()).await?;
            info!(
                unprocessed = store.unprocessed_count().await,
                "in-memory store drained"
            );

            Ok(())
        }
    }
}

/// Runs the pipeline until the run duration elapses or Ctrl+C is received, then joins it.
async fn run_pipeline<S>(
    pipeline_config: PipelineConfig,
    dashboard_config: DashboardConfig,
    store: S,
) -> DemoResult<()>
where
    S: EventStore + Clone + Send + Sync + 'static,
{
    let run_duration = pipeline_config.run_duration();
    let mut pipeline = Pipeline::new(
        pipeline_config,
        dashboard_config,
        store,
        JsonEventCodec,
        TerminalSink,
    );
    let counters = pipeline.counters();

    pipeline.start()?;
    info!(
        run_duration_secs = run_duration.as_secs(),
        "pipeline running, press ctrl+c to stop early"
    );

    tokio::select! {
        _ = tokio::time::sleep(run_duration) => {
            info!("run duration elapsed, shutting down pipeline");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                warn!(error = %err, "failed to listen for ctrl+c, shutting down pipeline");
            } else {
                info!("sigint (ctrl+c) received, shutting down pipeline");
            }
        }
    }

    pipeline.shutdown_and_wait().await?;
    log_totals(&counters.snapshot());

    Ok(())
}

fn log_totals(snapshot: &CountersSnapshot) {
    info!(
        events_handled = snapshot.events_handled,
        writes = snapshot.writes,
        reads = snapshot.reads,
        updates = snapshot.updates,
        processing_time_ms = snapshot.processing_time.as_millis() as u64,
        elapsed_secs = snapshot.elapsed.as_secs_f64(),
        "pipeline completed"
    );
}
