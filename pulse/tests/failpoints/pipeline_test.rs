use std::time::Duration;

use fail::FailScenario;
use pulse::codec::JsonEventCodec;
use pulse::failpoints::{PERSISTER_BEFORE_INSERT, PROCESSOR_BEFORE_MARK};
use pulse::pipeline::Pipeline;
use pulse::store::memory::MemoryEventStore;
use pulse::test_utils::sink::MemorySink;
use pulse_config::shared::{DashboardConfig, PipelineConfig};
use pulse_telemetry::tracing::init_test_tracing;

fn create_pipeline(
    store: MemoryEventStore,
) -> Pipeline<MemoryEventStore, JsonEventCodec, MemorySink> {
    let pipeline_config = PipelineConfig {
        seed: Some(7),
        ..PipelineConfig::default()
    };
    let dashboard_config = DashboardConfig {
        enabled: false,
        ..DashboardConfig::default()
    };

    Pipeline::new(
        pipeline_config,
        dashboard_config,
        store,
        JsonEventCodec,
        MemorySink::new(),
    )
}

#[tokio::test(start_paused = true)]
async fn failing_inserts_drop_events_without_stopping_the_pipeline() {
    init_test_tracing();
    let scenario = FailScenario::setup();
    fail::cfg(PERSISTER_BEFORE_INSERT, "return").unwrap();

    let store = MemoryEventStore::new();
    let mut pipeline = create_pipeline(store.clone());
    let counters = pipeline.counters();

    pipeline.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    pipeline.shutdown_and_wait().await.unwrap();

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.events_handled, 10);
    assert_eq!(snapshot.writes, 0);
    assert!(store.rows().await.is_empty());

    scenario.teardown();
}

#[tokio::test(start_paused = true)]
async fn failing_marks_leave_claimed_events_unprocessed() {
    init_test_tracing();
    let scenario = FailScenario::setup();
    fail::cfg(PROCESSOR_BEFORE_MARK, "return").unwrap();

    let store = MemoryEventStore::new();
    let mut pipeline = create_pipeline(store.clone());
    let counters = pipeline.counters();

    pipeline.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    pipeline.shutdown_and_wait().await.unwrap();

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.writes, 10);
    assert_eq!(snapshot.reads, 5);
    assert_eq!(snapshot.updates, 0);
    assert_eq!(store.unprocessed_count().await, 10);
    assert!(store.marks().await.is_empty());

    scenario.teardown();
}

#[tokio::test(start_paused = true)]
async fn marks_resume_once_the_failure_clears() {
    init_test_tracing();
    let scenario = FailScenario::setup();
    // The first two marks fail, later ones go through.
    fail::cfg(PROCESSOR_BEFORE_MARK, "2*return->off").unwrap();

    let store = MemoryEventStore::new();
    let mut pipeline = create_pipeline(store.clone());
    let counters = pipeline.counters();

    pipeline.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    pipeline.shutdown_and_wait().await.unwrap();

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.updates, 3);
    assert_eq!(store.marks().await.len(), 3);

    scenario.teardown();
}
