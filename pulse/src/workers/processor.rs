use std::time::Duration;

use metrics::counter;
use pulse_config::shared::PipelineConfig;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::concurrency::shutdown::ShutdownRx;
use crate::counters::SharedCounters;
use crate::error::PulseResult;
#[cfg(feature = "failpoints")]
use crate::failpoints::{PROCESSOR_BEFORE_MARK, pulse_fail_point};
use crate::metrics::{
    OPERATION_LABEL, PULSE_EVENTS_PROCESSED_TOTAL, PULSE_STORE_ERRORS_TOTAL,
    PULSE_STORE_READS_TOTAL, PULSE_STORE_UPDATES_TOTAL,
};
use crate::store::base::{EventClaim, EventStore};
use crate::workers::base::{Worker, WorkerType};

/// Result of one batch processor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The claim query failed, nothing was counted.
    ClaimFailed,
    /// The claim returned no rows.
    Empty,
    /// The claimed batch was marked, `processed` rows transitioned to processed.
    Marked { claimed: usize, processed: u64 },
    /// The claimed batch could not be marked and stays unprocessed.
    MarkFailed { claimed: usize },
}

/// Worker periodically claiming a batch of stored events and marking it processed.
///
/// Each tick issues one claim and, when rows were claimed, one update for the whole batch.
/// Failures are logged and the batch is left for a later tick.
#[derive(Debug)]
pub struct ProcessorWorker<S> {
    store: S,
    interval: Duration,
    batch_size: usize,
    counters: SharedCounters,
    shutdown_rx: ShutdownRx,
}

impl<S> ProcessorWorker<S>
where
    S: EventStore,
{
    pub fn new(
        store: S,
        config: &PipelineConfig,
        counters: SharedCounters,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            store,
            interval: config.processor_interval(),
            batch_size: config.claim_batch_size,
            counters,
            shutdown_rx,
        }
    }

    /// Claims up to the batch size of unprocessed events and marks them processed.
    ///
    /// A successful claim counts as one read even when it returns no rows. A successful mark
    /// counts as one update. A failed mark drops the claim, which leaves its rows unprocessed
    /// for a later tick.
    pub async fn process_batch(&self) -> BatchOutcome {
        let claim = match self.store.claim_unprocessed(self.batch_size).await {
            Ok(claim) => claim,
            Err(err) => {
                warn!(error = %err, store = S::name(), "failed to claim unprocessed events");
                counter!(PULSE_STORE_ERRORS_TOTAL, OPERATION_LABEL => "claim").increment(1);

                return BatchOutcome::ClaimFailed;
            }
        };
        self.counters.record_read();
        counter!(PULSE_STORE_READS_TOTAL).increment(1);

        let claimed = claim.ids().len();
        if claimed == 0 {
            return BatchOutcome::Empty;
        }

        match self.mark(claim).await {
            Ok(processed) => {
                self.counters.record_update();
                counter!(PULSE_STORE_UPDATES_TOTAL).increment(1);
                counter!(PULSE_EVENTS_PROCESSED_TOTAL).increment(processed);
                debug!(batch_size = claimed, processed, "batch marked as processed");

                BatchOutcome::Marked { claimed, processed }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    store = S::name(),
                    batch_size = claimed,
                    "failed to mark batch as processed"
                );
                counter!(PULSE_STORE_ERRORS_TOTAL, OPERATION_LABEL => "mark").increment(1);

                BatchOutcome::MarkFailed { claimed }
            }
        }
    }

    async fn mark(&self, claim: S::Claim) -> PulseResult<u64> {
        #[cfg(feature = "failpoints")]
        pulse_fail_point(PROCESSOR_BEFORE_MARK)?;

        claim.mark_processed().await
    }
}

impl<S> Worker for ProcessorWorker<S>
where
    S: EventStore + Send + Sync + 'static,
{
    const WORKER_TYPE: WorkerType = WorkerType::Processor;

    async fn run(mut self) {
        info!(
            worker = %Self::WORKER_TYPE,
            interval_ms = self.interval.as_millis() as u64,
            batch_size = self.batch_size,
            "starting batch processor"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for_shutdown() => break,
                _ = ticker.tick() => {}
            }

            // A batch in flight runs to completion, shutdown is observed at the next tick.
            self.process_batch().await;
        }

        info!(worker = %Self::WORKER_TYPE, "batch processor stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::concurrency::shutdown::create_shutdown_channel;
    use crate::error::ErrorKind;
    use crate::store::memory::MemoryEventStore;
    use crate::test_utils::store::FaultyEventStore;
    use crate::types::EventId;

    fn processor<S: EventStore>(store: S, counters: SharedCounters) -> ProcessorWorker<S> {
        let (_, shutdown_rx) = create_shutdown_channel();
        ProcessorWorker::new(store, &PipelineConfig::default(), counters, shutdown_rx)
    }

    #[tokio::test]
    async fn batches_are_clamped_to_the_batch_size() {
        let store = MemoryEventStore::new();
        store.seed_unprocessed(15).await;
        let counters = SharedCounters::new();
        let processor = processor(store.clone(), counters.clone());

        assert_eq!(
            processor.process_batch().await,
            BatchOutcome::Marked {
                claimed: 10,
                processed: 10
            }
        );
        assert_eq!(store.unprocessed_count().await, 5);

        assert_eq!(
            processor.process_batch().await,
            BatchOutcome::Marked {
                claimed: 5,
                processed: 5
            }
        );
        assert_eq!(store.unprocessed_count().await, 0);

        let claims = store.claims().await;
        assert_eq!(claims[0], (1..=10).map(EventId).collect::<Vec<_>>());
        assert_eq!(claims[1], (11..=15).map(EventId).collect::<Vec<_>>());

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.reads, 2);
        assert_eq!(snapshot.updates, 2);
    }

    #[tokio::test]
    async fn empty_claim_counts_a_read_but_no_update() {
        let store = MemoryEventStore::new();
        let counters = SharedCounters::new();
        let processor = processor(store.clone(), counters.clone());

        assert_eq!(processor.process_batch().await, BatchOutcome::Empty);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.reads, 1);
        assert_eq!(snapshot.updates, 0);
        assert!(store.marks().await.is_empty());
    }

    #[tokio::test]
    async fn failed_claim_counts_nothing() {
        let store = FaultyEventStore::wrap(MemoryEventStore::new());
        store.inner().seed_unprocessed(3).await;
        store.fail_claims(true);
        let counters = SharedCounters::new();
        let processor = processor(store.clone(), counters.clone());

        assert_eq!(processor.process_batch().await, BatchOutcome::ClaimFailed);
        assert_eq!(counters.snapshot().reads, 0);
        assert_eq!(store.failed_operations(), 1);
    }

    #[tokio::test]
    async fn failed_mark_leaves_rows_for_the_next_tick() {
        let store = FaultyEventStore::wrap(MemoryEventStore::new());
        store.inner().seed_unprocessed(3).await;
        store.fail_marks(true);
        let counters = SharedCounters::new();
        let processor = processor(store.clone(), counters.clone());

        assert_eq!(
            processor.process_batch().await,
            BatchOutcome::MarkFailed { claimed: 3 }
        );
        assert_eq!(store.inner().unprocessed_count().await, 3);
        assert_eq!(counters.snapshot().updates, 0);

        store.fail_marks(false);
        assert_eq!(
            processor.process_batch().await,
            BatchOutcome::Marked {
                claimed: 3,
                processed: 3
            }
        );
        assert_eq!(counters.snapshot().updates, 1);
    }

    #[tokio::test]
    async fn no_id_is_marked_twice_across_ticks() {
        let store = MemoryEventStore::new();
        store.seed_unprocessed(25).await;
        let processor = processor(store.clone(), SharedCounters::new());

        while processor.process_batch().await != BatchOutcome::Empty {}

        let mut seen = BTreeSet::new();
        for batch in store.marks().await {
            for id in batch {
                assert!(seen.insert(id), "event {id} was marked twice");
            }
        }
        assert_eq!(seen.len(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn processes_one_batch_per_period() {
        let store = MemoryEventStore::new();
        store.seed_unprocessed(100).await;
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let counters = SharedCounters::new();

        let handle = ProcessorWorker::new(
            store.clone(),
            &PipelineConfig::default(),
            counters.clone(),
            shutdown_rx,
        )
        .start();

        tokio::time::sleep(Duration::from_millis(650)).await;
        assert_eq!(counters.snapshot().reads, 3);
        assert_eq!(store.unprocessed_count().await, 70);

        shutdown_tx.shutdown().unwrap();
        handle.wait().await.unwrap();

        let err = shutdown_tx.shutdown().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_in_flight_completes_after_shutdown() {
        let store = FaultyEventStore::wrap(MemoryEventStore::new());
        store.inner().seed_unprocessed(15).await;
        store.delay_marks(Duration::from_millis(50));
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let counters = SharedCounters::new();

        let handle = ProcessorWorker::new(
            store.clone(),
            &PipelineConfig::default(),
            counters.clone(),
            shutdown_rx,
        )
        .start();

        // The first tick fires at 200ms and its mark is still sleeping at 220ms.
        tokio::time::sleep(Duration::from_millis(220)).await;
        shutdown_tx.shutdown().unwrap();
        handle.wait().await.unwrap();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.reads, 1);
        assert_eq!(snapshot.updates, 1);
        assert_eq!(store.inner().marks().await.len(), 1);
        assert_eq!(store.inner().unprocessed_count().await, 5);
        assert_eq!(store.inner().held_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_processors_claim_and_mark_each_row_once() {
        let store = FaultyEventStore::wrap(MemoryEventStore::new());
        store.inner().seed_unprocessed(100).await;
        // Keeps claims open long enough for the two processors to overlap.
        store.delay_marks(Duration::from_millis(10));
        let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
        let counters = SharedCounters::new();

        let config = PipelineConfig {
            processor_interval_ms: 5,
            claim_batch_size: 7,
            ..PipelineConfig::default()
        };
        let handles: Vec<_> = (0..2)
            .map(|_| {
                ProcessorWorker::new(
                    store.clone(),
                    &config,
                    counters.clone(),
                    shutdown_rx.clone(),
                )
                .start()
            })
            .collect();

        tokio::time::timeout(Duration::from_secs(10), async {
            while store.inner().unprocessed_count().await > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("rows were not processed in time");

        shutdown_tx.shutdown().unwrap();
        for handle in handles {
            handle.wait().await.unwrap();
        }

        let mut claimed = BTreeSet::new();
        for id in store.inner().claims().await.into_iter().flatten() {
            assert!(claimed.insert(id), "event {id} was claimed twice");
        }
        let mut marked = BTreeSet::new();
        for id in store.inner().marks().await.into_iter().flatten() {
            assert!(marked.insert(id), "event {id} was marked twice");
        }

        let all: BTreeSet<EventId> = (1..=100).map(EventId).collect();
        assert_eq!(claimed, all);
        assert_eq!(marked, all);
    }
}
