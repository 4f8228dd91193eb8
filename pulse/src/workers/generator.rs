use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use pulse_config::shared::PipelineConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::concurrency::queue::EventQueueTx;
use crate::concurrency::shutdown::ShutdownRx;
use crate::counters::SharedCounters;
use crate::metrics::PULSE_EVENTS_GENERATED_TOTAL;
use crate::types::{Event, EventType};
use crate::workers::base::{Worker, WorkerType};

/// Worker producing one synthetic event per period.
///
/// Pushing onto a full queue suspends the worker, which is the only backpressure of the
/// pipeline: a slow persister slows generation down to its own drain rate.
#[derive(Debug)]
pub struct GeneratorWorker {
    interval: Duration,
    user_id_range: u32,
    payload_id_range: u32,
    rng: StdRng,
    queue_tx: EventQueueTx,
    counters: SharedCounters,
    shutdown_rx: ShutdownRx,
}

impl GeneratorWorker {
    /// Creates a generator. A configured seed makes the produced events reproducible.
    pub fn new(
        config: &PipelineConfig,
        queue_tx: EventQueueTx,
        counters: SharedCounters,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            interval: config.generator_interval(),
            user_id_range: config.user_id_range,
            payload_id_range: config.payload_id_range,
            rng,
            queue_tx,
            counters,
            shutdown_rx,
        }
    }

    /// Builds the next event: a uniformly random type, user and payload, stamped now.
    pub fn generate_event(&mut self) -> Event {
        let event_type = EventType::ALL[self.rng.random_range(0..EventType::ALL.len())];
        let user_id = self.rng.random_range(0..self.user_id_range);
        let payload_id = self.rng.random_range(0..self.payload_id_range);

        Event {
            event_type,
            user: format!("user_{user_id}"),
            payload: format!("content_{payload_id}"),
            timestamp: Utc::now(),
        }
    }
}

impl Worker for GeneratorWorker {
    const WORKER_TYPE: WorkerType = WorkerType::Generator;

    async fn run(mut self) {
        info!(
            worker = %Self::WORKER_TYPE,
            interval_ms = self.interval.as_millis() as u64,
            "starting event generator"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for_shutdown() => break,
                _ = ticker.tick() => {}
            }

            let event = self.generate_event();

            tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for_shutdown() => break,
                result = self.queue_tx.push(event) => {
                    if let Err(err) = result {
                        warn!(error = %err, "event queue closed, stopping event generator");
                        break;
                    }
                }
            }

            self.counters.record_event_handled();
            counter!(PULSE_EVENTS_GENERATED_TOTAL).increment(1);

            debug!(queue_len = self.queue_tx.len(), "event queued");
        }

        info!(worker = %Self::WORKER_TYPE, "event generator stopped");
    }
}
