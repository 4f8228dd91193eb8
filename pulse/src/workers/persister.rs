use metrics::{counter, histogram};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::codec::EventCodec;
use crate::concurrency::queue::EventQueueRx;
use crate::concurrency::shutdown::ShutdownRx;
use crate::counters::SharedCounters;
use crate::error::PulseResult;
#[cfg(feature = "failpoints")]
use crate::failpoints::{PERSISTER_BEFORE_INSERT, pulse_fail_point};
use crate::metrics::{
    OPERATION_LABEL, PULSE_EVENTS_WRITTEN_TOTAL, PULSE_SERIALIZATION_ERRORS_TOTAL,
    PULSE_STORE_ERRORS_TOTAL, PULSE_WRITE_DURATION_SECONDS,
};
use crate::store::base::EventStore;
use crate::types::{Event, EventId, EventType};
use crate::workers::base::{Worker, WorkerType};

/// Worker draining the event queue into the store.
///
/// Encoding and insert failures are logged and the event is dropped, the worker carries on
/// with the next one.
#[derive(Debug)]
pub struct PersisterWorker<S, C> {
    store: S,
    codec: C,
    queue_rx: EventQueueRx,
    counters: SharedCounters,
    shutdown_rx: ShutdownRx,
}

impl<S, C> PersisterWorker<S, C>
where
    S: EventStore,
    C: EventCodec,
{
    pub fn new(
        store: S,
        codec: C,
        queue_rx: EventQueueRx,
        counters: SharedCounters,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            store,
            codec,
            queue_rx,
            counters,
            shutdown_rx,
        }
    }

    /// Encodes and stores one event, returning the id of the new row when it was stored.
    ///
    /// A write is recorded only on success, together with the time from `received_at` to the
    /// insert completing.
    pub async fn persist(&self, event: Event, received_at: Instant) -> Option<EventId> {
        let payload = match self.codec.encode(&event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, event_type = %event.event_type, "failed to encode event, dropping it");
                counter!(PULSE_SERIALIZATION_ERRORS_TOTAL).increment(1);

                return None;
            }
        };

        match self.insert(event.event_type, &payload).await {
            Ok(id) => {
                let elapsed = received_at.elapsed();
                self.counters.record_write(elapsed);

                counter!(PULSE_EVENTS_WRITTEN_TOTAL).increment(1);
                histogram!(PULSE_WRITE_DURATION_SECONDS).record(elapsed.as_secs_f64());
                debug!(%id, event_type = %event.event_type, "event stored");

                Some(id)
            }
            Err(err) => {
                warn!(error = %err, store = S::name(), "failed to store event, dropping it");
                counter!(PULSE_STORE_ERRORS_TOTAL, OPERATION_LABEL => "insert").increment(1);

                None
            }
        }
    }

    async fn insert(&self, event_type: EventType, payload: &[u8]) -> PulseResult<EventId> {
        #[cfg(feature = "failpoints")]
        pulse_fail_point(PERSISTER_BEFORE_INSERT)?;

        self.store.insert_event(event_type, payload).await
    }
}

impl<S, C> Worker for PersisterWorker<S, C>
where
    S: EventStore + Send + Sync + 'static,
    C: EventCodec + Send + Sync + 'static,
{
    const WORKER_TYPE: WorkerType = WorkerType::Persister;

    async fn run(mut self) {
        info!(worker = %Self::WORKER_TYPE, store = S::name(), "starting event persister");

        loop {
            let event = tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for_shutdown() => break,
                event = self.queue_rx.recv() => event,
            };

            let Some(event) = event else {
                info!("event queue closed and drained");
                break;
            };

            self.persist(event, Instant::now()).await;
        }

        info!(worker = %Self::WORKER_TYPE, "event persister stopped");
    }
}
