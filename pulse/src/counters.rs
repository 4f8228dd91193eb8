//! Aggregate counters shared by every pipeline worker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
struct Counters {
    events_handled: u64,
    writes: u64,
    reads: u64,
    updates: u64,
    processing_time: Duration,
    start_time: Instant,
}

/// Point-in-time copy of the counters, taken in a single critical section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountersSnapshot {
    /// Events generated and pushed onto the queue.
    pub events_handled: u64,
    /// Events inserted into the store.
    pub writes: u64,
    /// Claim queries issued by the batch processor.
    pub reads: u64,
    /// Batch updates issued by the batch processor.
    pub updates: u64,
    /// Accumulated time from dequeuing an event to its insert completing.
    pub processing_time: Duration,
    /// Time elapsed since the counters were created.
    pub elapsed: Duration,
}

impl CountersSnapshot {
    /// Total store operations: writes, reads and updates.
    pub fn total_operations(&self) -> u64 {
        self.writes + self.reads + self.updates
    }
}

/// Counters guarded by a mutex and shared across workers.
///
/// Each update holds the lock only for the increment itself, never across I/O. All counters
/// only ever grow.
#[derive(Debug, Clone)]
pub struct SharedCounters {
    inner: Arc<Mutex<Counters>>,
}

impl SharedCounters {
    /// Creates zeroed counters whose start time is now.
    pub fn new() -> Self {
        let counters = Counters {
            events_handled: 0,
            writes: 0,
            reads: 0,
            updates: 0,
            processing_time: Duration::ZERO,
            start_time: Instant::now(),
        };

        Self {
            inner: Arc::new(Mutex::new(counters)),
        }
    }

    /// Records one generated event.
    pub fn record_event_handled(&self) {
        self.lock().events_handled += 1;
    }

    /// Records one stored event together with the time it took to store it.
    pub fn record_write(&self, elapsed: Duration) {
        let mut counters = self.lock();
        counters.writes += 1;
        counters.processing_time += elapsed;
    }

    /// Records one claim query.
    pub fn record_read(&self) {
        self.lock().reads += 1;
    }

    /// Records one batch update.
    pub fn record_update(&self) {
        self.lock().updates += 1;
    }

    /// Copies every counter and the elapsed time under one lock acquisition.
    pub fn snapshot(&self) -> CountersSnapshot {
        let counters = self.lock();
        CountersSnapshot {
            events_handled: counters.events_handled,
            writes: counters.writes,
            reads: counters.reads,
            updates: counters.updates,
            processing_time: counters.processing_time,
            elapsed: counters.start_time.elapsed(),
        }
    }

    // A poisoned lock still holds valid counters since every update is a single increment.
    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedCounters {
    fn default() -> Self {
        Self::new()
    }
}
