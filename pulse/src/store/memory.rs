use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::PulseResult;
use crate::store::base::{EventClaim, EventStore};
use crate::types::{EventId, EventType};

/// A row held by [`MemoryEventStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEventRow {
    pub id: EventId,
    pub event_type: EventType,
    pub data: Vec<u8>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner {
    rows: Vec<MemoryEventRow>,
    next_id: i64,
    claims: Vec<Vec<EventId>>,
    marks: Vec<BTreeSet<EventId>>,
}

impl Inner {
    fn push_row(&mut self, event_type: EventType, data: &[u8]) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.rows.push(MemoryEventRow {
            id,
            event_type,
            data: data.to_vec(),
            processed: false,
            created_at: Utc::now(),
        });
        id
    }

    fn mark_rows(&mut self, ids: &BTreeSet<EventId>) -> u64 {
        let mut processed = 0;
        for row in self.rows.iter_mut() {
            if !row.processed && ids.contains(&row.id) {
                row.processed = true;
                processed += 1;
            }
        }
        processed
    }
}

/// In-memory store for development and tests.
///
/// Claimed ids are tracked in a held set until their claim is marked or dropped, and claims
/// skip held ids, which mirrors a skip-locked read inside a transaction. Rows are kept in
/// insertion order, which is also creation order. All data is lost when the process exits.
#[derive(Debug, Clone)]
pub struct MemoryEventStore {
    inner: Arc<Mutex<Inner>>,
    // Only ever locked after `inner` or on its own, never across an await.
    held: Arc<std::sync::Mutex<BTreeSet<EventId>>>,
}

impl MemoryEventStore {
    /// Creates an empty store. The first inserted row gets id 1.
    pub fn new() -> Self {
        let inner = Inner {
            rows: Vec::new(),
            next_id: 1,
            claims: Vec::new(),
            marks: Vec::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            held: Arc::new(std::sync::Mutex::new(BTreeSet::new())),
        }
    }

    /// Inserts `count` unprocessed rows with a minimal payload and returns their ids.
    pub async fn seed_unprocessed(&self, count: usize) -> Vec<EventId> {
        let mut inner = self.inner.lock().await;
        (0..count)
            .map(|_| inner.push_row(EventType::Post, b"{}"))
            .collect()
    }

    /// Returns a copy of every stored row.
    pub async fn rows(&self) -> Vec<MemoryEventRow> {
        let inner = self.inner.lock().await;
        inner.rows.clone()
    }

    /// Returns how many rows are still unprocessed.
    pub async fn unprocessed_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.rows.iter().filter(|row| !row.processed).count()
    }

    /// Returns how many ids are currently held by an open claim.
    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns the ids handed out by each claim, in call order.
    pub async fn claims(&self) -> Vec<Vec<EventId>> {
        let inner = self.inner.lock().await;
        inner.claims.clone()
    }

    /// Returns the id sets marked by each claim, in call order.
    pub async fn marks(&self) -> Vec<BTreeSet<EventId>> {
        let inner = self.inner.lock().await;
        inner.marks.clone()
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for MemoryEventStore {
    type Claim = MemoryEventClaim;

    fn name() -> &'static str {
        "memory"
    }

    async fn insert_event(&self, event_type: EventType, payload: &[u8]) -> PulseResult<EventId> {
        let mut inner = self.inner.lock().await;
        Ok(inner.push_row(event_type, payload))
    }

    async fn claim_unprocessed(&self, limit: usize) -> PulseResult<MemoryEventClaim> {
        let mut inner = self.inner.lock().await;

        let ids: Vec<EventId> = {
            let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
            let ids: Vec<EventId> = inner
                .rows
                .iter()
                .filter(|row| !row.processed && !held.contains(&row.id))
                .take(limit)
                .map(|row| row.id)
                .collect();
            held.extend(ids.iter().copied());
            ids
        };
        inner.claims.push(ids.clone());

        debug!(claimed = ids.len(), "claimed unprocessed events from memory");

        Ok(MemoryEventClaim {
            store: self.clone(),
            ids,
            held: true,
        })
    }
}

/// Claim over rows of a [`MemoryEventStore`].
#[derive(Debug)]
pub struct MemoryEventClaim {
    store: MemoryEventStore,
    ids: Vec<EventId>,
    held: bool,
}

impl MemoryEventClaim {
    fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;

        let mut held = self
            .store
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for id in &self.ids {
            held.remove(id);
        }
    }
}

impl Drop for MemoryEventClaim {
    fn drop(&mut self) {
        self.release();
    }
}

impl EventClaim for MemoryEventClaim {
    fn ids(&self) -> &[EventId] {
        &self.ids
    }

    async fn mark_processed(mut self) -> PulseResult<u64> {
        let batch: BTreeSet<EventId> = self.ids.iter().copied().collect();

        let processed = {
            let mut inner = self.store.inner.lock().await;
            let processed = inner.mark_rows(&batch);
            inner.marks.push(batch);
            processed
        };
        self.release();

        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_rows(count: usize) -> MemoryEventStore {
        let store = MemoryEventStore::new();
        store.seed_unprocessed(count).await;
        store
    }

    #[tokio::test]
    async fn ids_increase_with_insertion_order() {
        let store = MemoryEventStore::new();
        let first = store.insert_event(EventType::Post, b"{}").await.unwrap();
        let second = store.insert_event(EventType::Comment, b"{}").await.unwrap();

        assert_eq!(first, EventId(1));
        assert_eq!(second, EventId(2));
        assert_eq!(store.unprocessed_count().await, 2);
    }

    #[tokio::test]
    async fn claims_oldest_unprocessed_rows_up_to_limit() {
        let store = store_with_rows(15).await;

        let claim = store.claim_unprocessed(10).await.unwrap();
        assert_eq!(claim.ids(), (1..=10).map(EventId).collect::<Vec<_>>());
        assert_eq!(store.held_count(), 10);
    }

    #[tokio::test]
    async fn open_claims_hide_their_rows_from_other_claimants() {
        let store = store_with_rows(15).await;

        let first = store.claim_unprocessed(10).await.unwrap();
        let second = store.claim_unprocessed(10).await.unwrap();
        let third = store.claim_unprocessed(10).await.unwrap();

        assert_eq!(first.ids(), (1..=10).map(EventId).collect::<Vec<_>>());
        assert_eq!(second.ids(), (11..=15).map(EventId).collect::<Vec<_>>());
        assert!(third.ids().is_empty());
    }

    #[tokio::test]
    async fn dropped_claim_releases_rows_unprocessed() {
        let store = store_with_rows(3).await;

        let claim = store.claim_unprocessed(2).await.unwrap();
        drop(claim);
        assert_eq!(store.held_count(), 0);

        let claim = store.claim_unprocessed(10).await.unwrap();
        assert_eq!(claim.ids(), (1..=3).map(EventId).collect::<Vec<_>>());
        assert_eq!(store.unprocessed_count().await, 3);
        assert!(store.marks().await.is_empty());
    }

    #[tokio::test]
    async fn marking_a_claim_processes_its_rows_and_releases_them() {
        let store = store_with_rows(3).await;

        let claim = store.claim_unprocessed(2).await.unwrap();
        assert_eq!(claim.mark_processed().await.unwrap(), 2);
        assert_eq!(store.held_count(), 0);

        let rows = store.rows().await;
        assert!(rows[0].processed && rows[1].processed);
        assert!(!rows[2].processed);

        let claim = store.claim_unprocessed(10).await.unwrap();
        assert_eq!(claim.ids(), &[EventId(3)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claimants_never_share_a_row() {
        let store = store_with_rows(100).await;

        let claimants: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut seen = Vec::new();
                    loop {
                        let claim = store.claim_unprocessed(7).await.unwrap();
                        if claim.ids().is_empty() {
                            break;
                        }
                        seen.extend_from_slice(claim.ids());
                        // Let other claimants run while this claim is still open.
                        tokio::task::yield_now().await;
                        claim.mark_processed().await.unwrap();
                    }
                    seen
                })
            })
            .collect();

        let mut seen = BTreeSet::new();
        for claimant in claimants {
            for id in claimant.await.unwrap() {
                assert!(seen.insert(id), "event {id} was claimed twice");
            }
        }
        assert_eq!(seen.len(), 100);
        assert_eq!(store.unprocessed_count().await, 0);
    }
}
