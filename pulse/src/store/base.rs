use std::future::Future;

use crate::error::PulseResult;
use crate::types::{EventId, EventType};

/// Storage backend of the pipeline.
///
/// The persister inserts through it and the batch processor claims and marks through it.
/// Concurrency control of claims is delegated entirely to the implementation, callers perform
/// no locking of their own.
pub trait EventStore {
    /// Rows held by one claimant between a claim and its mark.
    type Claim: EventClaim;

    /// Returns the name of the store, used in logs.
    fn name() -> &'static str;

    /// Stores an encoded event as a new unprocessed row and returns its id.
    ///
    /// Ids are strictly increasing in insertion order.
    fn insert_event(
        &self,
        event_type: EventType,
        payload: &[u8],
    ) -> impl Future<Output = PulseResult<EventId>> + Send;

    /// Claims up to `limit` unprocessed rows, oldest first.
    ///
    /// Rows held by a concurrent claimant are skipped, so a row is never handed to two
    /// claimants at the same time. The returned claim holds its rows until it is marked or
    /// dropped.
    fn claim_unprocessed(
        &self,
        limit: usize,
    ) -> impl Future<Output = PulseResult<Self::Claim>> + Send;
}

/// A batch of rows held exclusively by one claimant.
///
/// Dropping a claim without marking it releases its rows unprocessed, so a later claim can
/// pick them up again.
pub trait EventClaim: Send + 'static {
    /// Ids of the claimed rows, oldest first.
    fn ids(&self) -> &[EventId];

    /// Marks every claimed row as processed in one operation and releases the claim.
    ///
    /// Returns how many rows transitioned to processed. Rows that are already processed are
    /// left untouched.
    fn mark_processed(self) -> impl Future<Output = PulseResult<u64>> + Send;
}
