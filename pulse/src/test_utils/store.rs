use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::bail;
use crate::error::{ErrorKind, PulseResult};
use crate::store::base::{EventClaim, EventStore};
use crate::types::{EventId, EventType};

#[derive(Debug, Default)]
struct Faults {
    fail_inserts: AtomicBool,
    fail_claims: AtomicBool,
    fail_marks: AtomicBool,
    mark_delay_ms: AtomicU64,
    failed_operations: AtomicU64,
}

impl Faults {
    fn check(&self, switch: &AtomicBool, operation: &'static str) -> PulseResult<()> {
        if switch.load(Ordering::SeqCst) {
            self.failed_operations.fetch_add(1, Ordering::SeqCst);
            bail!(
                ErrorKind::StoreQueryFailed,
                "Injected store failure",
                format!("The {operation} operation was configured to fail")
            );
        }

        Ok(())
    }
}

/// Store wrapper failing or slowing down selected operations on demand.
///
/// Failures are reported as [`ErrorKind::StoreQueryFailed`] before the wrapped store is
/// reached, so a failed operation leaves the inner store untouched. A failed mark drops the
/// inner claim, releasing its rows. Clones share the same switches.
#[derive(Debug, Clone)]
pub struct FaultyEventStore<S> {
    inner: S,
    faults: Arc<Faults>,
}

impl<S> FaultyEventStore<S> {
    /// Wraps `inner` with every operation succeeding.
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::new(Faults::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.faults.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_claims(&self, fail: bool) {
        self.faults.fail_claims.store(fail, Ordering::SeqCst);
    }

    pub fn fail_marks(&self, fail: bool) {
        self.faults.fail_marks.store(fail, Ordering::SeqCst);
    }

    /// Makes every mark sleep for `delay` before reaching the inner store.
    pub fn delay_marks(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.faults.mark_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of operations failed so far.
    pub fn failed_operations(&self) -> u64 {
        self.faults.failed_operations.load(Ordering::SeqCst)
    }
}

impl<S> EventStore for FaultyEventStore<S>
where
    S: EventStore + Send + Sync,
{
    type Claim = FaultyEventClaim<S::Claim>;

    fn name() -> &'static str {
        S::name()
    }

    async fn insert_event(&self, event_type: EventType, payload: &[u8]) -> PulseResult<EventId> {
        self.faults.check(&self.faults.fail_inserts, "insert")?;
        self.inner.insert_event(event_type, payload).await
    }

    async fn claim_unprocessed(&self, limit: usize) -> PulseResult<Self::Claim> {
        self.faults.check(&self.faults.fail_claims, "claim")?;
        let inner = self.inner.claim_unprocessed(limit).await?;

        Ok(FaultyEventClaim {
            inner,
            faults: self.faults.clone(),
        })
    }
}

/// Claim handed out by [`FaultyEventStore`].
#[derive(Debug)]
pub struct FaultyEventClaim<C> {
    inner: C,
    faults: Arc<Faults>,
}

impl<C> EventClaim for FaultyEventClaim<C>
where
    C: EventClaim,
{
    fn ids(&self) -> &[EventId] {
        self.inner.ids()
    }

    async fn mark_processed(self) -> PulseResult<u64> {
        let delay = self.faults.mark_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.faults.check(&self.faults.fail_marks, "mark")?;
        self.inner.mark_processed().await
    }
}
