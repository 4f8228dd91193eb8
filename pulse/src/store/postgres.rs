use std::fmt;

use pulse_postgres::events;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::PulseResult;
use crate::store::base::{EventClaim, EventStore};
use crate::types::{EventId, EventType};

/// Store backed by the Postgres `events` table.
///
/// Each claim opens a transaction and selects with `for update skip locked`. The row locks are
/// held by that transaction until the claim is marked, so several processors may share one
/// table without handing the same row to two of them.
#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a store over an already bootstrapped database.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EventStore for PostgresEventStore {
    type Claim = PostgresEventClaim;

    fn name() -> &'static str {
        "postgres"
    }

    async fn insert_event(&self, event_type: EventType, payload: &[u8]) -> PulseResult<EventId> {
        let id = events::insert_event(&self.pool, event_type.as_str(), payload).await?;

        Ok(EventId(id))
    }

    async fn claim_unprocessed(&self, limit: usize) -> PulseResult<PostgresEventClaim> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut tx = self.pool.begin().await?;
        let ids = events::claim_unprocessed(&mut *tx, limit).await?;

        Ok(PostgresEventClaim {
            tx,
            ids: ids.into_iter().map(EventId).collect(),
        })
    }
}

/// Claim holding row locks inside an open transaction.
///
/// Dropping the claim rolls the transaction back, which releases the locks.
pub struct PostgresEventClaim {
    tx: Transaction<'static, Postgres>,
    ids: Vec<EventId>,
}

impl fmt::Debug for PostgresEventClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresEventClaim")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl EventClaim for PostgresEventClaim {
    fn ids(&self) -> &[EventId] {
        &self.ids
    }

    async fn mark_processed(mut self) -> PulseResult<u64> {
        let ids: Vec<i64> = self.ids.iter().map(|id| id.into_inner()).collect();

        let processed = events::mark_processed(&mut *self.tx, &ids).await?;
        self.tx.commit().await?;

        debug!(processed, "committed processed batch");

        Ok(processed)
    }
}
