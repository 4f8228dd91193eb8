use sqlx::{Executor, PgPool};
use tracing::info;

/// Name of the table holding persisted events.
pub const EVENTS_TABLE: &str = "events";

/// Recreates the `events` table and its partial index on unprocessed rows.
///
/// Every run starts from an empty table, rows from previous runs are dropped.
pub async fn bootstrap_events_table(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(
        r#"
        drop table if exists events;
        create table events (
            id bigserial primary key,
            type varchar(20) not null,
            data jsonb not null,
            processed boolean not null default false,
            created_at timestamptz not null default now()
        );
        create index idx_events_processed on events (processed) where not processed;
        "#,
    )
    .await?;

    info!(table = EVENTS_TABLE, "events table bootstrapped");

    Ok(())
}
