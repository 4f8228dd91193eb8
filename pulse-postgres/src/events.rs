use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres, prelude::FromRow};

/// A row of the `events` table.
#[derive(Debug, Clone, FromRow)]
pub struct StoredEventRow {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub event_type: String,
    /// The `jsonb` payload rendered as text.
    pub data: String,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

/// Inserts one event and returns its id.
///
/// `data` must be a UTF-8 encoded JSON document, it is converted to `jsonb` server side.
pub async fn insert_event<'c, E>(executor: E, event_type: &str, data: &[u8]) -> sqlx::Result<i64>
where
    E: Executor<'c, Database = Postgres>,
{
    let id = sqlx::query_scalar(
        r#"
        insert into events (type, data)
        values ($1, convert_from($2, 'UTF8')::jsonb)
        returning id
        "#,
    )
    .bind(event_type)
    .bind(data)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Selects up to `limit` unprocessed event ids, oldest first, locking them.
///
/// Rows locked by a concurrent claimant are skipped rather than waited on. The locks last
/// until the enclosing transaction ends, which is the statement itself when `executor` is a
/// pool.
pub async fn claim_unprocessed<'c, E>(executor: E, limit: i64) -> sqlx::Result<Vec<i64>>
where
    E: Executor<'c, Database = Postgres>,
{
    let ids = sqlx::query_scalar(
        r#"
        select id from events
        where processed = false
        order by created_at, id
        limit $1
        for update skip locked
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(ids)
}

/// Marks the given events as processed in a single statement.
///
/// Returns the number of rows that transitioned from unprocessed to processed, so marking an
/// already processed id is a no-op.
pub async fn mark_processed<'c, E>(executor: E, ids: &[i64]) -> sqlx::Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        update events
        set processed = true
        where id = any($1) and processed = false
        "#,
    )
    .bind(ids)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Returns every stored event ordered by id.
pub async fn get_event_rows<'c, E>(executor: E) -> sqlx::Result<Vec<StoredEventRow>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, StoredEventRow>(
        r#"
        select id, type, data::text as data, processed, created_at
        from events
        order by id
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Counts the events not yet marked as processed.
pub async fn count_unprocessed<'c, E>(executor: E) -> sqlx::Result<i64>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar("select count(*) from events where processed = false")
        .fetch_one(executor)
        .await
}
