#![cfg(feature = "test-utils")]

use pulse_postgres::events::{
    claim_unprocessed, count_unprocessed, get_event_rows, insert_event, mark_processed,
};
use pulse_postgres::test_utils::{
    create_events_database, drop_events_database, test_connection_config,
};

const PAYLOAD: &[u8] = br#"{"type":"post","user":"user_1","data":"content_1"}"#;

#[tokio::test(flavor = "multi_thread")]
async fn inserted_events_are_claimed_oldest_first_in_bounded_batches() {
    let config = test_connection_config();
    let pool = create_events_database(&config).await;

    let mut inserted = Vec::new();
    for _ in 0..15 {
        inserted.push(insert_event(&pool, "post", PAYLOAD).await.unwrap());
    }

    let first = claim_unprocessed(&pool, 10).await.unwrap();
    assert_eq!(first, inserted[..10]);
    assert_eq!(mark_processed(&pool, &first).await.unwrap(), 10);

    let second = claim_unprocessed(&pool, 10).await.unwrap();
    assert_eq!(second, inserted[10..]);
    assert_eq!(mark_processed(&pool, &second).await.unwrap(), 5);

    assert_eq!(count_unprocessed(&pool).await.unwrap(), 0);

    let rows = get_event_rows(&pool).await.unwrap();
    assert_eq!(rows.len(), 15);
    assert!(rows.iter().all(|row| row.processed && row.event_type == "post"));
    assert!(rows[0].data.contains("user_1"));

    pool.close().await;
    drop_events_database(&config).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn marking_twice_is_a_no_op() {
    let config = test_connection_config();
    let pool = create_events_database(&config).await;

    let id = insert_event(&pool, "upvote", PAYLOAD).await.unwrap();

    assert_eq!(mark_processed(&pool, &[id]).await.unwrap(), 1);
    assert_eq!(mark_processed(&pool, &[id]).await.unwrap(), 0);
    assert!(claim_unprocessed(&pool, 10).await.unwrap().is_empty());

    pool.close().await;
    drop_events_database(&config).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn rows_locked_by_a_concurrent_claimant_are_skipped() {
    let config = test_connection_config();
    let pool = create_events_database(&config).await;

    for _ in 0..4 {
        insert_event(&pool, "comment", PAYLOAD).await.unwrap();
    }

    // Hold the first claim open inside a transaction.
    let mut tx = pool.begin().await.unwrap();
    let held = claim_unprocessed(&mut *tx, 2).await.unwrap();
    assert_eq!(held.len(), 2);

    let concurrent = claim_unprocessed(&pool, 10).await.unwrap();
    assert_eq!(concurrent.len(), 2);
    assert!(concurrent.iter().all(|id| !held.contains(id)));

    mark_processed(&mut *tx, &held).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(claim_unprocessed(&pool, 10).await.unwrap(), concurrent);

    pool.close().await;
    drop_events_database(&config).await;
}
