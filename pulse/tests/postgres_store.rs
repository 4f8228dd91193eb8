#![cfg(feature = "test-utils")]

use std::time::Duration;

use pulse::store::base::{EventClaim, EventStore};
use pulse::store::postgres::PostgresEventStore;
use pulse::types::{EventId, EventType};
use pulse_postgres::events::count_unprocessed;
use pulse_postgres::test_utils::{
    create_events_database, drop_events_database, test_connection_config,
};

const PAYLOAD: &[u8] = br#"{"type":"upvote","user":"user_7","data":"content_7"}"#;

async fn insert_events(store: &PostgresEventStore, count: usize) -> Vec<EventId> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(store.insert_event(EventType::Upvote, PAYLOAD).await.unwrap());
    }
    ids
}

#[tokio::test(flavor = "multi_thread")]
async fn open_claims_are_disjoint_until_marked() {
    let config = test_connection_config();
    let pool = create_events_database(&config).await;
    let store = PostgresEventStore::new(pool.clone());

    let inserted = insert_events(&store, 15).await;

    let first = store.claim_unprocessed(10).await.unwrap();
    let second = store.claim_unprocessed(10).await.unwrap();
    assert_eq!(first.ids(), &inserted[..10]);
    assert_eq!(second.ids(), &inserted[10..]);

    assert_eq!(first.mark_processed().await.unwrap(), 10);
    assert_eq!(second.mark_processed().await.unwrap(), 5);
    assert_eq!(count_unprocessed(&pool).await.unwrap(), 0);

    pool.close().await;
    drop_events_database(&config).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_claim_rolls_back_and_releases_rows() {
    let config = test_connection_config();
    let pool = create_events_database(&config).await;
    let store = PostgresEventStore::new(pool.clone());

    let inserted = insert_events(&store, 3).await;

    let claim = store.claim_unprocessed(10).await.unwrap();
    assert_eq!(claim.ids(), inserted);
    drop(claim);

    // The rollback is flushed when the connection goes back to the pool, which happens on a
    // background task.
    let reclaimed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let claim = store.claim_unprocessed(10).await.unwrap();
            if !claim.ids().is_empty() {
                break claim;
            }
            drop(claim);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("dropped claim was never released");
    assert_eq!(reclaimed.ids(), inserted);
    assert_eq!(reclaimed.mark_processed().await.unwrap(), 3);

    pool.close().await;
    drop_events_database(&config).await;
}
