//! Postgres access for the pulse event pipeline.
//!
//! Holds the connection pool setup, the bootstrap of the `events` table and the queries the
//! persister and the batch processor issue against it.

pub mod db;
pub mod events;
pub mod schema;
#[cfg(feature = "test-utils")]
pub mod test_utils;
