//! Durable storage of events.
//!
//! [`base::EventStore`] is the seam between the workers and the storage backend.
//! [`postgres::PostgresEventStore`] is the production backend, [`memory::MemoryEventStore`]
//! keeps rows in memory for development and tests.

pub mod base;
pub mod memory;
pub mod postgres;
