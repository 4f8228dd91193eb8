//! A four stage event pipeline: a generator feeds a bounded queue, a persister drains it into
//! a durable store, a batch processor claims and marks stored events, and a dashboard renders
//! the shared counters.
//!
//! All stages observe one broadcast shutdown signal and are joined by [`pipeline::Pipeline`].

pub mod codec;
pub mod concurrency;
pub mod counters;
pub mod dashboard;
pub mod error;
#[cfg(feature = "failpoints")]
pub mod failpoints;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
