//! Coordination primitives shared by the pipeline workers.
//!
//! - [`shutdown`] is the broadcast-once cancellation signal every worker selects on.
//! - [`queue`] is the bounded hand-off between the generator and the persister, and the only
//!   source of backpressure in the pipeline.

pub mod queue;
pub mod shutdown;
