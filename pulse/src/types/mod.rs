//! Core data types flowing through the pipeline.

mod event;

pub use event::{Event, EventId, EventType};
