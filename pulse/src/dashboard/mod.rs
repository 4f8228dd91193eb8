//! Text rendering of the shared counters and the sinks frames are written to.

pub mod frame;
pub mod sink;
