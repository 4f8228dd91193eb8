use std::sync::{Arc, Mutex, PoisonError};

use crate::dashboard::sink::DisplaySink;

/// Sink keeping every frame in memory.
///
/// Clones share the same frames, so a clone can be inspected while the original is owned by
/// the dashboard worker. Frames are never dropped.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    frames: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every frame written so far.
    pub fn frames(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DisplaySink for MemorySink {
    fn write_frame(&mut self, frame: &str) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.to_string());
    }
}
