//! Logging and metrics initialisation shared by pulse binaries and tests.

pub mod metrics;
pub mod tracing;
