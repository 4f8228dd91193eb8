//! Helpers for testing the pipeline and code built on it.

pub mod sink;
pub mod store;
