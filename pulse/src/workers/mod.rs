//! The four concurrently running stages of the pipeline.

pub mod base;
pub mod dashboard;
pub mod generator;
pub mod persister;
pub mod processor;
