use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Timing, buffering and batching settings of the four pipeline stages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Period, in milliseconds, between two generated events.
    #[serde(default = "default_generator_interval_ms")]
    pub generator_interval_ms: u64,
    /// Capacity of the hand-off queue between the generator and the persister.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Period, in milliseconds, between two batch processor ticks.
    #[serde(default = "default_processor_interval_ms")]
    pub processor_interval_ms: u64,
    /// Maximum number of rows claimed per batch processor tick.
    #[serde(default = "default_claim_batch_size")]
    pub claim_batch_size: usize,
    /// Period, in milliseconds, between two dashboard frames.
    #[serde(default = "default_dashboard_interval_ms")]
    pub dashboard_interval_ms: u64,
    /// How long the demo runs before shutdown is issued.
    #[serde(default = "default_run_duration_secs")]
    pub run_duration_secs: u64,
    /// Fixed seed for the event generator, random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Exclusive upper bound of generated user ids.
    #[serde(default = "default_id_range")]
    pub user_id_range: u32,
    /// Exclusive upper bound of generated payload ids.
    #[serde(default = "default_id_range")]
    pub payload_id_range: u32,
}

impl PipelineConfig {
    pub const DEFAULT_GENERATOR_INTERVAL_MS: u64 = 100;
    pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
    pub const DEFAULT_PROCESSOR_INTERVAL_MS: u64 = 200;
    pub const DEFAULT_CLAIM_BATCH_SIZE: usize = 10;
    pub const DEFAULT_DASHBOARD_INTERVAL_MS: u64 = 500;
    pub const DEFAULT_RUN_DURATION_SECS: u64 = 60;
    pub const DEFAULT_ID_RANGE: u32 = 1000;

    pub fn generator_interval(&self) -> Duration {
        Duration::from_millis(self.generator_interval_ms)
    }

    pub fn processor_interval(&self) -> Duration {
        Duration::from_millis(self.processor_interval_ms)
    }

    pub fn dashboard_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard_interval_ms)
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.run_duration_secs)
    }

    /// Validates that every period, capacity and range is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let non_zero = [
            ("pipeline.generator_interval_ms", self.generator_interval_ms),
            ("pipeline.queue_capacity", self.queue_capacity as u64),
            ("pipeline.processor_interval_ms", self.processor_interval_ms),
            ("pipeline.claim_batch_size", self.claim_batch_size as u64),
            ("pipeline.dashboard_interval_ms", self.dashboard_interval_ms),
            ("pipeline.user_id_range", u64::from(self.user_id_range)),
            ("pipeline.payload_id_range", u64::from(self.payload_id_range)),
        ];

        for (field, value) in non_zero {
            if value == 0 {
                return Err(ValidationError::invalid(field, "must be greater than 0"));
            }
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generator_interval_ms: default_generator_interval_ms(),
            queue_capacity: default_queue_capacity(),
            processor_interval_ms: default_processor_interval_ms(),
            claim_batch_size: default_claim_batch_size(),
            dashboard_interval_ms: default_dashboard_interval_ms(),
            run_duration_secs: default_run_duration_secs(),
            seed: None,
            user_id_range: default_id_range(),
            payload_id_range: default_id_range(),
        }
    }
}

fn default_generator_interval_ms() -> u64 {
    PipelineConfig::DEFAULT_GENERATOR_INTERVAL_MS
}

fn default_queue_capacity() -> usize {
    PipelineConfig::DEFAULT_QUEUE_CAPACITY
}

fn default_processor_interval_ms() -> u64 {
    PipelineConfig::DEFAULT_PROCESSOR_INTERVAL_MS
}

fn default_claim_batch_size() -> usize {
    PipelineConfig::DEFAULT_CLAIM_BATCH_SIZE
}

fn default_dashboard_interval_ms() -> u64 {
    PipelineConfig::DEFAULT_DASHBOARD_INTERVAL_MS
}

fn default_run_duration_secs() -> u64 {
    PipelineConfig::DEFAULT_RUN_DURATION_SECS
}

fn default_id_range() -> u32 {
    PipelineConfig::DEFAULT_ID_RANGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.generator_interval(), Duration::from_millis(100));
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.processor_interval(), Duration::from_millis(200));
        assert_eq!(config.claim_batch_size, 10);
        assert_eq!(config.dashboard_interval(), Duration::from_millis(500));
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let config = PipelineConfig {
            queue_capacity: 0,
            ..PipelineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pipeline.queue_capacity"));
    }
}
