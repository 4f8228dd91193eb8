use serde::Deserialize;

use crate::Config;
use crate::shared::{
    DashboardConfig, MetricsConfig, PipelineConfig, StoreConfig, ValidationError,
};

/// Complete configuration of the demo binary.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid leaking the store
/// credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Where events are persisted.
    pub store: StoreConfig,
    /// Stage timings and sizes.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Dashboard layout.
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Prometheus exporter.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl DemoConfig {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        self.pipeline.validate()?;
        self.dashboard.validate()
    }
}

impl Config for DemoConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
