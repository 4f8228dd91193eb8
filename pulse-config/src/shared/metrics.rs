use serde::{Deserialize, Serialize};

/// Prometheus exporter settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricsConfig {
    /// Whether the Prometheus HTTP listener is started.
    #[serde(default)]
    pub enabled: bool,
    /// Port the `/metrics` endpoint listens on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl MetricsConfig {
    pub const DEFAULT_PORT: u16 = 9000;
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    MetricsConfig::DEFAULT_PORT
}
