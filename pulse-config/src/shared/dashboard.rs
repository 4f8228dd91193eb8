use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Layout settings of the textual dashboard.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardConfig {
    /// Whether the dashboard renderer runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Number of cells of a full activity bar.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
    /// Rate, in operations per second, that fills an activity bar.
    #[serde(default = "default_bar_scale")]
    pub bar_scale: f64,
}

impl DashboardConfig {
    pub const DEFAULT_BAR_WIDTH: usize = 40;
    pub const DEFAULT_BAR_SCALE: f64 = 50.0;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bar_width == 0 {
            return Err(ValidationError::invalid(
                "dashboard.bar_width",
                "must be greater than 0",
            ));
        }

        if !(self.bar_scale.is_finite() && self.bar_scale > 0.0) {
            return Err(ValidationError::invalid(
                "dashboard.bar_scale",
                "must be a positive number",
            ));
        }

        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            bar_width: default_bar_width(),
            bar_scale: default_bar_scale(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_bar_width() -> usize {
    DashboardConfig::DEFAULT_BAR_WIDTH
}

fn default_bar_scale() -> f64 {
    DashboardConfig::DEFAULT_BAR_SCALE
}
