use pulse_config::load_config;
use pulse_config::shared::DemoConfig;

use crate::error::DemoResult;

/// Loads and validates the demo configuration.
pub fn load_demo_config() -> DemoResult<DemoConfig> {
    let config = load_config::<DemoConfig>()?;
    config.validate()?;

    Ok(config)
}
