//! Gauge band configuration parsing from environment variables.

use super::parse_env;
use anyhow::{Result, bail};

/// Upper edges of the green, yellow and red error bands (percent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationEnvConfig {
    pub green_max: f64,
    pub yellow_max: f64,
    pub red_max: f64,
}

impl Default for PresentationEnvConfig {
    fn default() -> Self {
        Self {
            green_max: 10.0,
            yellow_max: 15.0,
            red_max: 25.0,
        }
    }
}

impl PresentationEnvConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let config = Self {
            green_max: parse_env("GAUGE_GREEN_MAX", d.green_max)?,
            yellow_max: parse_env("GAUGE_YELLOW_MAX", d.yellow_max)?,
            red_max: parse_env("GAUGE_RED_MAX", d.red_max)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0 < self.green_max && self.green_max < self.yellow_max && self.yellow_max < self.red_max)
        {
            bail!(
                "Gauge bands must increase: green {} < yellow {} < red {}",
                self.green_max,
                self.yellow_max,
                self.red_max
            );
        }
        Ok(())
    }
}
