//! Configuration module for Racecast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Provider, Cache, Model, Presentation, and Racing Line.

mod cache_config;
mod model_config;
mod presentation_config;
mod provider_config;
mod racing_line_config;

pub use cache_config::CacheEnvConfig;
pub use model_config::ModelEnvConfig;
pub use presentation_config::PresentationEnvConfig;
pub use provider_config::{DEFAULT_F1_API_BASE_URL, DEFAULT_OPENF1_BASE_URL, ProviderEnvConfig};
pub use racing_line_config::RacingLineEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Parse an environment variable, falling back to `default` when unset.
pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .context(format!("Failed to parse {}", key)),
        Err(_) => Ok(default),
    }
}

/// Like `parse_env` for settings that are unset by default.
pub(crate) fn parse_env_opt<T>(key: &str, default: Option<T>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .context(format!("Failed to parse {}", key)),
        Err(_) => Ok(default),
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub provider: ProviderEnvConfig,
    pub cache: CacheEnvConfig,
    pub model: ModelEnvConfig,
    pub presentation: PresentationEnvConfig,
    pub racing_line: RacingLineEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let provider = ProviderEnvConfig::from_env().context("Failed to load provider config")?;
        let cache = CacheEnvConfig::from_env().context("Failed to load cache config")?;
        let model = ModelEnvConfig::from_env().context("Failed to load model config")?;
        let presentation =
            PresentationEnvConfig::from_env().context("Failed to load presentation config")?;
        let racing_line =
            RacingLineEnvConfig::from_env().context("Failed to load racing line config")?;

        Ok(Self {
            provider,
            cache,
            model,
            presentation,
            racing_line,
        })
    }
}
