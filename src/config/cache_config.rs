//! Session cache configuration parsing from environment variables.

use super::parse_env;
use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CacheEnvConfig {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for CacheEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("f1_cache"),
        }
    }
}

impl CacheEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enabled: parse_env("F1_CACHE_ENABLED", defaults.enabled)?,
            directory: env::var("F1_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.directory),
        })
    }

    /// Directory for on-disk entries, `None` when disk caching is off.
    pub fn disk_directory(&self) -> Option<PathBuf> {
        self.enabled.then(|| self.directory.clone())
    }
}
