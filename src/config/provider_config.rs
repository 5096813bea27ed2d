//! Upstream data provider configuration parsing from environment variables.

use super::parse_env;
use anyhow::Result;
use std::env;
use std::time::Duration;

pub const DEFAULT_F1_API_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";
pub const DEFAULT_OPENF1_BASE_URL: &str = "https://api.openf1.org/v1";

/// Provider environment configuration
#[derive(Debug, Clone)]
pub struct ProviderEnvConfig {
    pub f1_api_base_url: String,
    pub openf1_base_url: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub page_size: usize,
}

impl Default for ProviderEnvConfig {
    fn default() -> Self {
        Self {
            f1_api_base_url: DEFAULT_F1_API_BASE_URL.to_string(),
            openf1_base_url: DEFAULT_OPENF1_BASE_URL.to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            page_size: 100,
        }
    }
}

impl ProviderEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            f1_api_base_url: env::var("F1_API_BASE_URL")
                .unwrap_or(defaults.f1_api_base_url)
                .trim_end_matches('/')
                .to_string(),
            openf1_base_url: env::var("OPENF1_BASE_URL")
                .unwrap_or(defaults.openf1_base_url)
                .trim_end_matches('/')
                .to_string(),
            request_timeout_secs: parse_env("F1_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            max_retries: parse_env("F1_MAX_RETRIES", defaults.max_retries)?,
            page_size: parse_env("F1_PAGE_SIZE", defaults.page_size)?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
