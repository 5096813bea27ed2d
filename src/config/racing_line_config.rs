use super::parse_env;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct RacingLineEnvConfig {
    /// First season searched for historical fastest laps.
    pub history_start_year: i32,
    pub n_trees: usize,
    pub seed: u64,
}

impl Default for RacingLineEnvConfig {
    fn default() -> Self {
        Self {
            // Position telemetry is published from 2023 onwards.
            history_start_year: 2023,
            n_trees: 100,
            seed: 42,
        }
    }
}

impl RacingLineEnvConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        Ok(Self {
            history_start_year: parse_env("RACING_LINE_HISTORY_START", d.history_start_year)?,
            n_trees: parse_env("RACING_LINE_N_TREES", d.n_trees)?,
            seed: d.seed,
        })
    }
}
