//! Dataset and regressor configuration parsing from environment variables.
//!
//! Defaults mirror the reference models: 100 boosting stages at 0.1 with
//! depth-3 trees, a 100-tree forest, and XGBoost's 0.3 / depth 6 / λ = 1.

use super::{parse_env, parse_env_opt};
use crate::application::ml::boosted_trees::BoostedTreesParams;
use crate::application::ml::gradient_boosting::GradientBoostingParams;
use crate::application::ml::random_forest::RandomForestParams;
use crate::domain::session::DEFAULT_SENTINEL_PENALTY_SECS;
use anyhow::{Result, bail};

#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    /// Added to the slowest qualifying time for drivers without a time.
    pub sentinel_penalty_secs: f64,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub gradient_boosting: GradientBoostingParams,
    pub random_forest: RandomForestParams,
    pub boosted_trees: BoostedTreesParams,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            sentinel_penalty_secs: DEFAULT_SENTINEL_PENALTY_SECS,
            test_fraction: 0.2,
            split_seed: 42,
            gradient_boosting: GradientBoostingParams::default(),
            random_forest: RandomForestParams::default(),
            boosted_trees: BoostedTreesParams::default(),
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let split_seed = parse_env("SPLIT_SEED", d.split_seed)?;

        let gradient_boosting = GradientBoostingParams {
            n_estimators: parse_env("GB_N_ESTIMATORS", d.gradient_boosting.n_estimators)?,
            learning_rate: parse_env("GB_LEARNING_RATE", d.gradient_boosting.learning_rate)?,
            max_depth: parse_env("GB_MAX_DEPTH", d.gradient_boosting.max_depth)?,
            ..d.gradient_boosting
        };

        let random_forest = RandomForestParams {
            n_trees: parse_env("RF_N_TREES", d.random_forest.n_trees)?,
            max_depth: parse_env_opt("RF_MAX_DEPTH", d.random_forest.max_depth)?,
            seed: split_seed,
            ..d.random_forest
        };

        let boosted_trees = BoostedTreesParams {
            n_estimators: parse_env("XGB_N_ESTIMATORS", d.boosted_trees.n_estimators)?,
            learning_rate: parse_env("XGB_LEARNING_RATE", d.boosted_trees.learning_rate)?,
            max_depth: parse_env("XGB_MAX_DEPTH", d.boosted_trees.max_depth)?,
            reg_lambda: parse_env("XGB_REG_LAMBDA", d.boosted_trees.reg_lambda)?,
            gamma: parse_env("XGB_GAMMA", d.boosted_trees.gamma)?,
            subsample: parse_env("XGB_SUBSAMPLE", d.boosted_trees.subsample)?,
            seed: split_seed,
            ..d.boosted_trees
        };

        let config = Self {
            sentinel_penalty_secs: parse_env("SENTINEL_PENALTY_SECS", d.sentinel_penalty_secs)?,
            test_fraction: parse_env("TEST_FRACTION", d.test_fraction)?,
            split_seed,
            gradient_boosting,
            random_forest,
            boosted_trees,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            bail!("TEST_FRACTION must be in (0, 1), got {}", self.test_fraction);
        }
        if !(self.sentinel_penalty_secs >= 0.0) {
            bail!(
                "SENTINEL_PENALTY_SECS must be non-negative, got {}",
                self.sentinel_penalty_secs
            );
        }
        if !(self.gradient_boosting.learning_rate > 0.0) {
            bail!("GB_LEARNING_RATE must be positive");
        }
        if !(self.boosted_trees.learning_rate > 0.0) {
            bail!("XGB_LEARNING_RATE must be positive");
        }
        if !(self.boosted_trees.subsample > 0.0 && self.boosted_trees.subsample <= 1.0) {
            bail!("XGB_SUBSAMPLE must be in (0, 1]");
        }
        if self.gradient_boosting.n_estimators == 0
            || self.random_forest.n_trees == 0
            || self.boosted_trees.n_estimators == 0
        {
            bail!("Estimator counts must be at least 1");
        }
        Ok(())
    }
}
