use super::regressor::{FittedRegressor, Regressor, check_training_shape, to_dense_matrix};
use crate::domain::errors::ModelError;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

/// Bootstrap-aggregated regression trees (smartcore).
pub struct RandomForestModel {
    name: String,
    params: RandomForestParams,
}

impl RandomForestModel {
    pub const NAME: &'static str = "Random Forest";

    pub fn new(params: RandomForestParams) -> Self {
        Self::named(Self::NAME, params)
    }

    pub fn named(name: impl Into<String>, params: RandomForestParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

impl Regressor for RandomForestModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[f64],
    ) -> Result<Box<dyn FittedRegressor>, ModelError> {
        let width = check_training_shape(features, labels)?;
        let x = to_dense_matrix(&self.name, features)?;
        let y: Vec<f64> = labels.to_vec();

        let mut params = RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_min_samples_split(self.params.min_samples_split)
            .with_min_samples_leaf(self.params.min_samples_leaf)
            .with_m(width)
            .with_seed(self.params.seed);
        if let Some(depth) = self.params.max_depth {
            params = params.with_max_depth(depth);
        }

        debug!(
            "{}: fitting {} trees on {} rows x {} features",
            self.name,
            self.params.n_trees,
            labels.len(),
            width
        );

        let model = RandomForestRegressor::fit(&x, &y, params).map_err(|e| ModelError::Fit {
            model: self.name.clone(),
            reason: e.to_string(),
        })?;

        Ok(Box::new(FittedRandomForest {
            name: self.name.clone(),
            model,
        }))
    }
}

struct FittedRandomForest {
    name: String,
    model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

impl FittedRegressor for FittedRandomForest {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let x = to_dense_matrix(&self.name, features)?;
        self.model.predict(&x).map_err(|e| ModelError::Predict {
            model: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_forest_tracks_step_function() {
        let features: Vec<Vec<f64>> = (0..60).map(|i| vec![i as f64]).collect();
        let labels: Vec<f64> = (0..60).map(|i| if i < 30 { 90.0 } else { 95.0 }).collect();

        let model = RandomForestModel::new(RandomForestParams {
            n_trees: 20,
            ..Default::default()
        });
        let fitted = model.fit(&features, &labels).unwrap();
        let preds = fitted.predict(&[vec![5.0], vec![55.0]]).unwrap();

        assert!((preds[0] - 90.0).abs() < 1.0, "low side {}", preds[0]);
        assert!((preds[1] - 95.0).abs() < 1.0, "high side {}", preds[1]);
    }

    #[test]
    fn test_random_forest_rejects_bad_shape() {
        let model = RandomForestModel::new(RandomForestParams::default());
        assert!(model.fit(&[vec![1.0]], &[1.0, 2.0]).is_err());
    }
}
