use super::regressor::{FittedRegressor, Regressor, check_training_shape, to_dense_matrix};
use crate::domain::errors::ModelError;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use tracing::debug;

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Least-squares gradient boosting: each stage fits a shallow smartcore
/// regression tree to the current residuals.
pub struct GradientBoostingModel {
    params: GradientBoostingParams,
}

impl GradientBoostingModel {
    pub const NAME: &'static str = "Gradient Boosting";

    pub fn new(params: GradientBoostingParams) -> Self {
        Self { params }
    }

    fn tree_parameters(&self) -> DecisionTreeRegressorParameters {
        DecisionTreeRegressorParameters::default()
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split)
            .with_min_samples_leaf(self.params.min_samples_leaf)
    }
}

impl Regressor for GradientBoostingModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[f64],
    ) -> Result<Box<dyn FittedRegressor>, ModelError> {
        check_training_shape(features, labels)?;
        let x = to_dense_matrix(Self::NAME, features)?;
        let fit_error = |reason: String| ModelError::Fit {
            model: Self::NAME.to_string(),
            reason,
        };

        let initial = labels.iter().sum::<f64>() / labels.len() as f64;
        let mut current = vec![initial; labels.len()];
        let mut stages: Vec<Tree> = Vec::with_capacity(self.params.n_estimators);

        for stage in 0..self.params.n_estimators {
            let residuals: Vec<f64> = labels
                .iter()
                .zip(current.iter())
                .map(|(y, f)| y - f)
                .collect();

            // Perfect fit on the training rows: further stages would add zero trees.
            if residuals.iter().all(|r| r.abs() < 1e-12) {
                debug!(
                    "{}: residuals vanished after {} stages",
                    Self::NAME,
                    stage
                );
                break;
            }

            let tree = DecisionTreeRegressor::fit(&x, &residuals, self.tree_parameters())
                .map_err(|e| fit_error(e.to_string()))?;
            let step: Vec<f64> = tree.predict(&x).map_err(|e| fit_error(e.to_string()))?;

            for (f, s) in current.iter_mut().zip(step.iter()) {
                *f += self.params.learning_rate * s;
            }
            stages.push(tree);
        }

        debug!(
            "{}: fitted {} stages on {} rows",
            Self::NAME,
            stages.len(),
            labels.len()
        );

        Ok(Box::new(FittedGradientBoosting {
            initial,
            learning_rate: self.params.learning_rate,
            stages,
        }))
    }
}

struct FittedGradientBoosting {
    initial: f64,
    learning_rate: f64,
    stages: Vec<Tree>,
}

impl FittedRegressor for FittedGradientBoosting {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let x = to_dense_matrix(GradientBoostingModel::NAME, features)?;
        let mut out = vec![self.initial; features.len()];
        for tree in &self.stages {
            let step: Vec<f64> = tree.predict(&x).map_err(|e| ModelError::Predict {
                model: GradientBoostingModel::NAME.to_string(),
                reason: e.to_string(),
            })?;
            for (o, s) in out.iter_mut().zip(step.iter()) {
                *o += self.learning_rate * s;
            }
        }
        Ok(out)
    }
}
