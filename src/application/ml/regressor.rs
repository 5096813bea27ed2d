use crate::domain::errors::ModelError;
use smartcore::linalg::basic::matrix::DenseMatrix;

/// A regressor configuration that can be fitted on a feature matrix.
pub trait Regressor: Send + Sync {
    /// Human-readable model name ("Random Forest").
    fn name(&self) -> &str;

    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[f64],
    ) -> Result<Box<dyn FittedRegressor>, ModelError>;
}

/// A fitted regressor.
pub trait FittedRegressor: Send + Sync {
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError>;
}

/// A fitted regressor paired with its display name.
pub struct TrainedModel {
    name: String,
    regressor: Box<dyn FittedRegressor>,
}

impl TrainedModel {
    pub fn new(name: impl Into<String>, regressor: Box<dyn FittedRegressor>) -> Self {
        Self {
            name: name.into(),
            regressor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let predicted = self.regressor.predict(features)?;
        if predicted.len() != features.len() {
            return Err(ModelError::Shape {
                features: features.len(),
                labels: predicted.len(),
            });
        }
        Ok(predicted)
    }

    pub fn predict_one(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.predict(&[features.to_vec()])?
            .first()
            .copied()
            .ok_or_else(|| ModelError::Predict {
                model: self.name.clone(),
                reason: "No prediction returned".to_string(),
            })
    }
}

impl std::fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainedModel")
            .field("name", &self.name)
            .field("regressor", &"<fitted>")
            .finish()
    }
}

/// Rejects empty, ragged or label-mismatched training data.
pub fn check_training_shape(features: &[Vec<f64>], labels: &[f64]) -> Result<usize, ModelError> {
    if features.is_empty() || features.len() != labels.len() {
        return Err(ModelError::Shape {
            features: features.len(),
            labels: labels.len(),
        });
    }
    let width = features[0].len();
    if width == 0 || features.iter().any(|row| row.len() != width) {
        return Err(ModelError::Shape {
            features: features.len(),
            labels: labels.len(),
        });
    }
    Ok(width)
}

/// Builds a smartcore matrix, tagging failures with the model name.
pub fn to_dense_matrix(model: &str, features: &[Vec<f64>]) -> Result<DenseMatrix<f64>, ModelError> {
    let rows: Vec<Vec<f64>> = features.to_vec();
    DenseMatrix::from_2d_vec(&rows).map_err(|e| ModelError::Predict {
        model: model.to_string(),
        reason: format!("Matrix error: {}", e),
    })
}
