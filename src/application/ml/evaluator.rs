use super::regressor::TrainedModel;
use crate::domain::errors::PipelineError;
use crate::domain::ml::TrainingExample;
use crate::domain::ml::metrics::{
    mean_absolute_error, mean_absolute_percentage_error, root_mean_squared_error,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Held-out error of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScore {
    pub model: String,
    /// Mean absolute percentage error (0-100). `None` when undefined.
    pub mape: Option<f64>,
    /// Seconds
    pub mae: Option<f64>,
    /// Seconds
    pub rmse: Option<f64>,
    pub scored: usize,
    pub excluded: usize,
}

impl EvaluationScore {
    pub fn is_defined(&self) -> bool {
        self.mape.is_some()
    }
}

/// Scores each model against the held-out examples.
///
/// Zero labels never produce an infinite score: they are excluded, and a model
/// with nothing left to score gets an undefined MAPE and a warning.
pub fn evaluate(
    models: &[TrainedModel],
    held_out: &[TrainingExample],
) -> Result<Vec<EvaluationScore>, PipelineError> {
    let features: Vec<Vec<f64>> = held_out.iter().map(TrainingExample::features).collect();
    let labels: Vec<f64> = held_out.iter().map(|e| e.lap_time_seconds).collect();

    models
        .iter()
        .map(|model| -> Result<EvaluationScore, PipelineError> {
            let predicted = model.predict(&features)?;
            let mape = mean_absolute_percentage_error(&labels, &predicted);

            match &mape {
                Some(m) => {
                    info!(
                        "Evaluator: {} MAPE={:.3}% over {} held-out laps",
                        model.name(),
                        m.value,
                        m.scored
                    );
                    if m.excluded > 0 {
                        warn!(
                            "Evaluator: {} excluded {} held-out laps with a zero label or invalid prediction",
                            model.name(),
                            m.excluded
                        );
                    }
                }
                None => {
                    let undefined = PipelineError::UndefinedMetric {
                        model: model.name().to_string(),
                    };
                    warn!("Evaluator: {}", undefined);
                }
            }

            Ok(EvaluationScore {
                model: model.name().to_string(),
                mape: mape.map(|m| m.value),
                mae: mean_absolute_error(&labels, &predicted),
                rmse: root_mean_squared_error(&labels, &predicted),
                scored: mape.map_or(0, |m| m.scored),
                excluded: mape.map_or(labels.len(), |m| m.excluded),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::regressor::FittedRegressor;
    use crate::domain::errors::ModelError;
    use crate::domain::session::DriverCode;

    struct Offset(f64);

    impl FittedRegressor for Offset {
        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
            Ok(features.iter().map(|r| r[0] + self.0).collect())
        }
    }

    fn example(feature: f64, label: f64) -> TrainingExample {
        TrainingExample {
            driver: DriverCode::new("AAA").unwrap(),
            lap_number: 1,
            best_time_seconds: feature,
            lap_time_seconds: label,
        }
    }

    #[test]
    fn test_scores_one_entry_per_model() {
        let models = vec![
            TrainedModel::new("exact", Box::new(Offset(0.0))),
            TrainedModel::new("plus ten", Box::new(Offset(10.0))),
        ];
        let held_out = vec![example(100.0, 100.0), example(50.0, 50.0)];

        let scores = evaluate(&models, &held_out).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].mape, Some(0.0));
        let plus_ten = scores[1].mape.unwrap();
        assert!((plus_ten - 15.0).abs() < 1e-9);
        assert_eq!(scores[1].mae, Some(10.0));
    }

    #[test]
    fn test_zero_labels_are_undefined_not_infinite() {
        let models = vec![TrainedModel::new("exact", Box::new(Offset(1.0)))];
        let scores = evaluate(&models, &[example(0.0, 0.0)]).unwrap();
        assert_eq!(scores[0].mape, None);
        assert!(!scores[0].is_defined());
        assert_eq!(scores[0].excluded, 1);
    }
}
