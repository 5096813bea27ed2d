use super::regressor::TrainedModel;
use crate::domain::errors::PipelineError;
use crate::domain::session::{DriverCode, QualifyingResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub model: String,
    pub lap_time_seconds: f64,
}

/// Forecast race lap time of one driver, one value per model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub driver: DriverCode,
    pub full_name: String,
    pub qualifying_time_seconds: f64,
    /// False when the qualifying time is the no-time penalty value.
    pub set_qualifying_time: bool,
    pub predictions: Vec<ModelPrediction>,
}

impl PredictionRow {
    pub fn prediction_for(&self, model: &str) -> Option<f64> {
        self.predictions
            .iter()
            .find(|p| p.model == model)
            .map(|p| p.lap_time_seconds)
    }
}

/// Applies every model to each driver's qualifying best time.
///
/// Rows come back in qualifying order (fastest first, ties by driver code).
pub fn predict(
    models: &[TrainedModel],
    qualifying: &[QualifyingResult],
) -> Result<Vec<PredictionRow>, PipelineError> {
    let mut ordered: Vec<&QualifyingResult> = qualifying.iter().collect();
    ordered.sort_by(|a, b| {
        a.best_time_seconds
            .partial_cmp(&b.best_time_seconds)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.driver.cmp(&b.driver))
    });

    let features: Vec<Vec<f64>> = ordered.iter().map(|q| vec![q.best_time_seconds]).collect();

    let mut per_model: Vec<(&str, Vec<f64>)> = Vec::with_capacity(models.len());
    for model in models {
        per_model.push((model.name(), model.predict(&features)?));
    }

    Ok(ordered
        .iter()
        .enumerate()
        .map(|(i, q)| PredictionRow {
            driver: q.driver.clone(),
            full_name: q.full_name.clone(),
            qualifying_time_seconds: q.best_time_seconds,
            set_qualifying_time: q.set_time,
            predictions: per_model
                .iter()
                .map(|(name, values)| ModelPrediction {
                    model: name.to_string(),
                    lap_time_seconds: values[i],
                })
                .collect(),
        })
        .collect())
}
