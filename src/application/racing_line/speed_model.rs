use crate::application::ml::random_forest::{RandomForestModel, RandomForestParams};
use crate::application::ml::{Regressor, TrainedModel};
use crate::domain::errors::PipelineError;
use crate::domain::ml::dataset::MIN_TRAINING_EXAMPLES;
use crate::domain::telemetry::{DrsStatus, LapTelemetry};
use serde::Serialize;
use tracing::info;

pub const SPEED_MODEL_NAME: &str = "Racing Line Speed";

/// A historical sample with the model's speed estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedPoint {
    pub year: i32,
    pub x: f64,
    pub y: f64,
    pub gear: u8,
    pub drs_status: DrsStatus,
    /// Recorded speed, km/h.
    pub speed: f64,
    pub predicted_speed: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictedLine {
    pub model: String,
    pub seasons: Vec<i32>,
    pub points: Vec<PredictedPoint>,
}

/// Fits speed on (x, y, gear) over every historical lap and predicts the
/// speed at each of their samples.
pub fn predict_racing_line(
    history: &[LapTelemetry],
    params: RandomForestParams,
) -> Result<PredictedLine, PipelineError> {
    let samples: Vec<(i32, &_)> = history
        .iter()
        .flat_map(|lap| lap.samples.iter().map(move |s| (lap.year, s)))
        .collect();

    if samples.len() < MIN_TRAINING_EXAMPLES {
        return Err(PipelineError::InsufficientData {
            available: samples.len(),
            required: MIN_TRAINING_EXAMPLES,
        });
    }

    let features: Vec<Vec<f64>> = samples.iter().map(|(_, s)| s.position_features()).collect();
    let labels: Vec<f64> = samples.iter().map(|(_, s)| s.speed).collect();

    let regressor = RandomForestModel::named(SPEED_MODEL_NAME, params);
    let model = TrainedModel::new(SPEED_MODEL_NAME, regressor.fit(&features, &labels)?);
    let predicted = model.predict(&features)?;

    let mut seasons: Vec<i32> = history.iter().map(|lap| lap.year).collect();
    seasons.sort_unstable();
    seasons.dedup();

    info!(
        "RacingLine: speed model fitted on {} samples from seasons {:?}",
        samples.len(),
        seasons
    );

    Ok(PredictedLine {
        model: model.name().to_string(),
        seasons,
        points: samples
            .iter()
            .zip(predicted)
            .map(|((year, s), predicted_speed)| PredictedPoint {
                year: *year,
                x: s.x,
                y: s.y,
                gear: s.gear,
                drs_status: s.drs_status(),
                speed: s.speed,
                predicted_speed,
            })
            .collect(),
    })
}
