use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Labels with a magnitude below this are treated as zero.
pub const ZERO_LABEL_EPSILON: f64 = 1e-9;

/// Mean absolute percentage error over the rows that could be scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentageError {
    /// 0-100 scale.
    pub value: f64,
    pub scored: usize,
    /// Rows skipped for a zero label or a non-finite prediction.
    pub excluded: usize,
}

/// MAPE on a 0-100 scale.
///
/// Rows whose label is zero or whose prediction is not finite are excluded.
/// Returns `None` when no row is left to score.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Option<PercentageError> {
    let ratios: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| a.is_finite() && a.abs() > ZERO_LABEL_EPSILON && p.is_finite())
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();

    let total = actual.len().min(predicted.len());
    if ratios.is_empty() {
        return None;
    }

    Some(PercentageError {
        value: ratios.iter().mean() * 100.0,
        scored: ratios.len(),
        excluded: total - ratios.len(),
    })
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| a.is_finite() && p.is_finite())
        .map(|(a, p)| (a - p).abs())
        .collect();
    if errors.is_empty() {
        None
    } else {
        Some(errors.iter().mean())
    }
}

pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let squared: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| a.is_finite() && p.is_finite())
        .map(|(a, p)| (a - p).powi(2))
        .collect();
    if squared.is_empty() {
        None
    } else {
        Some(squared.iter().mean().sqrt())
    }
}
