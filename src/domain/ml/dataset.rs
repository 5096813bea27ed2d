use crate::domain::errors::PipelineError;
use crate::domain::session::DriverCode;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Ordered feature names of the lap-time model.
/// Any change here changes what the regressors are trained on.
pub const LAP_TIME_FEATURES: &[&str] = &["best_time_seconds"];

/// Ordered feature names of the racing-line speed model.
pub const RACING_LINE_FEATURES: &[&str] = &["x", "y", "gear"];

/// Fewest training rows a regressor is ever fitted on.
pub const MIN_TRAINING_EXAMPLES: usize = 2;

/// A race lap joined to its driver's qualifying best time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub driver: DriverCode,
    pub lap_number: u32,
    /// Qualifying best time (feature).
    pub best_time_seconds: f64,
    /// Race lap duration (label).
    pub lap_time_seconds: f64,
}

impl TrainingExample {
    pub fn features(&self) -> Vec<f64> {
        vec![self.best_time_seconds]
    }
}

/// Train / held-out partition shared by every regressor of a run.
#[derive(Debug, Clone, Default)]
pub struct DatasetSplit {
    pub train: Vec<TrainingExample>,
    pub test: Vec<TrainingExample>,
}

impl DatasetSplit {
    pub fn train_features(&self) -> Vec<Vec<f64>> {
        self.train.iter().map(TrainingExample::features).collect()
    }

    pub fn train_labels(&self) -> Vec<f64> {
        self.train.iter().map(|e| e.lap_time_seconds).collect()
    }

    pub fn test_features(&self) -> Vec<Vec<f64>> {
        self.test.iter().map(TrainingExample::features).collect()
    }

    pub fn test_labels(&self) -> Vec<f64> {
        self.test.iter().map(|e| e.lap_time_seconds).collect()
    }
}

fn test_size(n: usize, test_fraction: f64) -> usize {
    (n as f64 * test_fraction).ceil() as usize
}

/// Smallest example count that leaves `MIN_TRAINING_EXAMPLES` training rows
/// and at least one held-out row.
pub fn minimum_examples(test_fraction: f64) -> usize {
    (MIN_TRAINING_EXAMPLES + 1..10_000)
        .find(|&n| {
            let test = test_size(n, test_fraction);
            test >= 1 && n.saturating_sub(test) >= MIN_TRAINING_EXAMPLES
        })
        .unwrap_or(usize::MAX)
}

/// Shuffles with a fixed seed and holds out `ceil(n * test_fraction)` rows.
pub fn train_test_split(
    examples: &[TrainingExample],
    test_fraction: f64,
    seed: u64,
) -> Result<DatasetSplit, PipelineError> {
    let n = examples.len();
    let required = minimum_examples(test_fraction);
    if n < required {
        return Err(PipelineError::InsufficientData {
            available: n,
            required,
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = test_size(n, test_fraction);
    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(DatasetSplit {
        train: train_idx.iter().map(|&i| examples[i].clone()).collect(),
        test: test_idx.iter().map(|&i| examples[i].clone()).collect(),
    })
}
