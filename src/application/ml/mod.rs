//! Lap-time regressors, training, evaluation and prediction.

pub mod boosted_trees;
pub mod evaluator;
pub mod gradient_boosting;
pub mod predictor;
pub mod random_forest;
pub mod regressor;
pub mod trainer;

pub use evaluator::{EvaluationScore, evaluate};
pub use predictor::{ModelPrediction, PredictionRow, predict};
pub use regressor::{FittedRegressor, Regressor, TrainedModel};
pub use trainer::{ModelTrainer, TrainingRun};
