// Regressors, training, evaluation and prediction
pub mod ml;

// Lap-time forecasting pipeline
pub mod race;

// Fastest-lap telemetry views and the speed model
pub mod racing_line;
