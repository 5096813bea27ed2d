//! Race lap-time forecasting: dataset construction and the end-to-end run.

pub mod dataset_builder;
pub mod pipeline;

pub use dataset_builder::{DatasetBuilder, DatasetOutcome, EmptyReason, JoinStats, RaceDataset, join_laps};
pub use pipeline::{PipelineOutcome, PredictionReport, PredictionRequest, RacePredictionPipeline};
