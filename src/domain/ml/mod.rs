pub mod dataset;
pub mod metrics;

pub use dataset::{DatasetSplit, TrainingExample, train_test_split};
pub use metrics::{PercentageError, mean_absolute_percentage_error};
