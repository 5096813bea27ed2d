use super::boosted_trees::{BoostedTreesModel, BoostedTreesParams};
use super::gradient_boosting::{GradientBoostingModel, GradientBoostingParams};
use super::random_forest::{RandomForestModel, RandomForestParams};
use super::regressor::{Regressor, TrainedModel};
use crate::domain::errors::PipelineError;
use crate::domain::ml::{DatasetSplit, TrainingExample, train_test_split};
use tracing::info;

/// Fitted models of one run together with the split they were trained on.
#[derive(Debug)]
pub struct TrainingRun {
    pub models: Vec<TrainedModel>,
    pub split: DatasetSplit,
}

/// Fits every configured regressor on one shared train/test split.
pub struct ModelTrainer {
    regressors: Vec<Box<dyn Regressor>>,
    test_fraction: f64,
    seed: u64,
}

impl ModelTrainer {
    pub fn new(regressors: Vec<Box<dyn Regressor>>, test_fraction: f64, seed: u64) -> Self {
        Self {
            regressors,
            test_fraction,
            seed,
        }
    }

    /// Gradient Boosting, Random Forest and XGBoost-style trees.
    pub fn standard(
        gradient_boosting: GradientBoostingParams,
        random_forest: RandomForestParams,
        boosted_trees: BoostedTreesParams,
        test_fraction: f64,
        seed: u64,
    ) -> Self {
        Self::new(
            vec![
                Box::new(GradientBoostingModel::new(gradient_boosting)),
                Box::new(RandomForestModel::new(random_forest)),
                Box::new(BoostedTreesModel::new(boosted_trees)),
            ],
            test_fraction,
            seed,
        )
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.regressors.iter().map(|r| r.name()).collect()
    }

    /// Splits the examples and fits every regressor on the training part.
    ///
    /// Fails with `InsufficientData` before any regressor is invoked when the
    /// split cannot leave enough rows on both sides.
    pub fn train(&self, examples: &[TrainingExample]) -> Result<TrainingRun, PipelineError> {
        let split = train_test_split(examples, self.test_fraction, self.seed)?;
        let models = self.train_on_split(&split)?;
        Ok(TrainingRun { models, split })
    }

    pub fn train_on_split(&self, split: &DatasetSplit) -> Result<Vec<TrainedModel>, PipelineError> {
        let features = split.train_features();
        let labels = split.train_labels();

        info!(
            "ModelTrainer: training {} models on {} samples ({} held out)",
            self.regressors.len(),
            labels.len(),
            split.test.len()
        );

        self.regressors
            .iter()
            .map(|regressor| -> Result<TrainedModel, PipelineError> {
                let fitted = regressor.fit(&features, &labels)?;
                info!("ModelTrainer: {} trained", regressor.name());
                Ok(TrainedModel::new(regressor.name(), fitted))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::DriverCode;

    fn examples(n: usize) -> Vec<TrainingExample> {
        (0..n)
            .map(|i| TrainingExample {
                driver: DriverCode::new(format!("D{:02}", i % 5)).unwrap(),
                lap_number: (i / 5) as u32 + 1,
                best_time_seconds: 80.0 + (i % 5) as f64 * 0.4,
                lap_time_seconds: 84.0 + (i % 5) as f64 * 0.5 + (i % 3) as f64 * 0.1,
            })
            .collect()
    }

    fn small_trainer() -> ModelTrainer {
        ModelTrainer::standard(
            GradientBoostingParams {
                n_estimators: 20,
                ..Default::default()
            },
            RandomForestParams {
                n_trees: 10,
                ..Default::default()
            },
            BoostedTreesParams {
                n_estimators: 20,
                ..Default::default()
            },
            0.2,
            42,
        )
    }

    #[test]
    fn test_standard_trainer_produces_three_named_models() {
        let run = small_trainer().train(&examples(100)).unwrap();
        let names: Vec<&str> = run.models.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Gradient Boosting", "Random Forest", "XGBoost"]);
        assert_eq!(run.split.train.len(), 80);
        assert_eq!(run.split.test.len(), 20);
    }

    #[test]
    fn test_insufficient_examples_short_circuit() {
        let result = small_trainer().train(&examples(2));
        assert!(matches!(
            result,
            Err(PipelineError::InsufficientData { available: 2, .. })
        ));
        assert!(small_trainer().train(&[]).is_err());
    }
}
