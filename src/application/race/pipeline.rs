use super::dataset_builder::{DatasetBuilder, DatasetOutcome};
use crate::application::ml::{EvaluationScore, ModelTrainer, PredictionRow, evaluate, predict};
use crate::config::ModelEnvConfig;
use crate::domain::errors::{PipelineError, SessionDataError};
use crate::domain::ml::dataset::minimum_examples;
use crate::domain::ports::SessionDataProvider;
use crate::domain::session::{RaceRound, RoundSelector};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// What the user asked to forecast.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub target_year: i32,
    /// Season whose race laps train the models. Defaults to the year before.
    pub prior_year: Option<i32>,
    pub round: RoundSelector,
}

impl PredictionRequest {
    pub fn prior_year(&self) -> i32 {
        self.prior_year.unwrap_or(self.target_year - 1)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Completed {
        scores: Vec<EvaluationScore>,
        rows: Vec<PredictionRow>,
        training_examples: usize,
        held_out_examples: usize,
    },
    DataUnavailable {
        reason: String,
    },
    InsufficientData {
        available: usize,
        required: usize,
    },
}

/// Result of one pipeline run, ready for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub target: Option<RaceRound>,
    pub prior: Option<RaceRound>,
    pub event_name: Option<String>,
    pub outcome: PipelineOutcome,
    pub warnings: Vec<String>,
}

impl PredictionReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Completed { .. })
    }
}

/// Fetch, build, split, train, evaluate and predict for one round.
pub struct RacePredictionPipeline {
    provider: Arc<dyn SessionDataProvider>,
    builder: DatasetBuilder,
    trainer: ModelTrainer,
    test_fraction: f64,
}

impl RacePredictionPipeline {
    pub fn new(provider: Arc<dyn SessionDataProvider>, config: &ModelEnvConfig) -> Self {
        let trainer = ModelTrainer::standard(
            config.gradient_boosting.clone(),
            config.random_forest.clone(),
            config.boosted_trees.clone(),
            config.test_fraction,
            config.split_seed,
        );
        Self::with_trainer(provider, config, trainer)
    }

    pub fn with_trainer(
        provider: Arc<dyn SessionDataProvider>,
        config: &ModelEnvConfig,
        trainer: ModelTrainer,
    ) -> Self {
        Self {
            builder: DatasetBuilder::new(provider.clone(), config.sentinel_penalty_secs),
            provider,
            trainer,
            test_fraction: config.test_fraction,
        }
    }

    /// Runs the pipeline. Missing data and small datasets come back as
    /// outcomes; only a regressor failure is an error.
    pub async fn run(&self, request: &PredictionRequest) -> Result<PredictionReport, PipelineError> {
        let mut report = PredictionReport {
            target: None,
            prior: None,
            event_name: None,
            outcome: PipelineOutcome::DataUnavailable {
                reason: String::new(),
            },
            warnings: Vec::new(),
        };

        let (prior, target) = match self.resolve_rounds(request, &mut report).await {
            Ok(rounds) => rounds,
            Err(e) => return Ok(unavailable(report, e)),
        };
        report.prior = Some(prior);
        report.target = Some(target);
        info!(
            "RacePredictionPipeline: qualifying {} against race laps {}",
            target, prior
        );

        let dataset = match self.builder.build_dataset_for_rounds(prior, target).await {
            DatasetOutcome::Ready(dataset) => dataset,
            DatasetOutcome::Empty { reason, .. } => {
                let required = minimum_examples(self.test_fraction);
                report.warnings.push(format!(
                    "No training data: {}. At least {} laps are needed.",
                    reason, required
                ));
                report.outcome = PipelineOutcome::InsufficientData {
                    available: 0,
                    required,
                };
                return Ok(report);
            }
            DatasetOutcome::Unavailable(e) => return Ok(unavailable(report, e)),
        };

        for q in dataset.qualifying.iter().filter(|q| !q.set_time) {
            report.warnings.push(format!(
                "{} set no qualifying time; ranked last with {:.3}s",
                q.driver, q.best_time_seconds
            ));
        }

        let run = match self.trainer.train(&dataset.examples) {
            Ok(run) => run,
            Err(PipelineError::InsufficientData {
                available,
                required,
            }) => {
                warn!(
                    "RacePredictionPipeline: {} examples, {} required",
                    available, required
                );
                report.warnings.push(format!(
                    "Insufficient data: {} training laps, at least {} required",
                    available, required
                ));
                report.outcome = PipelineOutcome::InsufficientData {
                    available,
                    required,
                };
                return Ok(report);
            }
            Err(e) => return Err(e),
        };

        let scores = evaluate(&run.models, &run.split.test)?;
        for score in scores.iter().filter(|s| !s.is_defined()) {
            report.warnings.push(
                PipelineError::UndefinedMetric {
                    model: score.model.clone(),
                }
                .to_string(),
            );
        }

        let rows = predict(&run.models, &dataset.qualifying)?;
        info!(
            "RacePredictionPipeline: {} prediction rows from {} models",
            rows.len(),
            run.models.len()
        );

        report.outcome = PipelineOutcome::Completed {
            scores,
            rows,
            training_examples: run.split.train.len(),
            held_out_examples: run.split.test.len(),
        };
        Ok(report)
    }

    async fn resolve_rounds(
        &self,
        request: &PredictionRequest,
        report: &mut PredictionReport,
    ) -> Result<(RaceRound, RaceRound), SessionDataError> {
        let prior_year = request.prior_year();

        match &request.round {
            RoundSelector::Number(n) => {
                let target = RaceRound::new(request.target_year, *n)?;
                let prior = RaceRound::new(prior_year, *n)?;
                // The name is only for display; a missing schedule is not fatal.
                if let Ok(schedule) = self.provider.get_schedule(request.target_year).await {
                    report.event_name = schedule
                        .iter()
                        .find(|e| e.round == *n)
                        .map(|e| e.event_name.clone());
                }
                Ok((prior, target))
            }
            RoundSelector::EventName(_) => {
                let target_schedule = self.provider.get_schedule(request.target_year).await?;
                let target = request.round.resolve(request.target_year, &target_schedule)?;
                let event_name = target_schedule
                    .iter()
                    .find(|e| e.round == target.round())
                    .map(|e| e.event_name.clone());

                let prior_schedule = self.provider.get_schedule(prior_year).await?;
                let by_name = event_name
                    .clone()
                    .map(RoundSelector::EventName)
                    .unwrap_or_else(|| request.round.clone());
                let prior = by_name.resolve(prior_year, &prior_schedule)?;

                if prior.round() != target.round() {
                    info!(
                        "RacePredictionPipeline: event is round {} in {} and round {} in {}",
                        prior.round(),
                        prior_year,
                        target.round(),
                        request.target_year
                    );
                }
                report.event_name = event_name;
                Ok((prior, target))
            }
        }
    }
}

fn unavailable(mut report: PredictionReport, error: SessionDataError) -> PredictionReport {
    warn!("RacePredictionPipeline: {}", error);
    let error = PipelineError::from(error);
    report.warnings.push(error.to_string());
    report.outcome = PipelineOutcome::DataUnavailable {
        reason: error.to_string(),
    };
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::EventInfo;
    use crate::infrastructure::mock::MockSessionProvider;

    fn fast_config() -> ModelEnvConfig {
        let mut config = ModelEnvConfig::default();
        config.gradient_boosting.n_estimators = 20;
        config.random_forest.n_trees = 10;
        config.boosted_trees.n_estimators = 20;
        config
    }

    #[tokio::test]
    async fn test_event_name_resolves_per_season() {
        let prior = RaceRound::new(2023, 6).unwrap();
        let target = RaceRound::new(2024, 8).unwrap();
        let provider = MockSessionProvider::new()
            .with_schedule(2023, vec![EventInfo::new(6, "Monaco Grand Prix")])
            .with_schedule(
                2024,
                vec![
                    EventInfo::new(7, "Emilia Romagna Grand Prix"),
                    EventInfo::new(8, "Monaco Grand Prix"),
                ],
            )
            .with_synthetic_round(target, 6, 10)
            .with_synthetic_round(prior, 6, 10);

        let pipeline = RacePredictionPipeline::new(Arc::new(provider), &fast_config());
        let request = PredictionRequest {
            target_year: 2024,
            prior_year: None,
            round: "monaco".parse().unwrap(),
        };

        let report = pipeline.run(&request).await.unwrap();
        assert_eq!(report.prior, Some(prior));
        assert_eq!(report.target, Some(target));
        assert_eq!(report.event_name.as_deref(), Some("Monaco Grand Prix"));
        assert!(report.is_completed());
    }

    #[tokio::test]
    async fn test_unknown_event_is_data_unavailable() {
        let provider = MockSessionProvider::new()
            .with_schedule(2024, vec![EventInfo::new(1, "Bahrain Grand Prix")]);
        let pipeline = RacePredictionPipeline::new(Arc::new(provider), &fast_config());
        let request = PredictionRequest {
            target_year: 2024,
            prior_year: Some(2023),
            round: "Atlantis".parse().unwrap(),
        };

        let report = pipeline.run(&request).await.unwrap();
        assert!(matches!(report.outcome, PipelineOutcome::DataUnavailable { .. }));
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_two_laps_is_insufficient() {
        let target = RaceRound::new(2024, 1).unwrap();
        let prior = RaceRound::new(2023, 1).unwrap();
        let (qualifying, laps) = crate::infrastructure::mock::synthetic_round(target, 2, 1);
        let provider = MockSessionProvider::new()
            .with_qualifying(target, qualifying)
            .with_race_laps(prior, laps);

        let pipeline = RacePredictionPipeline::new(Arc::new(provider), &fast_config());
        let request = PredictionRequest {
            target_year: 2024,
            prior_year: None,
            round: RoundSelector::Number(1),
        };

        let report = pipeline.run(&request).await.unwrap();
        assert!(matches!(
            report.outcome,
            PipelineOutcome::InsufficientData {
                available: 2,
                required: 3
            }
        ));
    }
}
