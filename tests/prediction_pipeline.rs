use racecast::application::race::{PipelineOutcome, PredictionRequest, RacePredictionPipeline};
use racecast::config::ModelEnvConfig;
use racecast::domain::session::{
    DriverCode, EventInfo, LapTime, QualifyingEntry, RaceRound, RoundSelector, derive_best_times,
};
use racecast::infrastructure::mock::MockSessionProvider;
use std::sync::Arc;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

fn entry(code: &str, q1: Option<f64>, q2: Option<f64>, q3: Option<f64>) -> QualifyingEntry {
    QualifyingEntry {
        driver: DriverCode::new(code).unwrap(),
        full_name: format!("Driver {}", code),
        q1: q1.and_then(LapTime::from_seconds),
        q2: q2.and_then(LapTime::from_seconds),
        q3: q3.and_then(LapTime::from_seconds),
    }
}

#[tokio::test]
async fn test_full_grid_produces_three_models() -> anyhow::Result<()> {
    init_logging();

    let target = RaceRound::new(2024, 5)?;
    let prior = RaceRound::new(2023, 5)?;
    let provider = MockSessionProvider::new()
        .with_schedule(2024, vec![EventInfo::new(5, "Miami Grand Prix")])
        .with_synthetic_round(target, 10, 50)
        .with_synthetic_round(prior, 10, 50);

    let pipeline = RacePredictionPipeline::new(Arc::new(provider), &ModelEnvConfig::default());
    let request = PredictionRequest {
        target_year: 2024,
        prior_year: None,
        round: RoundSelector::Number(5),
    };

    let report = pipeline.run(&request).await?;
    assert_eq!(report.event_name.as_deref(), Some("Miami Grand Prix"));

    let PipelineOutcome::Completed {
        scores,
        rows,
        training_examples,
        held_out_examples,
    } = &report.outcome
    else {
        panic!("expected a completed run, got {:?}", report.outcome);
    };

    assert_eq!(*training_examples, 400);
    assert_eq!(*held_out_examples, 100);

    let names: Vec<&str> = scores.iter().map(|s| s.model.as_str()).collect();
    assert_eq!(names, vec!["Gradient Boosting", "Random Forest", "XGBoost"]);
    for score in scores {
        let mape = score.mape.expect("defined score");
        assert!((0.0..100.0).contains(&mape), "{} MAPE {}", score.model, mape);
    }

    assert_eq!(rows.len(), 10);
    for row in rows {
        assert_eq!(row.predictions.len(), 3);
        assert!(row.predictions.iter().all(|p| p.lap_time_seconds.is_finite()));
    }
    let ordered = rows
        .windows(2)
        .all(|w| w[0].qualifying_time_seconds <= w[1].qualifying_time_seconds);
    assert!(ordered);

    Ok(())
}

#[tokio::test]
async fn test_no_race_laps_is_insufficient_data() -> anyhow::Result<()> {
    init_logging();

    let target = RaceRound::new(2024, 1)?;
    let prior = RaceRound::new(2023, 1)?;
    let provider = MockSessionProvider::new()
        .with_qualifying(
            target,
            vec![
                entry("AAA", None, None, Some(80.0)),
                entry("BBB", None, None, Some(81.5)),
            ],
        )
        .with_race_laps(prior, Vec::new());

    let pipeline = RacePredictionPipeline::new(Arc::new(provider), &ModelEnvConfig::default());
    let report = pipeline
        .run(&PredictionRequest {
            target_year: 2024,
            prior_year: Some(2023),
            round: RoundSelector::Number(1),
        })
        .await?;

    assert!(matches!(
        report.outcome,
        PipelineOutcome::InsufficientData { available: 0, .. }
    ));
    assert!(!report.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_upstream_outage_is_data_unavailable() -> anyhow::Result<()> {
    let provider = MockSessionProvider::new().failing_year(2024);
    let pipeline = RacePredictionPipeline::new(Arc::new(provider), &ModelEnvConfig::default());

    let report = pipeline
        .run(&PredictionRequest {
            target_year: 2024,
            prior_year: None,
            round: RoundSelector::Number(3),
        })
        .await?;

    assert!(matches!(report.outcome, PipelineOutcome::DataUnavailable { .. }));
    assert!(report.warnings[0].contains("unavailable"));
    Ok(())
}

#[test]
fn test_q1_only_best_time() {
    let round = RaceRound::new(2024, 2).unwrap();
    let results = derive_best_times(
        round,
        &[
            entry("ZHO", Some(95.2), None, None),
            entry("VER", Some(90.1), Some(89.8), Some(89.5)),
            entry("NOT", None, None, None),
        ],
        100.0,
    )
    .unwrap();

    assert!((results[0].best_time_seconds - 95.2).abs() < 1e-9);
    assert!((results[1].best_time_seconds - 89.5).abs() < 1e-9);
    assert!((results[2].best_time_seconds - 195.2).abs() < 1e-9);
}

#[test]
fn test_prediction_runs_on_blocking_caller() {
    // The CLI drives the pipeline from synchronous code.
    let target = RaceRound::new(2022, 3).unwrap();
    let prior = RaceRound::new(2021, 3).unwrap();
    let provider = MockSessionProvider::new()
        .with_synthetic_round(target, 4, 6)
        .with_synthetic_round(prior, 4, 6);

    let mut config = ModelEnvConfig::default();
    config.gradient_boosting.n_estimators = 10;
    config.random_forest.n_trees = 10;
    config.boosted_trees.n_estimators = 10;
    let pipeline = RacePredictionPipeline::new(Arc::new(provider), &config);

    let report = tokio_test::block_on(pipeline.run(&PredictionRequest {
        target_year: 2022,
        prior_year: None,
        round: RoundSelector::Number(3),
    }))
    .unwrap();

    assert!(report.is_completed());
}
