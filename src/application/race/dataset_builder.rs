use crate::domain::errors::SessionDataError;
use crate::domain::ml::TrainingExample;
use crate::domain::ports::SessionDataProvider;
use crate::domain::session::{QualifyingResult, RaceLap, RaceRound, derive_best_times};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Why a dataset came back without examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyReason {
    /// The race has no lap with a recorded duration.
    NoCompletedLaps,
    /// Laps exist but none belongs to a driver of the qualifying table.
    NoDriverOverlap,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NoCompletedLaps => write!(f, "the race has no completed laps"),
            EmptyReason::NoDriverOverlap => {
                write!(f, "no race driver appears in the qualifying results")
            }
        }
    }
}

/// Row counts of a lap / qualifying join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    pub race_laps: usize,
    pub untimed_laps: usize,
    pub unmatched_laps: usize,
}

/// Training table of one run.
#[derive(Debug, Clone)]
pub struct RaceDataset {
    /// Round the race laps come from.
    pub prior: RaceRound,
    /// Round the qualifying results come from.
    pub target: RaceRound,
    pub examples: Vec<TrainingExample>,
    pub qualifying: Vec<QualifyingResult>,
    pub stats: JoinStats,
}

#[derive(Debug, Clone)]
pub enum DatasetOutcome {
    Ready(RaceDataset),
    Empty {
        qualifying: Vec<QualifyingResult>,
        reason: EmptyReason,
        stats: JoinStats,
    },
    Unavailable(SessionDataError),
}

impl DatasetOutcome {
    pub fn examples(&self) -> &[TrainingExample] {
        match self {
            DatasetOutcome::Ready(dataset) => &dataset.examples,
            _ => &[],
        }
    }

    pub fn qualifying(&self) -> &[QualifyingResult] {
        match self {
            DatasetOutcome::Ready(dataset) => &dataset.qualifying,
            DatasetOutcome::Empty { qualifying, .. } => qualifying,
            DatasetOutcome::Unavailable(_) => &[],
        }
    }
}

/// Inner-joins race laps to qualifying results on the driver code.
///
/// Untimed laps and laps of drivers without a qualifying row are dropped;
/// every remaining lap becomes one example.
pub fn join_laps(laps: &[RaceLap], qualifying: &[QualifyingResult]) -> (Vec<TrainingExample>, JoinStats) {
    let best_by_driver: HashMap<_, f64> = qualifying
        .iter()
        .map(|q| (&q.driver, q.best_time_seconds))
        .collect();

    let mut stats = JoinStats {
        race_laps: laps.len(),
        ..Default::default()
    };
    let mut examples = Vec::with_capacity(laps.len());

    for lap in laps {
        let Some(duration) = lap.duration else {
            stats.untimed_laps += 1;
            continue;
        };
        match best_by_driver.get(&lap.driver) {
            Some(&best) => examples.push(TrainingExample {
                driver: lap.driver.clone(),
                lap_number: lap.lap_number,
                best_time_seconds: best,
                lap_time_seconds: duration.as_seconds(),
            }),
            None => stats.unmatched_laps += 1,
        }
    }

    (examples, stats)
}

/// Joins qualifying pace of one season with race laps of another.
pub struct DatasetBuilder {
    provider: Arc<dyn SessionDataProvider>,
    penalty_secs: f64,
}

impl DatasetBuilder {
    pub fn new(provider: Arc<dyn SessionDataProvider>, penalty_secs: f64) -> Self {
        Self {
            provider,
            penalty_secs,
        }
    }

    /// Qualifying from `target_year`, race laps from `prior_year`, same round number.
    pub async fn build_dataset(&self, prior_year: i32, target_year: i32, round: u32) -> DatasetOutcome {
        let rounds = RaceRound::new(prior_year, round)
            .and_then(|prior| Ok((prior, RaceRound::new(target_year, round)?)));
        match rounds {
            Ok((prior, target)) => self.build_dataset_for_rounds(prior, target).await,
            Err(e) => DatasetOutcome::Unavailable(e),
        }
    }

    /// Like `build_dataset`, for events whose round number differs between seasons.
    pub async fn build_dataset_for_rounds(&self, prior: RaceRound, target: RaceRound) -> DatasetOutcome {
        let entries = match self.provider.get_qualifying(target).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("DatasetBuilder: qualifying {} unavailable: {}", target, e);
                return DatasetOutcome::Unavailable(e);
            }
        };

        let qualifying = match derive_best_times(target, &entries, self.penalty_secs) {
            Ok(results) => results,
            Err(e) => {
                warn!("DatasetBuilder: qualifying {} has no usable times: {}", target, e);
                return DatasetOutcome::Unavailable(e);
            }
        };

        let laps = match self.provider.get_race_laps(prior).await {
            Ok(laps) => laps,
            Err(e) => {
                warn!("DatasetBuilder: race laps {} unavailable: {}", prior, e);
                return DatasetOutcome::Unavailable(e);
            }
        };

        let (examples, stats) = join_laps(&laps, &qualifying);
        info!(
            "DatasetBuilder: {} examples from {} laps ({} untimed, {} unmatched), {} qualifying drivers",
            examples.len(),
            stats.race_laps,
            stats.untimed_laps,
            stats.unmatched_laps,
            qualifying.len()
        );

        if examples.is_empty() {
            let reason = if stats.race_laps == stats.untimed_laps {
                EmptyReason::NoCompletedLaps
            } else {
                EmptyReason::NoDriverOverlap
            };
            return DatasetOutcome::Empty {
                qualifying,
                reason,
                stats,
            };
        }

        DatasetOutcome::Ready(RaceDataset {
            prior,
            target,
            examples,
            qualifying,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{DriverCode, LapTime, QualifyingEntry};
    use crate::infrastructure::mock::MockSessionProvider;

    fn code(c: &str) -> DriverCode {
        DriverCode::new(c).unwrap()
    }

    fn entry(c: &str, q1: Option<f64>, q2: Option<f64>, q3: Option<f64>) -> QualifyingEntry {
        QualifyingEntry {
            driver: code(c),
            full_name: format!("Driver {}", c),
            q1: q1.and_then(LapTime::from_seconds),
            q2: q2.and_then(LapTime::from_seconds),
            q3: q3.and_then(LapTime::from_seconds),
        }
    }

    fn lap(c: &str, n: u32, secs: Option<f64>) -> RaceLap {
        RaceLap {
            driver: code(c),
            lap_number: n,
            duration: secs.and_then(LapTime::from_seconds),
        }
    }

    fn result(c: &str, best: f64) -> QualifyingResult {
        QualifyingResult {
            driver: code(c),
            full_name: c.to_string(),
            q1: None,
            q2: None,
            q3: LapTime::from_seconds(best),
            best_time_seconds: best,
            set_time: true,
        }
    }

    #[test]
    fn test_join_keeps_one_example_per_lap() {
        let qualifying = vec![result("VER", 80.0), result("HAM", 80.5)];
        let laps = vec![
            lap("VER", 1, Some(85.0)),
            lap("VER", 2, Some(84.5)),
            lap("HAM", 1, None),
            lap("HAM", 2, Some(85.2)),
            lap("SAR", 1, Some(87.0)),
        ];

        let (examples, stats) = join_laps(&laps, &qualifying);
        assert_eq!(examples.len(), 3);
        assert_eq!(stats.untimed_laps, 1);
        assert_eq!(stats.unmatched_laps, 1);
        assert!(examples.iter().all(|e| e.lap_time_seconds.is_finite()));
        assert_eq!(examples[2].best_time_seconds, 80.5);
    }

    #[tokio::test]
    async fn test_no_race_laps_is_empty_with_qualifying() {
        let target = RaceRound::new(2024, 1).unwrap();
        let prior = RaceRound::new(2023, 1).unwrap();
        let provider = MockSessionProvider::new()
            .with_qualifying(
                target,
                vec![entry("AAA", None, None, Some(80.0)), entry("BBB", None, None, Some(81.5))],
            )
            .with_race_laps(prior, Vec::new());

        let builder = DatasetBuilder::new(Arc::new(provider), 100.0);
        let outcome = builder.build_dataset(2023, 2024, 1).await;

        match outcome {
            DatasetOutcome::Empty { qualifying, reason, .. } => {
                assert_eq!(reason, EmptyReason::NoCompletedLaps);
                assert_eq!(qualifying.len(), 2);
            }
            other => panic!("expected Empty, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_driver_overlap_is_empty() {
        let target = RaceRound::new(2024, 2).unwrap();
        let prior = RaceRound::new(2023, 2).unwrap();
        let provider = MockSessionProvider::new()
            .with_qualifying(target, vec![entry("AAA", Some(90.0), None, None)])
            .with_race_laps(prior, vec![lap("ZZZ", 1, Some(95.0))]);

        let builder = DatasetBuilder::new(Arc::new(provider), 100.0);
        let outcome = builder.build_dataset(2023, 2024, 2).await;
        assert!(matches!(
            outcome,
            DatasetOutcome::Empty {
                reason: EmptyReason::NoDriverOverlap,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_unavailable() {
        let provider = MockSessionProvider::new().failing_year(2024);
        let builder = DatasetBuilder::new(Arc::new(provider), 100.0);

        let outcome = builder.build_dataset(2023, 2024, 3).await;
        assert!(matches!(outcome, DatasetOutcome::Unavailable(_)));
        assert!(outcome.examples().is_empty());
        assert!(outcome.qualifying().is_empty());
    }

    #[tokio::test]
    async fn test_all_untimed_qualifying_is_unavailable() {
        let target = RaceRound::new(2024, 4).unwrap();
        let provider = MockSessionProvider::new()
            .with_qualifying(target, vec![entry("AAA", None, None, None)]);
        let builder = DatasetBuilder::new(Arc::new(provider), 100.0);

        let outcome = builder.build_dataset(2023, 2024, 4).await;
        assert!(matches!(
            outcome,
            DatasetOutcome::Unavailable(SessionDataError::NoData { .. })
        ));
    }

    #[tokio::test]
    async fn test_ready_dataset_applies_sentinel() {
        let target = RaceRound::new(2024, 5).unwrap();
        let prior = RaceRound::new(2023, 6).unwrap();
        let provider = MockSessionProvider::new()
            .with_qualifying(
                target,
                vec![
                    entry("AAA", Some(95.2), None, None),
                    entry("BBB", Some(91.0), Some(90.5), None),
                    entry("CCC", None, None, None),
                ],
            )
            .with_race_laps(
                prior,
                vec![lap("AAA", 1, Some(99.0)), lap("CCC", 1, Some(101.0))],
            );
        let builder = DatasetBuilder::new(Arc::new(provider), 100.0);

        let DatasetOutcome::Ready(dataset) = builder.build_dataset_for_rounds(prior, target).await else {
            panic!("expected a ready dataset");
        };
        assert_eq!(dataset.examples.len(), 2);
        let ccc = dataset.qualifying.iter().find(|q| q.driver.as_str() == "CCC").unwrap();
        assert!((ccc.best_time_seconds - 195.2).abs() < 1e-9);
        assert!(!ccc.set_time);
        let aaa = dataset.qualifying.iter().find(|q| q.driver.as_str() == "AAA").unwrap();
        assert!((aaa.best_time_seconds - 95.2).abs() < 1e-9);
    }
}
