use super::speed_model::{PredictedLine, predict_racing_line};
use super::track_map::{TrackMap, track_maps};
use crate::application::ml::random_forest::RandomForestParams;
use crate::config::RacingLineEnvConfig;
use crate::domain::errors::{PipelineError, SessionDataError};
use crate::domain::ports::{SessionDataProvider, TelemetryProvider};
use crate::domain::session::{RaceRound, RoundSelector};
use crate::domain::telemetry::LapTelemetry;
use chrono::Datelike;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const NOT_ENOUGH_HISTORY: &str = "Not enough historical data to predict the racing line";

#[derive(Debug, Clone, Serialize)]
pub struct RacingLineReport {
    pub year: i32,
    pub event_name: String,
    /// Fastest lap of the selected season; only for completed seasons.
    pub actual: Option<LapTelemetry>,
    pub track_maps: Vec<TrackMap>,
    pub predicted: Option<PredictedLine>,
    pub warnings: Vec<String>,
}

/// Fastest-lap telemetry and the speed model for one event.
pub struct RacingLineService {
    sessions: Arc<dyn SessionDataProvider>,
    telemetry: Arc<dyn TelemetryProvider>,
    config: RacingLineEnvConfig,
    current_year: i32,
}

impl RacingLineService {
    pub fn new(
        sessions: Arc<dyn SessionDataProvider>,
        telemetry: Arc<dyn TelemetryProvider>,
        config: RacingLineEnvConfig,
    ) -> Self {
        Self {
            sessions,
            telemetry,
            config,
            current_year: chrono::Utc::now().year(),
        }
    }

    /// Pins "now" for past / current season decisions.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub async fn run(&self, year: i32, event: &RoundSelector) -> Result<RacingLineReport, PipelineError> {
        let mut warnings = Vec::new();

        let selected = self.resolve(year, event).await;
        let event_name = match (&selected, event) {
            (Ok((_, name)), _) => name.clone(),
            (Err(e), selector) => {
                let fallback = match selector {
                    RoundSelector::EventName(query) => query.clone(),
                    RoundSelector::Number(n) => format!("Round {}", n),
                };
                warn!("RacingLine: {} unresolved in {}: {}", fallback, year, e);
                warnings.push(format!("{} not found in {}: {}", fallback, year, e));
                fallback
            }
        };

        let mut actual = None;
        if year < self.current_year {
            if let Ok((round, _)) = &selected {
                match self.telemetry.fastest_lap_telemetry(*round).await {
                    Ok(lap) => actual = Some(lap),
                    Err(e) => {
                        warn!("RacingLine: no fastest lap for {}: {}", round, e);
                        warnings.push(format!("Fastest lap of {} unavailable: {}", year, e));
                    }
                }
            }
        }

        // A bare round number only identifies the event once the schedule answered.
        let history = match (&selected, event) {
            (Err(_), RoundSelector::Number(_)) => Vec::new(),
            _ => self.collect_history(&event_name).await,
        };
        let predicted = if history.is_empty() {
            warn!("RacingLine: {} for {}", NOT_ENOUGH_HISTORY, event_name);
            warnings.push(NOT_ENOUGH_HISTORY.to_string());
            None
        } else {
            let params = RandomForestParams {
                n_trees: self.config.n_trees,
                seed: self.config.seed,
                ..Default::default()
            };
            Some(predict_racing_line(&history, params)?)
        };

        Ok(RacingLineReport {
            year,
            track_maps: actual.as_ref().map(track_maps).unwrap_or_default(),
            event_name,
            actual,
            predicted,
            warnings,
        })
    }

    async fn resolve(&self, year: i32, event: &RoundSelector) -> Result<(RaceRound, String), SessionDataError> {
        let schedule = self.sessions.get_schedule(year).await?;
        let round = event.resolve(year, &schedule)?;
        let name = schedule
            .iter()
            .find(|e| e.round == round.round())
            .map(|e| e.event_name.clone())
            .unwrap_or_else(|| event.to_string());
        Ok((round, name))
    }

    /// Fastest laps of the event from the history start up to last season.
    /// Seasons that fail are skipped.
    async fn collect_history(&self, event_name: &str) -> Vec<LapTelemetry> {
        let selector = RoundSelector::EventName(event_name.to_string());
        let mut history = Vec::new();

        for season in self.config.history_start_year..self.current_year {
            let round = match self.resolve(season, &selector).await {
                Ok((round, _)) => round,
                Err(e) => {
                    warn!("RacingLine: skipping {}: {}", season, e);
                    continue;
                }
            };
            match self.telemetry.fastest_lap_telemetry(round).await {
                Ok(lap) => history.push(lap),
                Err(e) => warn!("RacingLine: skipping {}: {}", season, e),
            }
        }

        info!(
            "RacingLine: {} historical laps for {}",
            history.len(),
            event_name
        );
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::EventInfo;
    use crate::infrastructure::mock::{MockSessionProvider, MockTelemetryProvider};

    fn config() -> RacingLineEnvConfig {
        RacingLineEnvConfig {
            history_start_year: 2022,
            n_trees: 10,
            seed: 42,
        }
    }

    fn sessions() -> MockSessionProvider {
        MockSessionProvider::new()
            .with_schedule(2022, vec![EventInfo::new(4, "Monaco Grand Prix")])
            .with_schedule(2023, vec![EventInfo::new(6, "Monaco Grand Prix")])
            .with_schedule(2024, vec![EventInfo::new(8, "Monaco Grand Prix")])
    }

    #[tokio::test]
    async fn test_past_season_has_actual_and_predicted() {
        let telemetry = MockTelemetryProvider::new()
            .with_synthetic_lap(RaceRound::new(2023, 6).unwrap(), 60)
            .with_synthetic_lap(RaceRound::new(2024, 8).unwrap(), 60);
        let service = RacingLineService::new(Arc::new(sessions()), Arc::new(telemetry), config())
            .with_current_year(2025);

        let report = service.run(2024, &"Monaco".parse().unwrap()).await.unwrap();

        assert_eq!(report.event_name, "Monaco Grand Prix");
        assert!(report.actual.is_some());
        assert_eq!(report.track_maps.len(), 3);
        let predicted = report.predicted.unwrap();
        // 2022 has no telemetry and is skipped.
        assert_eq!(predicted.seasons, vec![2023, 2024]);
    }

    #[tokio::test]
    async fn test_current_season_has_only_prediction() {
        let telemetry = MockTelemetryProvider::new()
            .with_synthetic_lap(RaceRound::new(2024, 8).unwrap(), 60);
        let service = RacingLineService::new(Arc::new(sessions()), Arc::new(telemetry), config())
            .with_current_year(2025);

        let report = service.run(2025, &"Monaco Grand Prix".parse().unwrap()).await.unwrap();

        assert!(report.actual.is_none());
        assert!(report.track_maps.is_empty());
        assert!(report.predicted.is_some());
    }

    #[tokio::test]
    async fn test_no_history_warns() {
        let service = RacingLineService::new(
            Arc::new(sessions()),
            Arc::new(MockTelemetryProvider::new()),
            config(),
        )
        .with_current_year(2025);

        let report = service.run(2025, &"Monaco".parse().unwrap()).await.unwrap();

        assert!(report.predicted.is_none());
        assert!(report.warnings.iter().any(|w| w == NOT_ENOUGH_HISTORY));
    }

    #[tokio::test]
    async fn test_schedule_outage_with_round_number_is_a_warning() {
        let service = RacingLineService::new(
            Arc::new(MockSessionProvider::new().failing_year(2024)),
            Arc::new(MockTelemetryProvider::new()),
            config(),
        )
        .with_current_year(2025);

        let report = service.run(2024, &RoundSelector::Number(3)).await.unwrap();

        assert_eq!(report.event_name, "Round 3");
        assert!(report.actual.is_none());
        assert!(report.predicted.is_none());
        assert!(report.warnings[0].contains("Round 3 not found in 2024"));
        assert!(report.warnings.iter().any(|w| w == NOT_ENOUGH_HISTORY));
    }
}
