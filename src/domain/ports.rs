use crate::domain::errors::SessionDataError;
use crate::domain::session::{EventInfo, QualifyingEntry, RaceLap, RaceRound, SessionKind, SessionTable};
use crate::domain::telemetry::LapTelemetry;
use async_trait::async_trait;

/// Source of schedules and session tables.
///
/// Every failure is a `SessionDataError`: callers treat it as "data
/// unavailable", never as a fatal error.
#[async_trait]
pub trait SessionDataProvider: Send + Sync {
    async fn get_schedule(&self, year: i32) -> Result<Vec<EventInfo>, SessionDataError>;

    async fn get_session_results(
        &self,
        round: RaceRound,
        kind: SessionKind,
    ) -> Result<SessionTable, SessionDataError>;

    async fn get_qualifying(
        &self,
        round: RaceRound,
    ) -> Result<Vec<QualifyingEntry>, SessionDataError> {
        self.get_session_results(round, SessionKind::Qualifying)
            .await?
            .into_qualifying()
            .ok_or_else(|| SessionDataError::Malformed {
                context: format!("qualifying {}", round),
                reason: "provider returned race laps".to_string(),
            })
    }

    async fn get_race_laps(&self, round: RaceRound) -> Result<Vec<RaceLap>, SessionDataError> {
        self.get_session_results(round, SessionKind::Race)
            .await?
            .into_race_laps()
            .ok_or_else(|| SessionDataError::Malformed {
                context: format!("race {}", round),
                reason: "provider returned a qualifying table".to_string(),
            })
    }
}

/// Source of fastest-lap telemetry for the racing-line views.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// Telemetry of the fastest race lap of the round.
    async fn fastest_lap_telemetry(&self, round: RaceRound) -> Result<LapTelemetry, SessionDataError>;
}
