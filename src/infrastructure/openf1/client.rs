use super::models::{CarDataPoint, Lap, LocationPoint, Meeting, Session};
use crate::config::ProviderEnvConfig;
use crate::domain::errors::SessionDataError;
use crate::domain::ports::TelemetryProvider;
use crate::domain::session::{RaceRound, SessionKind};
use crate::domain::telemetry::{LapTelemetry, TelemetrySample};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

/// Fastest-lap telemetry from the OpenF1 API.
///
/// Rounds are numbered by the chronological order of the season's
/// non-testing meetings.
pub struct OpenF1TelemetryProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl OpenF1TelemetryProvider {
    pub fn new(config: &ProviderEnvConfig) -> Self {
        Self::with_client(
            HttpClientFactory::create_client(config),
            config.openf1_base_url.clone(),
        )
    }

    pub fn with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, SessionDataError> {
        let url = build_url_with_query(&format!("{}/{}", self.base_url, endpoint), params);
        let upstream = |reason: String| SessionDataError::Upstream {
            context: endpoint.to_string(),
            reason,
        };

        debug!("OpenF1TelemetryProvider: GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "OpenF1TelemetryProvider: API error {} for {}: {}",
                status, endpoint, error_text
            );
            return Err(upstream(format!("HTTP {}", status)));
        }

        response.json().await.map_err(|e| SessionDataError::Malformed {
            context: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Picks the meeting holding championship round `round` of the season.
pub(crate) fn meeting_for_round(mut meetings: Vec<Meeting>, round: RaceRound) -> Option<Meeting> {
    meetings.retain(|m| !m.is_testing());
    meetings.sort_by_key(|m| m.date_start);
    meetings.into_iter().nth(round.round() as usize - 1)
}

/// Fastest timed lap; ties go to the earlier lap.
pub(crate) fn fastest_lap(laps: &[Lap]) -> Option<&Lap> {
    laps.iter()
        .filter(|l| l.lap_duration.is_some_and(|d| d.is_finite() && d > 0.0) && l.date_start.is_some())
        .min_by(|a, b| {
            let (da, db) = (a.lap_duration.unwrap_or(f64::MAX), b.lap_duration.unwrap_or(f64::MAX));
            da.total_cmp(&db).then(a.lap_number.cmp(&b.lap_number))
        })
}

/// End of the lap window; `None` for a negative, non-finite or out-of-range duration.
pub(crate) fn lap_window_end(start: DateTime<Utc>, duration_secs: f64) -> Option<DateTime<Utc>> {
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return None;
    }
    let millis = Duration::try_milliseconds((duration_secs * 1000.0).ceil() as i64)?;
    start.checked_add_signed(millis)
}

/// Pairs every car-data sample with the position sample closest in time.
///
/// Both inputs are sorted by timestamp internally. Car-data points without a
/// speed reading are dropped.
pub(crate) fn merge_samples(
    mut car_data: Vec<CarDataPoint>,
    mut locations: Vec<LocationPoint>,
) -> Vec<TelemetrySample> {
    if locations.is_empty() {
        return Vec::new();
    }
    car_data.sort_by_key(|p| p.date);
    locations.sort_by_key(|p| p.date);

    let gap = |a: DateTime<Utc>, b: DateTime<Utc>| (a - b).num_microseconds().unwrap_or(i64::MAX).abs();

    let mut cursor = 0;
    let mut samples = Vec::with_capacity(car_data.len());
    for point in car_data {
        let Some(speed) = point.speed else {
            continue;
        };
        while cursor + 1 < locations.len()
            && gap(locations[cursor + 1].date, point.date) <= gap(locations[cursor].date, point.date)
        {
            cursor += 1;
        }
        let location = &locations[cursor];
        samples.push(TelemetrySample {
            timestamp: point.date,
            x: location.x,
            y: location.y,
            speed,
            gear: point.n_gear.unwrap_or(0),
            drs: point.drs.unwrap_or(0),
        });
    }
    samples
}

#[async_trait]
impl TelemetryProvider for OpenF1TelemetryProvider {
    async fn fastest_lap_telemetry(&self, round: RaceRound) -> Result<LapTelemetry, SessionDataError> {
        let no_data = || SessionDataError::NoData {
            year: round.year(),
            round: round.round(),
            kind: SessionKind::Race,
        };

        let meetings: Vec<Meeting> = self
            .get("meetings", &[("year", round.year().to_string())])
            .await?;
        let meeting = meeting_for_round(meetings, round).ok_or_else(no_data)?;

        let sessions: Vec<Session> = self
            .get(
                "sessions",
                &[
                    ("meeting_key", meeting.meeting_key.to_string()),
                    ("session_name", "Race".to_string()),
                ],
            )
            .await?;
        let session = sessions.first().ok_or_else(no_data)?;
        let session_key = session.session_key.to_string();

        let laps: Vec<Lap> = self
            .get("laps", &[("session_key", session_key.clone())])
            .await?;
        let lap = fastest_lap(&laps).ok_or_else(no_data)?;
        let (Some(start), Some(duration)) = (lap.date_start, lap.lap_duration) else {
            return Err(no_data());
        };
        let end = lap_window_end(start, duration).ok_or_else(no_data)?;

        let window = [
            ("session_key", session_key),
            ("driver_number", lap.driver_number.to_string()),
            ("date>", start.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("date<", end.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ];
        let car_data: Vec<CarDataPoint> = self.get("car_data", &window).await?;
        let locations: Vec<LocationPoint> = self.get("location", &window).await?;

        let samples = merge_samples(car_data, locations);
        if samples.is_empty() {
            return Err(no_data());
        }

        info!(
            "OpenF1TelemetryProvider: {} fastest lap by #{} (lap {}, {:.3}s), {} samples",
            meeting.meeting_name,
            lap.driver_number,
            lap.lap_number,
            duration,
            samples.len()
        );

        Ok(LapTelemetry {
            year: round.year(),
            driver_number: lap.driver_number,
            lap_number: lap.lap_number,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap() + Duration::milliseconds(millis)
    }

    fn meeting(key: u32, name: &str, day: u32) -> Meeting {
        Meeting {
            meeting_key: key,
            meeting_name: name.to_string(),
            date_start: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            country_name: None,
        }
    }

    #[test]
    fn test_meeting_for_round_skips_testing() {
        let meetings = vec![
            meeting(3, "Saudi Arabian Grand Prix", 7),
            meeting(1, "Pre-Season Testing", 1),
            meeting(2, "Bahrain Grand Prix", 2),
        ];

        let round_two = RaceRound::new(2024, 2).unwrap();
        assert_eq!(meeting_for_round(meetings.clone(), round_two).unwrap().meeting_key, 3);

        let round_five = RaceRound::new(2024, 5).unwrap();
        assert!(meeting_for_round(meetings, round_five).is_none());
    }

    #[test]
    fn test_fastest_lap_ignores_untimed() {
        let laps = vec![
            Lap { driver_number: 1, lap_number: 1, lap_duration: None, date_start: Some(at(0)) },
            Lap { driver_number: 16, lap_number: 40, lap_duration: Some(92.5), date_start: Some(at(1)) },
            Lap { driver_number: 44, lap_number: 38, lap_duration: Some(92.1), date_start: Some(at(2)) },
            Lap { driver_number: 4, lap_number: 39, lap_duration: Some(91.0), date_start: None },
        ];
        let lap = fastest_lap(&laps).unwrap();
        assert_eq!(lap.driver_number, 44);
    }

    #[test]
    fn test_merge_samples_uses_nearest_location() {
        let car = vec![
            CarDataPoint { date: at(260), driver_number: 1, speed: Some(250.0), n_gear: Some(7), drs: Some(0) },
            CarDataPoint { date: at(0), driver_number: 1, speed: Some(240.0), n_gear: Some(7), drs: Some(12) },
            CarDataPoint { date: at(300), driver_number: 1, speed: None, n_gear: Some(7), drs: Some(0) },
        ];
        let locations = vec![
            LocationPoint { date: at(10), x: 1.0, y: 1.0 },
            LocationPoint { date: at(200), x: 2.0, y: 2.0 },
            LocationPoint { date: at(280), x: 3.0, y: 3.0 },
        ];

        let samples = merge_samples(car, locations);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].x, 1.0);
        assert_eq!(samples[0].drs, 12);
        assert_eq!(samples[1].x, 3.0);
        assert_eq!(samples[1].speed, 250.0);
    }

    #[test]
    fn test_merge_without_locations_is_empty() {
        let car = vec![CarDataPoint {
            date: at(0),
            driver_number: 1,
            speed: Some(240.0),
            n_gear: Some(7),
            drs: Some(0),
        }];
        assert!(merge_samples(car, Vec::new()).is_empty());
    }

    #[test]
    fn test_lap_window_end_rejects_absurd_durations() {
        assert_eq!(lap_window_end(at(0), 91.2345), Some(at(91_235)));
        assert!(lap_window_end(at(0), 1e300).is_none());
        assert!(lap_window_end(at(0), f64::NAN).is_none());
        assert!(lap_window_end(at(0), -1.0).is_none());
    }
}
