use super::models::{ErgastRace, ErgastResponse, MrData};
use crate::config::ProviderEnvConfig;
use crate::domain::errors::SessionDataError;
use crate::domain::ports::SessionDataProvider;
use crate::domain::session::{
    DriverCode, EventInfo, LapTime, QualifyingEntry, RaceLap, RaceRound, SessionKind, SessionTable,
};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest_middleware::ClientWithMiddleware;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Upper bound on followed pages; a race has well under 2000 lap timings.
const MAX_PAGES: usize = 50;

/// Session data provider backed by the Jolpica mirror of the Ergast API.
pub struct JolpicaSessionProvider {
    client: ClientWithMiddleware,
    base_url: String,
    page_size: usize,
}

impl JolpicaSessionProvider {
    pub fn new(config: &ProviderEnvConfig) -> Self {
        Self::with_client(
            HttpClientFactory::create_client(config),
            config.f1_api_base_url.clone(),
            config.page_size,
        )
    }

    pub fn with_client(client: ClientWithMiddleware, base_url: String, page_size: usize) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
        }
    }

    async fn fetch_page(&self, path: &str, offset: usize) -> Result<MrData, SessionDataError> {
        let url = format!("{}/{}", self.base_url, path);
        let url_with_query = build_url_with_query(
            &url,
            &[
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
            ],
        );
        let upstream = |reason: String| SessionDataError::Upstream {
            context: path.to_string(),
            reason,
        };

        debug!("JolpicaSessionProvider: GET {}", url_with_query);
        let response = self
            .client
            .get(&url_with_query)
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(
                "JolpicaSessionProvider: API error {} for {}: {}",
                status, path, error_text
            );
            return Err(upstream(format!("HTTP {}", status)));
        }

        let body: ErgastResponse = response.json().await.map_err(|e| SessionDataError::Malformed {
            context: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(body.mr_data)
    }

    /// Follows limit/offset pagination until `total` rows are covered.
    ///
    /// Paged lap responses repeat the race object on every page, so the
    /// returned list can hold one entry per page for the same round.
    async fn fetch_races(&self, path: &str) -> Result<Vec<ErgastRace>, SessionDataError> {
        let mut races = Vec::new();
        let mut offset = 0;

        for _ in 0..MAX_PAGES {
            let page = self.fetch_page(path, offset).await?;
            let total = page.total_rows();
            if let Some(table) = page.race_table {
                races.extend(table.races);
            }

            offset += self.page_size;
            if offset >= total {
                return Ok(races);
            }
        }

        warn!(
            "JolpicaSessionProvider: stopped paging {} after {} pages",
            path, MAX_PAGES
        );
        Ok(races)
    }

    /// Maps Ergast driver ids to the codes used in qualifying tables.
    async fn driver_codes(&self, round: RaceRound) -> HashMap<String, String> {
        let path = format!("{}/{}/results.json", round.year(), round.round());
        match self.fetch_races(&path).await {
            Ok(races) => races
                .iter()
                .flat_map(|r| r.results.iter())
                .map(|r| (r.driver.driver_id.clone(), r.driver.join_code()))
                .collect(),
            Err(e) => {
                warn!(
                    "JolpicaSessionProvider: no driver codes for {} ({}), using driver ids",
                    round, e
                );
                HashMap::new()
            }
        }
    }
}

fn parse_round(raw: &str, context: &str) -> Result<u32, SessionDataError> {
    raw.parse().map_err(|_| SessionDataError::Malformed {
        context: context.to_string(),
        reason: format!("invalid round '{}'", raw),
    })
}

fn parse_segment(raw: Option<&str>, driver: &DriverCode, segment: &str) -> Option<LapTime> {
    match LapTime::parse_optional(raw) {
        Ok(time) => time,
        Err(e) => {
            warn!("Ignoring {} time of {}: {}", segment, driver, e);
            None
        }
    }
}

pub(crate) fn schedule_from_races(year: i32, races: &[ErgastRace]) -> Result<Vec<EventInfo>, SessionDataError> {
    let context = format!("schedule {}", year);
    let mut events = races
        .iter()
        .map(|race| {
            Ok(EventInfo {
                round: parse_round(&race.round, &context)?,
                event_name: race.race_name.clone(),
                date: race
                    .date
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
                circuit_name: race.circuit.as_ref().map(|c| c.circuit_name.clone()),
            })
        })
        .collect::<Result<Vec<_>, SessionDataError>>()?;
    events.sort_by_key(|e| e.round);
    events.dedup_by_key(|e| e.round);
    Ok(events)
}

pub(crate) fn qualifying_from_races(races: &[ErgastRace]) -> Vec<QualifyingEntry> {
    races
        .iter()
        .flat_map(|race| race.qualifying_results.iter())
        .filter_map(|row| {
            let Some(driver) = DriverCode::new(row.driver.join_code()) else {
                warn!("Skipping qualifying row without a driver code");
                return None;
            };
            Some(QualifyingEntry {
                q1: parse_segment(row.q1.as_deref(), &driver, "Q1"),
                q2: parse_segment(row.q2.as_deref(), &driver, "Q2"),
                q3: parse_segment(row.q3.as_deref(), &driver, "Q3"),
                full_name: row.driver.full_name(),
                driver,
            })
        })
        .collect()
}

pub(crate) fn laps_from_races(
    races: &[ErgastRace],
    codes: &HashMap<String, String>,
) -> Result<Vec<RaceLap>, SessionDataError> {
    let mut laps = Vec::new();
    for lap in races.iter().flat_map(|race| race.laps.iter()) {
        let lap_number = parse_round(&lap.number, "race laps")?;
        for timing in &lap.timings {
            let code = codes
                .get(&timing.driver_id)
                .cloned()
                .unwrap_or_else(|| timing.driver_id.to_uppercase());
            let Some(driver) = DriverCode::new(code) else {
                continue;
            };
            let duration = match LapTime::parse_optional(timing.time.as_deref()) {
                Ok(duration) => duration,
                Err(e) => {
                    warn!("Lap {} of {}: {}", lap_number, driver, e);
                    None
                }
            };
            laps.push(RaceLap {
                driver,
                lap_number,
                duration,
            });
        }
    }
    Ok(laps)
}

#[async_trait]
impl SessionDataProvider for JolpicaSessionProvider {
    async fn get_schedule(&self, year: i32) -> Result<Vec<EventInfo>, SessionDataError> {
        let races = self.fetch_races(&format!("{}.json", year)).await?;
        let events = schedule_from_races(year, &races)?;
        info!("JolpicaSessionProvider: {} events in {}", events.len(), year);
        Ok(events)
    }

    async fn get_session_results(
        &self,
        round: RaceRound,
        kind: SessionKind,
    ) -> Result<SessionTable, SessionDataError> {
        let no_data = || SessionDataError::NoData {
            year: round.year(),
            round: round.round(),
            kind,
        };

        match kind {
            SessionKind::Qualifying => {
                let path = format!("{}/{}/qualifying.json", round.year(), round.round());
                let entries = qualifying_from_races(&self.fetch_races(&path).await?);
                if entries.is_empty() {
                    return Err(no_data());
                }
                info!(
                    "JolpicaSessionProvider: {} qualifying rows for {}",
                    entries.len(),
                    round
                );
                Ok(SessionTable::Qualifying(entries))
            }
            SessionKind::Race => {
                let path = format!("{}/{}/laps.json", round.year(), round.round());
                let races = self.fetch_races(&path).await?;
                if races.iter().all(|r| r.laps.is_empty()) {
                    return Err(no_data());
                }
                let codes = self.driver_codes(round).await;
                let laps = laps_from_races(&races, &codes)?;
                info!("JolpicaSessionProvider: {} race laps for {}", laps.len(), round);
                Ok(SessionTable::Race(laps))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn races(json: &str) -> Vec<ErgastRace> {
        let parsed: ErgastResponse = serde_json::from_str(json).unwrap();
        parsed.mr_data.race_table.unwrap().races
    }

    #[test]
    fn test_laps_use_result_codes() {
        let page = races(
            r#"{"MRData": {"total": "3", "RaceTable": {"Races": [{
                "round": "5", "raceName": "Miami Grand Prix",
                "Laps": [
                    {"number": "1", "Timings": [
                        {"driverId": "max_verstappen", "position": "1", "time": "1:36.123"},
                        {"driverId": "unknown_driver", "position": "2", "time": "1:37.000"}
                    ]},
                    {"number": "2", "Timings": [
                        {"driverId": "max_verstappen", "position": "1", "time": ""}
                    ]}
                ]
            }]}}}"#,
        );
        let codes = HashMap::from([("max_verstappen".to_string(), "VER".to_string())]);

        let laps = laps_from_races(&page, &codes).unwrap();
        assert_eq!(laps.len(), 3);
        assert_eq!(laps[0].driver.as_str(), "VER");
        assert_eq!(laps[0].duration, Some(LapTime::from_millis(96_123)));
        assert_eq!(laps[1].driver.as_str(), "UNKNOWN_DRIVER");
        assert_eq!(laps[2].lap_number, 2);
        assert_eq!(laps[2].duration, None);
    }

    #[test]
    fn test_qualifying_rows_keep_missing_segments() {
        let page = races(
            r#"{"MRData": {"total": "1", "RaceTable": {"Races": [{
                "round": "1", "raceName": "Bahrain Grand Prix",
                "QualifyingResults": [
                    {"Driver": {"driverId": "zhou", "code": "ZHO", "givenName": "Guanyu", "familyName": "Zhou"},
                     "Q1": "1:35.200", "Q2": "", "Q3": "garbage"}
                ]
            }]}}}"#,
        );

        let entries = qualifying_from_races(&page);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].q1, Some(LapTime::from_millis(95_200)));
        assert_eq!(entries[0].q2, None);
        assert_eq!(entries[0].q3, None);
        assert_eq!(entries[0].best_segment().unwrap().as_seconds(), 95.2);
    }

    #[test]
    fn test_schedule_is_sorted_and_deduplicated() {
        let page = races(
            r#"{"MRData": {"total": "3", "RaceTable": {"Races": [
                {"round": "2", "raceName": "Saudi Arabian Grand Prix", "date": "2024-03-09"},
                {"round": "1", "raceName": "Bahrain Grand Prix", "date": "2024-03-02",
                 "Circuit": {"circuitName": "Bahrain International Circuit"}},
                {"round": "2", "raceName": "Saudi Arabian Grand Prix", "date": "2024-03-09"}
            ]}}}"#,
        );

        let events = schedule_from_races(2024, &page).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_name, "Bahrain Grand Prix");
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2024, 3, 2));
        assert_eq!(
            events[0].circuit_name.as_deref(),
            Some("Bahrain International Circuit")
        );
    }

    #[test]
    fn test_bad_round_number_is_malformed() {
        let page = races(
            r#"{"MRData": {"total": "1", "RaceTable": {"Races": [
                {"round": "first", "raceName": "Bahrain Grand Prix"}
            ]}}}"#,
        );
        assert!(matches!(
            schedule_from_races(2024, &page),
            Err(SessionDataError::Malformed { .. })
        ));
    }
}
