use crate::domain::errors::SessionDataError;
use crate::domain::ports::{SessionDataProvider, TelemetryProvider};
use crate::domain::session::{
    DriverCode, EventInfo, LapTime, QualifyingEntry, RaceLap, RaceRound, SessionKind, SessionTable,
};
use crate::domain::telemetry::{LapTelemetry, TelemetrySample};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

const GRID: [(&str, &str); 20] = [
    ("VER", "Max Verstappen"),
    ("PER", "Sergio Perez"),
    ("LEC", "Charles Leclerc"),
    ("SAI", "Carlos Sainz"),
    ("HAM", "Lewis Hamilton"),
    ("RUS", "George Russell"),
    ("NOR", "Lando Norris"),
    ("PIA", "Oscar Piastri"),
    ("ALO", "Fernando Alonso"),
    ("STR", "Lance Stroll"),
    ("GAS", "Pierre Gasly"),
    ("OCO", "Esteban Ocon"),
    ("ALB", "Alexander Albon"),
    ("SAR", "Logan Sargeant"),
    ("TSU", "Yuki Tsunoda"),
    ("RIC", "Daniel Ricciardo"),
    ("BOT", "Valtteri Bottas"),
    ("ZHO", "Guanyu Zhou"),
    ("HUL", "Nico Hulkenberg"),
    ("MAG", "Kevin Magnussen"),
];

/// In-memory session provider for tests and offline runs.
///
/// Anything not registered answers with `NoData`; `failing_year` turns every
/// request for that season into an upstream error.
#[derive(Default)]
pub struct MockSessionProvider {
    schedules: HashMap<i32, Vec<EventInfo>>,
    tables: HashMap<(RaceRound, SessionKind), SessionTable>,
    failing_years: Vec<i32>,
    calls: AtomicUsize,
}

impl MockSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(mut self, year: i32, events: Vec<EventInfo>) -> Self {
        self.schedules.insert(year, events);
        self
    }

    pub fn with_qualifying(mut self, round: RaceRound, entries: Vec<QualifyingEntry>) -> Self {
        self.tables
            .insert((round, SessionKind::Qualifying), SessionTable::Qualifying(entries));
        self
    }

    pub fn with_race_laps(mut self, round: RaceRound, laps: Vec<RaceLap>) -> Self {
        self.tables
            .insert((round, SessionKind::Race), SessionTable::Race(laps));
        self
    }

    pub fn failing_year(mut self, year: i32) -> Self {
        self.failing_years.push(year);
        self
    }

    /// Registers a plausible qualifying table and race for `drivers` drivers.
    ///
    /// Race pace tracks qualifying pace, so models have a real signal to learn.
    pub fn with_synthetic_round(self, round: RaceRound, drivers: usize, laps: u32) -> Self {
        let (qualifying, race) = synthetic_round(round, drivers, laps);
        self.with_qualifying(round, qualifying).with_race_laps(round, race)
    }

    /// Number of requests served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_year(&self, year: i32, context: &str) -> Result<(), SessionDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_years.contains(&year) {
            return Err(SessionDataError::Upstream {
                context: context.to_string(),
                reason: "simulated outage".to_string(),
            });
        }
        Ok(())
    }
}

pub fn synthetic_round(
    round: RaceRound,
    drivers: usize,
    laps: u32,
) -> (Vec<QualifyingEntry>, Vec<RaceLap>) {
    let mut rng = StdRng::seed_from_u64(round.year() as u64 * 100 + round.round() as u64);
    let mut qualifying = Vec::with_capacity(drivers);
    let mut race = Vec::with_capacity(drivers * laps as usize);

    for (idx, (code, name)) in GRID.iter().cycle().take(drivers).enumerate() {
        let code = if idx < GRID.len() {
            code.to_string()
        } else {
            format!("{}{}", code, idx / GRID.len())
        };
        let Some(driver) = DriverCode::new(&code) else {
            continue;
        };

        let pace = 88.0 + idx as f64 * 0.25 + rng.random_range(0.0..0.2);
        qualifying.push(QualifyingEntry {
            driver: driver.clone(),
            full_name: name.to_string(),
            q1: LapTime::from_seconds(pace + 0.8),
            q2: LapTime::from_seconds(pace + 0.4),
            q3: LapTime::from_seconds(pace),
        });

        for lap_number in 1..=laps {
            // Fuel burn makes the car quicker as the race goes on.
            let fuel = (laps - lap_number) as f64 * 0.03;
            let noise = rng.random_range(-0.3..0.3);
            let pit = if lap_number == laps / 2 { 20.0 } else { 0.0 };
            race.push(RaceLap {
                driver: driver.clone(),
                lap_number,
                duration: LapTime::from_seconds(pace + 5.0 + fuel + noise + pit),
            });
        }
    }

    (qualifying, race)
}

#[async_trait]
impl SessionDataProvider for MockSessionProvider {
    async fn get_schedule(&self, year: i32) -> Result<Vec<EventInfo>, SessionDataError> {
        self.check_year(year, "schedule")?;
        Ok(self.schedules.get(&year).cloned().unwrap_or_default())
    }

    async fn get_session_results(
        &self,
        round: RaceRound,
        kind: SessionKind,
    ) -> Result<SessionTable, SessionDataError> {
        self.check_year(round.year(), kind.as_str())?;
        debug!("MockSessionProvider: {} {}", kind, round);
        self.tables
            .get(&(round, kind))
            .cloned()
            .ok_or(SessionDataError::NoData {
                year: round.year(),
                round: round.round(),
                kind,
            })
    }
}

/// In-memory telemetry provider for tests and offline runs.
#[derive(Default)]
pub struct MockTelemetryProvider {
    laps: HashMap<RaceRound, LapTelemetry>,
}

impl MockTelemetryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lap(mut self, round: RaceRound, lap: LapTelemetry) -> Self {
        self.laps.insert(round, lap);
        self
    }

    /// Registers a synthetic lap around an oval-ish circuit.
    pub fn with_synthetic_lap(self, round: RaceRound, samples: usize) -> Self {
        let lap = synthetic_lap(round, samples);
        self.with_lap(round, lap)
    }
}

pub fn synthetic_lap(round: RaceRound, samples: usize) -> LapTelemetry {
    let start = Utc.with_ymd_and_hms(round.year(), 3, 2, 15, 0, 0).single().unwrap_or_default();
    let points = (0..samples)
        .map(|i| {
            let angle = i as f64 / samples.max(1) as f64 * std::f64::consts::TAU;
            // Straights along the x axis are fast, the ends are slow corners.
            let straight = angle.sin().abs();
            let speed = 120.0 + 200.0 * straight;
            let gear = (2.0 + 6.0 * straight).round() as u8;
            TelemetrySample {
                timestamp: start + Duration::milliseconds(i as i64 * 250),
                x: 4000.0 * angle.cos(),
                y: 1500.0 * angle.sin(),
                speed,
                gear,
                drs: if speed > 290.0 { 12 } else { 0 },
            }
        })
        .collect();

    LapTelemetry {
        year: round.year(),
        driver_number: 1,
        lap_number: 42,
        samples: points,
    }
}

#[async_trait]
impl TelemetryProvider for MockTelemetryProvider {
    async fn fastest_lap_telemetry(&self, round: RaceRound) -> Result<LapTelemetry, SessionDataError> {
        self.laps
            .get(&round)
            .cloned()
            .ok_or(SessionDataError::NoData {
                year: round.year(),
                round: round.round(),
                kind: SessionKind::Race,
            })
    }
}
