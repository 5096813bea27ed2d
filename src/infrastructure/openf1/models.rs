use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Meeting {
    pub meeting_key: u32,
    pub meeting_name: String,
    pub date_start: DateTime<Utc>,
    #[serde(default)]
    pub country_name: Option<String>,
}

impl Meeting {
    /// Pre-season tests are listed as meetings but are not championship rounds.
    pub fn is_testing(&self) -> bool {
        self.meeting_name.to_lowercase().contains("testing")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub session_key: u32,
    pub session_name: String,
    pub date_start: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lap {
    pub driver_number: u32,
    pub lap_number: u32,
    pub lap_duration: Option<f64>,
    pub date_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarDataPoint {
    pub date: DateTime<Utc>,
    pub driver_number: u32,
    pub speed: Option<f64>,
    pub n_gear: Option<u8>,
    pub drs: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationPoint {
    pub date: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
}
