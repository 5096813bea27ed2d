//! Wire types of the Ergast-compatible JSON API.
//!
//! Every number is transmitted as a string; conversion happens in the client.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ErgastResponse {
    #[serde(rename = "MRData")]
    pub mr_data: MrData,
}

#[derive(Debug, Deserialize)]
pub struct MrData {
    #[serde(default)]
    pub limit: String,
    #[serde(default)]
    pub offset: String,
    #[serde(default)]
    pub total: String,
    #[serde(rename = "RaceTable")]
    pub race_table: Option<RaceTable>,
}

impl MrData {
    /// Total number of rows the query matches, across all pages.
    pub fn total_rows(&self) -> usize {
        self.total.parse().unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
pub struct RaceTable {
    #[serde(rename = "Races", default)]
    pub races: Vec<ErgastRace>,
}

#[derive(Debug, Deserialize)]
pub struct ErgastRace {
    pub round: String,
    #[serde(rename = "raceName")]
    pub race_name: String,
    pub date: Option<String>,
    #[serde(rename = "Circuit")]
    pub circuit: Option<ErgastCircuit>,
    #[serde(rename = "QualifyingResults", default)]
    pub qualifying_results: Vec<ErgastQualifyingResult>,
    #[serde(rename = "Laps", default)]
    pub laps: Vec<ErgastLap>,
    #[serde(rename = "Results", default)]
    pub results: Vec<ErgastResult>,
}

#[derive(Debug, Deserialize)]
pub struct ErgastCircuit {
    #[serde(rename = "circuitName")]
    pub circuit_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErgastDriver {
    #[serde(rename = "driverId")]
    pub driver_id: String,
    /// Three-letter code; absent for many pre-2000 drivers.
    pub code: Option<String>,
    #[serde(rename = "givenName", default)]
    pub given_name: String,
    #[serde(rename = "familyName", default)]
    pub family_name: String,
}

impl ErgastDriver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
            .trim()
            .to_string()
    }

    /// Code used to join sessions, falling back to the upper-cased id.
    pub fn join_code(&self) -> String {
        match self.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_uppercase(),
            _ => self.driver_id.to_uppercase(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErgastQualifyingResult {
    #[serde(rename = "Driver")]
    pub driver: ErgastDriver,
    #[serde(rename = "Q1")]
    pub q1: Option<String>,
    #[serde(rename = "Q2")]
    pub q2: Option<String>,
    #[serde(rename = "Q3")]
    pub q3: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErgastLap {
    pub number: String,
    #[serde(rename = "Timings", default)]
    pub timings: Vec<ErgastTiming>,
}

#[derive(Debug, Deserialize)]
pub struct ErgastTiming {
    #[serde(rename = "driverId")]
    pub driver_id: String,
    pub time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErgastResult {
    #[serde(rename = "Driver")]
    pub driver: ErgastDriver,
}
