use super::lap_time::LapTime;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Driver abbreviation ("VER", "HAM"), the join key between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverCode(String);

impl DriverCode {
    /// Normalises to upper case; rejects blank input.
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let trimmed = code.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a season schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub round: u32,
    pub event_name: String,
    pub date: Option<NaiveDate>,
    pub circuit_name: Option<String>,
}

impl EventInfo {
    pub fn new(round: u32, event_name: impl Into<String>) -> Self {
        Self {
            round,
            event_name: event_name.into(),
            date: None,
            circuit_name: None,
        }
    }
}

/// Qualifying classification row as delivered by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingEntry {
    pub driver: DriverCode,
    pub full_name: String,
    pub q1: Option<LapTime>,
    pub q2: Option<LapTime>,
    pub q3: Option<LapTime>,
}

impl QualifyingEntry {
    /// Best available segment: Q3, then Q2, then Q1.
    pub fn best_segment(&self) -> Option<LapTime> {
        self.q3.or(self.q2).or(self.q1)
    }
}

/// Qualifying row with a best time that is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingResult {
    pub driver: DriverCode,
    pub full_name: String,
    pub q1: Option<LapTime>,
    pub q2: Option<LapTime>,
    pub q3: Option<LapTime>,
    pub best_time_seconds: f64,
    /// False when `best_time_seconds` is the no-time penalty value.
    pub set_time: bool,
}

/// One lap of one driver in a race. `duration` is `None` for laps the timing
/// system did not record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceLap {
    pub driver: DriverCode,
    pub lap_number: u32,
    pub duration: Option<LapTime>,
}

/// Rows returned by a session request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows")]
pub enum SessionTable {
    Qualifying(Vec<QualifyingEntry>),
    Race(Vec<RaceLap>),
}

impl SessionTable {
    pub fn len(&self) -> usize {
        match self {
            SessionTable::Qualifying(rows) => rows.len(),
            SessionTable::Race(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_qualifying(self) -> Option<Vec<QualifyingEntry>> {
        match self {
            SessionTable::Qualifying(rows) => Some(rows),
            SessionTable::Race(_) => None,
        }
    }

    pub fn into_race_laps(self) -> Option<Vec<RaceLap>> {
        match self {
            SessionTable::Race(rows) => Some(rows),
            SessionTable::Qualifying(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(q1: Option<f64>, q2: Option<f64>, q3: Option<f64>) -> QualifyingEntry {
        QualifyingEntry {
            driver: DriverCode::new("ver").unwrap(),
            full_name: "Max Verstappen".to_string(),
            q1: q1.and_then(LapTime::from_seconds),
            q2: q2.and_then(LapTime::from_seconds),
            q3: q3.and_then(LapTime::from_seconds),
        }
    }

    #[test]
    fn test_driver_code_normalisation() {
        assert_eq!(DriverCode::new(" ham ").unwrap().as_str(), "HAM");
        assert!(DriverCode::new("   ").is_none());
    }

    #[test]
    fn test_best_segment_priority() {
        let all = entry(Some(91.0), Some(90.5), Some(90.1));
        assert_eq!(all.best_segment().unwrap().as_seconds(), 90.1);

        let no_q3 = entry(Some(91.0), Some(90.5), None);
        assert_eq!(no_q3.best_segment().unwrap().as_seconds(), 90.5);

        let q1_only = entry(Some(95.2), None, None);
        assert_eq!(q1_only.best_segment().unwrap().as_seconds(), 95.2);

        assert!(entry(None, None, None).best_segment().is_none());
    }

    #[test]
    fn test_q3_wins_even_when_slower() {
        let slower_q3 = entry(Some(89.0), Some(89.5), Some(90.0));
        assert_eq!(slower_q3.best_segment().unwrap().as_seconds(), 90.0);
    }

    #[test]
    fn test_session_table_accessors() {
        let table = SessionTable::Race(vec![]);
        assert!(table.is_empty());
        assert!(table.clone().into_qualifying().is_none());
        assert_eq!(table.into_race_laps(), Some(vec![]));
    }
}
