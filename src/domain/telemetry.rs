use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One merged car-data / position sample of a lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
    /// km/h
    pub speed: f64,
    pub gear: u8,
    /// Raw DRS channel value as reported by the timing feed.
    pub drs: u8,
}

impl TelemetrySample {
    pub fn drs_status(&self) -> DrsStatus {
        DrsStatus::from_raw(self.drs)
    }

    /// Model inputs for speed prediction, in the order (x, y, gear).
    pub fn position_features(&self) -> Vec<f64> {
        vec![self.x, self.y, self.gear as f64]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrsStatus {
    On,
    Off,
}

impl DrsStatus {
    /// Any non-zero raw value counts as open.
    pub fn from_raw(raw: u8) -> Self {
        if raw > 0 { DrsStatus::On } else { DrsStatus::Off }
    }
}

impl fmt::Display for DrsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrsStatus::On => write!(f, "DRS On"),
            DrsStatus::Off => write!(f, "DRS Off"),
        }
    }
}

/// Telemetry of the fastest lap of a session, tagged with its season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapTelemetry {
    pub year: i32,
    pub driver_number: u32,
    pub lap_number: u32,
    pub samples: Vec<TelemetrySample>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drs_status_from_raw() {
        assert_eq!(DrsStatus::from_raw(0), DrsStatus::Off);
        assert_eq!(DrsStatus::from_raw(8), DrsStatus::On);
        assert_eq!(DrsStatus::from_raw(12), DrsStatus::On);
        assert_eq!(DrsStatus::On.to_string(), "DRS On");
    }
}
