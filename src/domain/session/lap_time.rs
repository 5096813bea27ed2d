use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A timed lap or qualifying segment, stored with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LapTime {
    millis: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid lap time '{0}'")]
pub struct LapTimeParseError(pub String);

impl LapTime {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Returns `None` for negative or non-finite values.
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(Self {
            millis: (seconds * 1000.0).round() as u64,
        })
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    pub fn as_seconds(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Parses an optional upstream field where an empty string means "no time".
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, LapTimeParseError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

/// Accepts `ss.fff`, `m:ss.fff` and `h:mm:ss.fff`.
impl FromStr for LapTime {
    type Err = LapTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LapTimeParseError(s.to_string());
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() > 3 {
            return Err(invalid());
        }

        let (head, seconds_part) = parts.split_at(parts.len() - 1);
        let seconds: f64 = seconds_part[0].parse().map_err(|_| invalid())?;
        if !seconds.is_finite() || seconds < 0.0 || (!head.is_empty() && seconds >= 60.0) {
            return Err(invalid());
        }

        let mut whole_minutes: u64 = 0;
        for unit in head {
            let value: u64 = unit.parse().map_err(|_| invalid())?;
            whole_minutes = whole_minutes
                .checked_mul(60)
                .and_then(|m| m.checked_add(value))
                .ok_or_else(invalid)?;
        }

        let fraction_millis = (seconds * 1000.0).round();
        if fraction_millis >= u64::MAX as f64 {
            return Err(invalid());
        }
        let millis = whole_minutes
            .checked_mul(60_000)
            .and_then(|m| m.checked_add(fraction_millis as u64))
            .ok_or_else(invalid)?;
        Ok(Self { millis })
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.millis / 60_000;
        let rest = self.millis % 60_000;
        write!(f, "{}:{:02}.{:03}", minutes, rest / 1000, rest % 1000)
    }
}
