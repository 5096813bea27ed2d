use crate::domain::errors::SessionDataError;
use crate::domain::session::types::EventInfo;
use anyhow::anyhow;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First season with recorded world championship data.
pub const FIRST_SEASON: i32 = 1950;

/// A season and a round number within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RaceRound {
    year: i32,
    round: u32,
}

impl RaceRound {
    pub fn new(year: i32, round: u32) -> Result<Self, SessionDataError> {
        if year < FIRST_SEASON {
            return Err(SessionDataError::InvalidRound {
                reason: format!("season {} predates {}", year, FIRST_SEASON),
            });
        }
        if round == 0 {
            return Err(SessionDataError::InvalidRound {
                reason: "round numbers start at 1".to_string(),
            });
        }
        Ok(Self { year, round })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn round(&self) -> u32 {
        self.round
    }
}

impl fmt::Display for RaceRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} round {}", self.year, self.round)
    }
}

/// Checks that a season lies between the first championship and next year.
pub fn validate_season(year: i32) -> anyhow::Result<i32> {
    let latest = chrono::Utc::now().year() + 1;
    if (FIRST_SEASON..=latest).contains(&year) {
        Ok(year)
    } else {
        Err(anyhow!(
            "Invalid season {}. Must be between {} and {}",
            year,
            FIRST_SEASON,
            latest
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Qualifying,
    Race,
}

impl SessionKind {
    /// Lower-case identifier used in cache keys and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Qualifying => "qualifying",
            SessionKind::Race => "race",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Qualifying => write!(f, "Qualifying"),
            SessionKind::Race => write!(f, "Race"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "q" | "qualifying" => Ok(SessionKind::Qualifying),
            "r" | "race" => Ok(SessionKind::Race),
            _ => anyhow::bail!("Invalid session kind: {}. Must be 'qualifying' or 'race'", s),
        }
    }
}

/// How the user picked a round: by number or by event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundSelector {
    Number(u32),
    EventName(String),
}

impl RoundSelector {
    pub fn needs_schedule(&self) -> bool {
        matches!(self, RoundSelector::EventName(_))
    }

    /// Resolves the selector against a season schedule.
    ///
    /// Names match case-insensitively, first exactly and then as a unique
    /// substring ("monaco" finds "Monaco Grand Prix"). Numbers are taken as-is.
    pub fn resolve(&self, year: i32, schedule: &[EventInfo]) -> Result<RaceRound, SessionDataError> {
        match self {
            RoundSelector::Number(round) => RaceRound::new(year, *round),
            RoundSelector::EventName(query) => {
                let needle = query.trim().to_lowercase();
                let not_found = || SessionDataError::EventNotFound {
                    year,
                    query: query.clone(),
                };

                if let Some(event) = schedule
                    .iter()
                    .find(|e| e.event_name.to_lowercase() == needle)
                {
                    return RaceRound::new(year, event.round);
                }

                let mut candidates = schedule
                    .iter()
                    .filter(|e| e.event_name.to_lowercase().contains(&needle));
                match (candidates.next(), candidates.next()) {
                    (Some(event), None) => RaceRound::new(year, event.round),
                    _ => Err(not_found()),
                }
            }
        }
    }
}

impl FromStr for RoundSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            anyhow::bail!("Round selector must not be empty");
        }
        match trimmed.parse::<u32>() {
            Ok(n) => Ok(RoundSelector::Number(n)),
            Err(_) => Ok(RoundSelector::EventName(trimmed.to_string())),
        }
    }
}

impl fmt::Display for RoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundSelector::Number(n) => write!(f, "round {}", n),
            RoundSelector::EventName(name) => write!(f, "'{}'", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Vec<EventInfo> {
        vec![
            EventInfo::new(1, "Bahrain Grand Prix"),
            EventInfo::new(2, "Saudi Arabian Grand Prix"),
            EventInfo::new(8, "Monaco Grand Prix"),
            EventInfo::new(9, "Spanish Grand Prix"),
        ]
    }

    #[test]
    fn test_race_round_validation() {
        assert!(RaceRound::new(1949, 1).is_err());
        assert!(RaceRound::new(2024, 0).is_err());
        let round = RaceRound::new(2024, 5).unwrap();
        assert_eq!(round.year(), 2024);
        assert_eq!(round.round(), 5);
        assert_eq!(round.to_string(), "2024 round 5");
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!(
            "7".parse::<RoundSelector>().unwrap(),
            RoundSelector::Number(7)
        );
        assert_eq!(
            " Monaco ".parse::<RoundSelector>().unwrap(),
            RoundSelector::EventName("Monaco".to_string())
        );
        assert!("  ".parse::<RoundSelector>().is_err());
    }

    #[test]
    fn test_resolve_by_exact_name() {
        let selector = RoundSelector::EventName("monaco grand prix".to_string());
        let round = selector.resolve(2023, &schedule()).unwrap();
        assert_eq!(round.round(), 8);
    }

    #[test]
    fn test_resolve_by_unique_substring() {
        let selector = RoundSelector::EventName("Saudi".to_string());
        assert_eq!(selector.resolve(2023, &schedule()).unwrap().round(), 2);
    }

    #[test]
    fn test_resolve_ambiguous_or_missing_name_fails() {
        let ambiguous = RoundSelector::EventName("Grand Prix".to_string());
        assert!(matches!(
            ambiguous.resolve(2023, &schedule()),
            Err(SessionDataError::EventNotFound { .. })
        ));

        let missing = RoundSelector::EventName("Las Vegas".to_string());
        assert!(missing.resolve(2023, &schedule()).is_err());
    }

    #[test]
    fn test_resolve_number_ignores_schedule() {
        let selector = RoundSelector::Number(22);
        assert_eq!(selector.resolve(2023, &[]).unwrap().round(), 22);
    }

    #[test]
    fn test_session_kind_parsing() {
        assert_eq!("R".parse::<SessionKind>().unwrap(), SessionKind::Race);
        assert_eq!(
            "qualifying".parse::<SessionKind>().unwrap(),
            SessionKind::Qualifying
        );
        assert!("sprint".parse::<SessionKind>().is_err());
    }

    #[test]
    fn test_validate_season() {
        assert!(validate_season(2023).is_ok());
        assert!(validate_season(1900).is_err());
        assert!(validate_season(3000).is_err());
    }
}
