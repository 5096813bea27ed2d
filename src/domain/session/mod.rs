//! Race session domain: rounds, schedules, qualifying classifications and laps.

pub mod lap_time;
pub mod qualifying;
pub mod round;
pub mod types;

pub use lap_time::LapTime;
pub use qualifying::{DEFAULT_SENTINEL_PENALTY_SECS, derive_best_times};
pub use round::{FIRST_SEASON, RaceRound, RoundSelector, SessionKind, validate_season};
pub use types::{
    DriverCode, EventInfo, QualifyingEntry, QualifyingResult, RaceLap, SessionTable,
};
