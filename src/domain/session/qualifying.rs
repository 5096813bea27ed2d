use super::round::{RaceRound, SessionKind};
use super::types::{DriverCode, QualifyingEntry, QualifyingResult};
use crate::domain::errors::SessionDataError;
use std::collections::HashSet;
use tracing::warn;

/// Seconds added to the slowest recorded best time for drivers without any
/// qualifying time. Places them at the back of the grid while keeping them in
/// the prediction set.
pub const DEFAULT_SENTINEL_PENALTY_SECS: f64 = 100.0;

/// Derives `best_time_seconds` for every driver of a qualifying session.
///
/// Drivers with no segment time get `max(best) + penalty_secs`. Duplicate rows
/// for a driver keep the first occurrence. Fails with `NoData` when the table is
/// empty or nobody set a time.
pub fn derive_best_times(
    round: RaceRound,
    entries: &[QualifyingEntry],
    penalty_secs: f64,
) -> Result<Vec<QualifyingResult>, SessionDataError> {
    let no_data = || SessionDataError::NoData {
        year: round.year(),
        round: round.round(),
        kind: SessionKind::Qualifying,
    };

    let mut seen: HashSet<&DriverCode> = HashSet::new();
    let mut unique: Vec<&QualifyingEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if seen.insert(&entry.driver) {
            unique.push(entry);
        } else {
            warn!(
                "Qualifying {}: duplicate row for {}, keeping the first",
                round, entry.driver
            );
        }
    }

    let slowest = unique
        .iter()
        .filter_map(|e| e.best_segment())
        .map(|t| t.as_seconds())
        .fold(None, |acc: Option<f64>, t| Some(acc.map_or(t, |m| m.max(t))))
        .ok_or_else(no_data)?;

    let sentinel = slowest + penalty_secs;

    Ok(unique
        .into_iter()
        .map(|e| {
            let best = e.best_segment().map(|t| t.as_seconds());
            QualifyingResult {
                driver: e.driver.clone(),
                full_name: e.full_name.clone(),
                q1: e.q1,
                q2: e.q2,
                q3: e.q3,
                best_time_seconds: best.unwrap_or(sentinel),
                set_time: best.is_some(),
            }
        })
        .collect())
}
