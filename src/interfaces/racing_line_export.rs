use crate::application::racing_line::RacingLineReport;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

pub const ACTUAL_SERIES: &str = "actual";
pub const PREDICTED_SERIES: &str = "predicted";

#[derive(Debug, Serialize)]
struct RacingLineCsvRow {
    series: &'static str,
    year: i32,
    x: f64,
    y: f64,
    speed: f64,
    gear: u8,
    drs_status: String,
    predicted_speed: Option<f64>,
}

/// Writes the actual lap (if any) and the predicted line as CSV.
///
/// Returns the number of data rows written.
pub fn write_racing_line_csv<W: Write>(report: &RacingLineReport, writer: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    let mut written = 0;

    if let Some(lap) = &report.actual {
        for sample in &lap.samples {
            wtr.serialize(RacingLineCsvRow {
                series: ACTUAL_SERIES,
                year: lap.year,
                x: sample.x,
                y: sample.y,
                speed: sample.speed,
                gear: sample.gear,
                drs_status: sample.drs_status().to_string(),
                predicted_speed: None,
            })
            .context("Failed to write actual lap row")?;
            written += 1;
        }
    }

    if let Some(line) = &report.predicted {
        for point in &line.points {
            wtr.serialize(RacingLineCsvRow {
                series: PREDICTED_SERIES,
                year: point.year,
                x: point.x,
                y: point.y,
                speed: point.speed,
                gear: point.gear,
                drs_status: point.drs_status.to_string(),
                predicted_speed: Some(point.predicted_speed),
            })
            .context("Failed to write predicted line row")?;
            written += 1;
        }
    }

    if written == 0 {
        wtr.write_record([
            "series",
            "year",
            "x",
            "y",
            "speed",
            "gear",
            "drs_status",
            "predicted_speed",
        ])
        .context("Failed to write CSV header")?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::racing_line::{PredictedLine, PredictedPoint};
    use crate::domain::session::RaceRound;
    use crate::domain::telemetry::DrsStatus;
    use crate::infrastructure::mock::synthetic_lap;

    #[test]
    fn test_csv_contains_both_series() {
        let report = RacingLineReport {
            year: 2024,
            event_name: "Monaco Grand Prix".to_string(),
            actual: Some(synthetic_lap(RaceRound::new(2024, 8).unwrap(), 3)),
            track_maps: Vec::new(),
            predicted: Some(PredictedLine {
                model: "Racing Line Speed".to_string(),
                seasons: vec![2023],
                points: vec![PredictedPoint {
                    year: 2023,
                    x: 1.0,
                    y: 2.0,
                    gear: 7,
                    drs_status: DrsStatus::On,
                    speed: 300.0,
                    predicted_speed: 298.5,
                }],
            }),
            warnings: Vec::new(),
        };

        let mut buf = Vec::new();
        let written = write_racing_line_csv(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(written, 4);
        assert_eq!(lines[0], "series,year,x,y,speed,gear,drs_status,predicted_speed");
        assert!(lines[1].starts_with("actual,2024,"));
        assert!(lines[1].ends_with(','));
        assert_eq!(lines[4], "predicted,2023,1.0,2.0,300.0,7,DRS On,298.5");
    }

    #[test]
    fn test_empty_report_writes_header_only() {
        let report = RacingLineReport {
            year: 2026,
            event_name: "Madrid Grand Prix".to_string(),
            actual: None,
            track_maps: Vec::new(),
            predicted: None,
            warnings: Vec::new(),
        };
        let mut buf = Vec::new();
        assert_eq!(write_racing_line_csv(&report, &mut buf).unwrap(), 0);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "series,year,x,y,speed,gear,drs_status,predicted_speed\n"
        );
    }
}
