use crate::application::ml::PredictionRow;
use std::fmt::Write;

/// Renders one row per driver: name, qualifying time, then one column per model.
///
/// Drivers ranked with the no-time penalty are marked with `*`.
pub fn render_prediction_table(rows: &[PredictionRow]) -> String {
    let mut out = String::new();
    let Some(first) = rows.first() else {
        out.push_str("No predictions.\n");
        return out;
    };

    let models: Vec<&str> = first.predictions.iter().map(|p| p.model.as_str()).collect();
    let name_width = rows
        .iter()
        .map(|r| r.full_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Driver".len());
    let column_widths: Vec<usize> = models.iter().map(|m| m.len().max(10)).collect();

    let _ = write!(out, "{:<4} | {:<nw$} | {:>14}", "Code", "Driver", "Qualifying (s)", nw = name_width);
    for (model, width) in models.iter().zip(&column_widths) {
        let _ = write!(out, " | {:>w$}", model, w = width);
    }
    out.push('\n');
    let total_width = 4 + 3 + name_width + 3 + 14 + column_widths.iter().map(|w| w + 3).sum::<usize>();
    out.push_str(&"-".repeat(total_width));
    out.push('\n');

    let mut penalised = false;
    for row in rows {
        let marker = if row.set_qualifying_time {
            " "
        } else {
            penalised = true;
            "*"
        };
        let _ = write!(
            out,
            "{:<4} | {:<nw$} | {:>13.3}{}",
            row.driver.as_str(),
            row.full_name,
            row.qualifying_time_seconds,
            marker,
            nw = name_width
        );
        for (model, width) in models.iter().zip(&column_widths) {
            match row.prediction_for(model) {
                Some(value) => {
                    let _ = write!(out, " | {:>w$.3}", value, w = width);
                }
                None => {
                    let _ = write!(out, " | {:>w$}", "-", w = width);
                }
            }
        }
        out.push('\n');
    }

    if penalised {
        out.push_str("* no qualifying time set; penalty time used\n");
    }
    out
}
