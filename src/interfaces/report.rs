use super::gauge::{ErrorGauge, gauges};
use super::prediction_table::render_prediction_table;
use crate::application::ml::PredictionRow;
use crate::application::race::{PipelineOutcome, PredictionReport};
use crate::config::PresentationEnvConfig;
use crate::domain::session::EventInfo;
use serde::Serialize;
use std::fmt::Write;

/// Serialisable form of a report, with gauge descriptors in place of raw scores.
#[derive(Debug, Serialize)]
pub struct PredictionReportView<'a> {
    #[serde(flatten)]
    pub report: &'a PredictionReport,
    pub gauges: Vec<ErrorGauge>,
}

impl<'a> PredictionReportView<'a> {
    pub fn new(report: &'a PredictionReport, config: &PresentationEnvConfig) -> Self {
        let gauges = match &report.outcome {
            PipelineOutcome::Completed { scores, .. } => gauges(scores, config),
            _ => Vec::new(),
        };
        Self { report, gauges }
    }

    pub fn rows(&self) -> &[PredictionRow] {
        match &self.report.outcome {
            PipelineOutcome::Completed { rows, .. } => rows,
            _ => &[],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn render_report(report: &PredictionReport, config: &PresentationEnvConfig) -> String {
    let view = PredictionReportView::new(report, config);
    let mut out = String::new();

    let title = match (&report.target, &report.prior) {
        (Some(target), Some(prior)) => format!(
            "{}{}: qualifying {} vs race laps {}",
            target,
            report
                .event_name
                .as_ref()
                .map(|n| format!(" ({})", n))
                .unwrap_or_default(),
            target.year(),
            prior.year()
        ),
        _ => "Race lap time prediction".to_string(),
    };
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out, "🏁 {}", title);
    let _ = writeln!(out, "{}", "=".repeat(80));

    for warning in &report.warnings {
        let _ = writeln!(out, "⚠️  {}", warning);
    }

    match &report.outcome {
        PipelineOutcome::Completed {
            training_examples,
            held_out_examples,
            ..
        } => {
            let _ = writeln!(
                out,
                "\nModel error (MAPE, {} training laps, {} held out)",
                training_examples, held_out_examples
            );
            let name_width = view.gauges.iter().map(|g| g.model.len()).max().unwrap_or(0);
            for gauge in &view.gauges {
                let _ = writeln!(out, "  {}", gauge.render(name_width));
            }
            let _ = writeln!(out, "\nPredicted race lap times");
            out.push_str(&render_prediction_table(view.rows()));
        }
        PipelineOutcome::DataUnavailable { .. } => {
            let _ = writeln!(out, "\nNo prediction: session data unavailable.");
        }
        PipelineOutcome::InsufficientData {
            available,
            required,
        } => {
            let _ = writeln!(
                out,
                "\nNo prediction: {} training laps available, {} required.",
                available, required
            );
        }
    }

    out
}

pub fn render_schedule(year: i32, events: &[EventInfo]) -> String {
    let mut out = String::new();
    if events.is_empty() {
        let _ = writeln!(out, "No events found for {}.", year);
        return out;
    }
    let _ = writeln!(out, "{:>5} | {:<10} | {}", "Round", "Date", "Event");
    let _ = writeln!(out, "{}", "-".repeat(60));
    for event in events {
        let date = event
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let circuit = event
            .circuit_name
            .as_ref()
            .map(|c| format!(" ({})", c))
            .unwrap_or_default();
        let _ = writeln!(out, "{:>5} | {:<10} | {}{}", event.round, date, event.event_name, circuit);
    }
    out
}
