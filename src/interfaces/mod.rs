//! Terminal presentation: gauges, tables, JSON and CSV output.

pub mod gauge;
pub mod prediction_table;
pub mod racing_line_export;
pub mod report;

pub use gauge::{BandColour, ErrorGauge, GaugeBand};
pub use prediction_table::render_prediction_table;
pub use racing_line_export::write_racing_line_csv;
pub use report::{PredictionReportView, render_report, render_schedule};
