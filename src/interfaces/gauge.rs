use crate::application::ml::EvaluationScore;
use crate::config::PresentationEnvConfig;
use serde::Serialize;
use std::fmt;

/// Axis headroom above the score.
pub const AXIS_HEADROOM: f64 = 2.0;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandColour {
    Green,
    Yellow,
    Red,
}

impl fmt::Display for BandColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandColour::Green => write!(f, "green"),
            BandColour::Yellow => write!(f, "yellow"),
            BandColour::Red => write!(f, "red"),
        }
    }
}

/// Half-open band `[from, to)` of the error axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeBand {
    pub from: f64,
    pub to: f64,
    pub colour: BandColour,
}

/// Gauge descriptor for one model's percentage error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorGauge {
    pub model: String,
    /// MAPE on the 0-100 scale; `None` when undefined.
    pub value: Option<f64>,
    pub axis_min: f64,
    pub axis_max: f64,
    pub bands: Vec<GaugeBand>,
    pub value_colour: Option<BandColour>,
    /// Red threshold marker, placed at the value.
    pub threshold: Option<f64>,
}

pub fn bands(config: &PresentationEnvConfig) -> Vec<GaugeBand> {
    vec![
        GaugeBand {
            from: 0.0,
            to: config.green_max,
            colour: BandColour::Green,
        },
        GaugeBand {
            from: config.green_max,
            to: config.yellow_max,
            colour: BandColour::Yellow,
        },
        GaugeBand {
            from: config.yellow_max,
            to: config.red_max,
            colour: BandColour::Red,
        },
    ]
}

/// Colour of the band holding `value`; anything past the last band is red.
pub fn band_colour(value: f64, config: &PresentationEnvConfig) -> BandColour {
    if value < config.green_max {
        BandColour::Green
    } else if value < config.yellow_max {
        BandColour::Yellow
    } else {
        BandColour::Red
    }
}

impl ErrorGauge {
    pub fn from_score(score: &EvaluationScore, config: &PresentationEnvConfig) -> Self {
        let value = score.mape.filter(|v| v.is_finite() && *v >= 0.0);
        Self {
            model: score.model.clone(),
            value,
            axis_min: 0.0,
            axis_max: value.map_or(config.red_max, |v| v + AXIS_HEADROOM),
            bands: bands(config),
            value_colour: value.map(|v| band_colour(v, config)),
            threshold: value,
        }
    }

    /// One-line text rendering: name, bar, value and band.
    pub fn render(&self, name_width: usize) -> String {
        match (self.value, self.value_colour) {
            (Some(value), Some(colour)) => {
                let filled = ((value / self.axis_max) * BAR_WIDTH as f64).round() as usize;
                let filled = filled.min(BAR_WIDTH);
                format!(
                    "{:<width$} [{}{}] {:>7.3}% ({})",
                    self.model,
                    "#".repeat(filled),
                    ".".repeat(BAR_WIDTH - filled),
                    value,
                    colour,
                    width = name_width
                )
            }
            _ => format!(
                "{:<width$} [{}] undefined (no held-out lap could be scored)",
                self.model,
                " ".repeat(BAR_WIDTH),
                width = name_width
            ),
        }
    }
}

pub fn gauges(scores: &[EvaluationScore], config: &PresentationEnvConfig) -> Vec<ErrorGauge> {
    scores
        .iter()
        .map(|s| ErrorGauge::from_score(s, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(mape: Option<f64>) -> EvaluationScore {
        EvaluationScore {
            model: "XGBoost".to_string(),
            mape,
            mae: None,
            rmse: None,
            scored: 10,
            excluded: 0,
        }
    }

    #[test]
    fn test_band_colours_use_half_open_ranges() {
        let config = PresentationEnvConfig::default();
        assert_eq!(band_colour(0.0, &config), BandColour::Green);
        assert_eq!(band_colour(9.999, &config), BandColour::Green);
        assert_eq!(band_colour(10.0, &config), BandColour::Yellow);
        assert_eq!(band_colour(15.0, &config), BandColour::Red);
        assert_eq!(band_colour(40.0, &config), BandColour::Red);
    }

    #[test]
    fn test_gauge_axis_and_threshold() {
        let gauge = ErrorGauge::from_score(&score(Some(3.5)), &PresentationEnvConfig::default());
        assert_eq!(gauge.axis_max, 5.5);
        assert_eq!(gauge.threshold, Some(3.5));
        assert_eq!(gauge.value_colour, Some(BandColour::Green));
        assert_eq!(gauge.bands.len(), 3);
        assert_eq!(gauge.bands[2].to, 25.0);
    }

    #[test]
    fn test_undefined_score_has_no_value() {
        let gauge = ErrorGauge::from_score(&score(None), &PresentationEnvConfig::default());
        assert!(gauge.value.is_none());
        assert!(gauge.threshold.is_none());
        assert!(gauge.render(10).contains("undefined"));
    }

    #[test]
    fn test_render_shows_value_and_band() {
        let gauge = ErrorGauge::from_score(&score(Some(12.25)), &PresentationEnvConfig::default());
        let line = gauge.render(10);
        assert!(line.contains("12.250%"));
        assert!(line.contains("(yellow)"));
    }
}
