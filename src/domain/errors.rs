use crate::domain::session::SessionKind;
use thiserror::Error;

/// Errors raised while fetching session data from an upstream provider.
///
/// Every variant is a flavour of "data unavailable": callers recover from it
/// instead of aborting the run.
#[derive(Debug, Clone, Error)]
pub enum SessionDataError {
    #[error("Upstream request failed for {context}: {reason}")]
    Upstream { context: String, reason: String },

    #[error("No {kind} data recorded for {year} round {round}")]
    NoData {
        year: i32,
        round: u32,
        kind: SessionKind,
    },

    #[error("Malformed upstream data for {context}: {reason}")]
    Malformed { context: String, reason: String },

    #[error("Request for {context} timed out after {duration_ms}ms")]
    Timeout { context: String, duration_ms: u64 },

    #[error("No event matching '{query}' in the {year} schedule")]
    EventNotFound { year: i32, query: String },

    #[error("Invalid round: {reason}")]
    InvalidRound { reason: String },
}

/// Conditions that stop a prediction run from producing numbers.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Session data unavailable: {0}")]
    DataUnavailable(#[from] SessionDataError),

    #[error("Insufficient data: {available} examples, at least {required} required")]
    InsufficientData { available: usize, required: usize },

    #[error("Undefined metric for {model}: no held-out label could be scored")]
    UndefinedMetric { model: String },

    #[error(transparent)]
    ModelFailed(#[from] ModelError),
}

/// Errors raised by regressors.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("{model}: training failed: {reason}")]
    Fit { model: String, reason: String },

    #[error("{model}: prediction failed: {reason}")]
    Predict { model: String, reason: String },

    #[error("Shape mismatch: {features} feature rows, {labels} labels")]
    Shape { features: usize, labels: usize },
}
