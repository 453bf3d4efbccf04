//! Error taxonomy for the scoring engine

use crate::grammar::GrammarServiceError;
use crate::MetricName;
use thiserror::Error;

/// Errors surfaced by `score`
#[derive(Debug, Error)]
pub enum ScoringError {
    /// No usable text after trimming
    #[error("essay text is empty")]
    EmptyInput,

    /// Input bytes are not valid UTF-8
    #[error("essay is not valid UTF-8 text (invalid byte sequence at offset {offset})")]
    UnsupportedEncoding { offset: usize },

    /// The grammar checker could not be reached or timed out; no bands are produced
    #[error("grammar service unavailable: {0}")]
    GrammarServiceUnavailable(#[from] GrammarServiceError),

    /// A metric escaped its documented range. Panics in debug builds, logged and clamped in release; never returned by `score`.
    #[error("metric {metric} out of range: {value} not in [{min}, {max}]")]
    InternalMetricRange {
        metric: MetricName,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type ScoringResult<T> = Result<T, ScoringError>;
