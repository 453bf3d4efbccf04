//! Analyzer module - metric extraction and band mapping

pub mod complexity;
pub mod engine;
pub mod grammar;
pub mod lexical;
pub mod scoring;

pub use complexity::{ComplexityAnalysis, ComplexityAnalyzer, ComplexitySignals};
pub use engine::ScoringEngine;
pub use grammar::{GrammarAggregator, GrammarAnalysis};
pub use lexical::{LexicalAnalysis, LexicalAnalyzer};
pub use scoring::BandMapper;

use crate::{MetricName, ScoringError};

/// Clamp a metric into its documented range. An escape is a bug: debug
/// builds panic, release builds log and clamp (NaN becomes the lower bound).
pub(crate) fn checked_metric(metric: MetricName, value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() || value < min || value > max {
        let err = ScoringError::InternalMetricRange {
            metric,
            value,
            min,
            max,
        };
        if cfg!(debug_assertions) {
            panic!("{}", err);
        }
        tracing::warn!("{}", err);
        if value.is_nan() {
            return min;
        }
        return value.clamp(min, max);
    }
    value
}
