//! Reporter module for output formatting

pub mod console;
pub mod explainer;
pub mod json;

pub use console::ConsoleReporter;
pub use explainer::{explain, Explanation, KindSummary, MetricLine};
pub use json::JsonReporter;

use crate::{Band, BandResult};
use serde::Serialize;
use std::path::PathBuf;

/// One scored essay as the reporters see it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayReport {
    pub file_path: PathBuf,
    #[serde(flatten)]
    pub result: BandResult,
    pub explanation: Explanation,
}

impl EssayReport {
    pub fn new(file_path: impl Into<PathBuf>, result: BandResult) -> Self {
        let explanation = explain(&result);
        Self {
            file_path: file_path.into(),
            result,
            explanation,
        }
    }

    /// Lower of the two bands
    pub fn lowest_band(&self) -> Band {
        self.result.gra.min(self.result.lr)
    }
}

/// Totals across a batch of essays
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub files_scored: usize,
    pub files_failed: usize,
    pub average_gra: f64,
    pub average_lr: f64,
    pub total_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub below_threshold: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[EssayReport], failed: usize, threshold: Option<Band>) -> Self {
        let n = reports.len();
        let average = |f: fn(&EssayReport) -> Band| {
            if n == 0 {
                0.0
            } else {
                let sum: f64 = reports.iter().map(|r| f(r).value()).sum();
                (sum / n as f64 * 100.0).round() / 100.0
            }
        };
        Self {
            files_scored: n,
            files_failed: failed,
            average_gra: average(|r| r.result.gra),
            average_lr: average(|r| r.result.lr),
            total_errors: reports.iter().map(|r| r.result.errors.len()).sum(),
            threshold: threshold.map(Band::value),
            below_threshold: threshold
                .map(|t| reports.iter().filter(|r| r.lowest_band() < t).count())
                .unwrap_or(0),
        }
    }
}
