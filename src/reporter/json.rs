//! JSON reporter for machine-readable output

use super::{BatchSummary, EssayReport};
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Report a single scored essay as JSON
    pub fn report(&self, report: &EssayReport) -> String {
        self.render(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Report multiple essays as a JSON array
    pub fn report_many(&self, reports: &[EssayReport]) -> String {
        self.render(reports).unwrap_or_else(|_| "[]".to_string())
    }

    /// Report with summary
    pub fn report_with_summary(&self, reports: &[EssayReport], summary: &BatchSummary) -> String {
        let output = JsonOutput {
            results: reports,
            summary,
        };
        self.render(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    results: &'a [EssayReport],
    summary: &'a BatchSummary,
}
