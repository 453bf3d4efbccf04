//! Explainer: turns a band result into the evidence a reader can check

use crate::analyzer::BandMapper;
use crate::{Band, BandResult, ErrorKind, MetricName, Span, Task};
use serde::Serialize;

/// Errors of one kind, with the first occurrence as an example
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindSummary {
    pub kind: ErrorKind,
    pub count: usize,
    pub example: String,
    pub example_span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricLine {
    pub name: MetricName,
    pub label: &'static str,
    pub raw: f64,
    pub normalized: f64,
}

/// Human-readable breakdown of a scored essay
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub gra: Band,
    pub lr: Band,
    pub task: Task,
    pub gra_description: &'static str,
    pub lr_description: &'static str,
    pub errors: Vec<KindSummary>,
    pub metrics: Vec<MetricLine>,
    pub gra_lines: Vec<String>,
    pub lr_lines: Vec<String>,
    pub recommendations: Vec<String>,
}

impl Explanation {
    pub fn total_errors(&self) -> usize {
        self.errors.iter().map(|k| k.count).sum()
    }
}

/// Build the explanation for a result. Pure formatting, no rescoring.
pub fn explain(result: &BandResult) -> Explanation {
    Explanation {
        gra: result.gra,
        lr: result.lr,
        task: result.task,
        gra_description: BandMapper::band_description(result.gra),
        lr_description: BandMapper::band_description(result.lr),
        errors: kind_summaries(result),
        metrics: result
            .metrics
            .iter()
            .map(|(name, value)| MetricLine {
                name,
                label: name.label(),
                raw: value.raw,
                normalized: value.normalized,
            })
            .collect(),
        gra_lines: gra_lines(result),
        lr_lines: lr_lines(result),
        recommendations: BandMapper::recommendations(result),
    }
}

fn kind_summaries(result: &BandResult) -> Vec<KindSummary> {
    ErrorKind::ALL
        .iter()
        .filter_map(|&kind| {
            let mut of_kind = result.errors.iter().filter(|e| e.kind == kind);
            let first = of_kind.next()?;
            Some(KindSummary {
                kind,
                count: 1 + of_kind.count(),
                example: first.excerpt.clone(),
                example_span: first.span,
                message: first.message.clone(),
            })
        })
        .collect()
}

fn gra_lines(result: &BandResult) -> Vec<String> {
    let b = &result.gra_breakdown;
    let metrics = &result.metrics;
    let mut lines = vec![format!("Start at {:.1}", b.start)];
    lines.push(format!(
        "-{:.2} error density ({:.3} errors per word, {} errors)",
        b.density_penalty,
        metrics.raw(MetricName::ErrorDensity),
        result.errors.len()
    ));
    lines.push(format!(
        "-{:.2} error diversity ({} of {} kinds)",
        b.diversity_penalty,
        ErrorKind::ALL
            .iter()
            .filter(|&&kind| result.errors.iter().any(|e| e.kind == kind))
            .count(),
        ErrorKind::ALL.len()
    ));
    if b.range_penalty > 0.0 {
        lines.push(format!(
            "-{:.2} sentence range (average {:.1} words, stdev {:.1})",
            b.range_penalty,
            metrics.raw(MetricName::AvgSentenceLength),
            metrics.raw(MetricName::SentenceLengthStdev)
        ));
    }
    lines.push(format!("= {:.2}, band {}", b.unrounded, b.band));
    lines
}

fn lr_lines(result: &BandResult) -> Vec<String> {
    let b = &result.lr_breakdown;
    let mut lines = vec![
        format!(
            "{:.3} vocabulary range + {:.3} rare words + {:.3} subordination = {:.3}",
            b.ttr_term, b.rare_word_term, b.subordination_term, b.raw_score
        ),
        format!("Table lookup: {:.3} gives {}", b.raw_score, b.bucket_band),
    ];
    if b.repetition_penalty > 0.0 {
        lines.push(format!(
            "-{:.1} repetition ({:.0}% of content words repeat a word)",
            b.repetition_penalty,
            result.metrics.raw(MetricName::RepetitionRate) * 100.0
        ));
    }
    if let Some(cap) = b.low_confidence_cap {
        lines.push(format!("Capped at {}: too few content words", cap));
    }
    lines.push(format!("= {}", b.band));
    lines
}
