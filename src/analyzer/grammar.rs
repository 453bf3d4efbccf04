//! Grammar error aggregation: category mapping, span merging, density and diversity

use super::checked_metric;
use crate::config::GrammarConfig;
use crate::grammar::RawMatch;
use crate::parser::NormalizedEssay;
use crate::{ErrorKind, FlaggedError, MetricName, MetricVector, Span};
use std::collections::BTreeSet;

/// Keyword table for raw categories, first matching row wins.
///
/// Keywords are matched as whole dash-delimited segments of the normalized
/// category, so `agr` matches `grammar-he-verb-agr` but not `agreeable`.
const CATEGORY_TABLE: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::WordOrder, &["word-order", "wordorder", "order"]),
    (
        ErrorKind::Agreement,
        &["agreement", "agr", "subject-verb", "sva", "concord", "number"],
    ),
    (
        ErrorKind::Tense,
        &["tense", "verb-form", "verb-tense", "aspect", "past", "perfect"],
    ),
    (
        ErrorKind::Spelling,
        &["typos", "typo", "spelling", "misspelling", "morfologik", "hunspell", "casing"],
    ),
    (
        ErrorKind::Punctuation,
        &["punctuation", "punct", "comma", "apostrophe", "whitespace", "typography"],
    ),
];

/// Error kinds in the canonical taxonomy
const KIND_COUNT: f64 = ErrorKind::ALL.len() as f64;

/// Output of the aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarAnalysis {
    /// Merged errors in text order
    pub errors: Vec<FlaggedError>,
    /// `error_density` and `error_diversity`
    pub metrics: MetricVector,
    pub distinct_kinds: usize,
}

/// Maps raw checker output onto canonical errors and scores them
pub struct GrammarAggregator<'c> {
    config: &'c GrammarConfig,
}

impl<'c> GrammarAggregator<'c> {
    pub fn new(config: &'c GrammarConfig) -> Self {
        Self { config }
    }

    /// Canonical kind for a raw category string
    pub fn map_category(&self, raw: &str) -> ErrorKind {
        let trimmed = raw.trim();
        if let Some(kind) = self
            .config
            .category_aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
            .map(|(_, kind)| *kind)
        {
            return kind;
        }

        let normalized = normalize_category(trimmed);
        let haystack = format!("-{}-", normalized);
        CATEGORY_TABLE
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|kw| haystack.contains(&format!("-{}-", kw)))
            })
            .map(|(kind, _)| *kind)
            .unwrap_or(ErrorKind::Other)
    }

    /// Turn raw matches into flagged errors over the essay text (unmerged)
    pub fn flag(&self, matches: Vec<RawMatch>, essay: &NormalizedEssay) -> Vec<FlaggedError> {
        let chars: Vec<char> = essay.text.chars().collect();
        matches
            .into_iter()
            .map(|m| {
                let mut span = Span::new(m.start, m.end);
                if span.end > chars.len() {
                    tracing::warn!(
                        category = %m.category,
                        %span,
                        text_len = chars.len(),
                        "grammar match extends past the text, truncating"
                    );
                    span = Span::new(span.start.min(chars.len()), chars.len());
                }
                let kind = self.map_category(&m.category);
                FlaggedError {
                    span,
                    kind,
                    severity: self.config.severity_of(kind).clamp(0.0, 1.0),
                    excerpt: chars[span.start..span.end].iter().collect(),
                    category: m.category,
                    message: m.message,
                    replacements: m.replacements,
                }
            })
            .collect()
    }

    /// Merge overlapping spans. Walks errors in start order and compares each
    /// with the last kept one; the higher severity survives, ties keep the earlier.
    pub fn merge(&self, mut errors: Vec<FlaggedError>) -> Vec<FlaggedError> {
        errors.sort_by_key(|e| e.span.start);
        let mut kept: Vec<FlaggedError> = Vec::with_capacity(errors.len());
        for error in errors {
            match kept.last_mut() {
                Some(last) if self.should_merge(&last.span, &error.span) => {
                    if error.severity > last.severity {
                        *last = error;
                    }
                }
                _ => kept.push(error),
            }
        }
        kept
    }

    fn should_merge(&self, a: &Span, b: &Span) -> bool {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => a.start == b.start,
            (true, false) => b.contains(a.start),
            (false, true) => a.contains(b.start),
            (false, false) => {
                let shorter = a.len().min(b.len()) as f64;
                a.overlap(b) as f64 / shorter > self.config.merge_overlap
            }
        }
    }

    /// Map, merge and measure
    pub fn analyze(
        &self,
        matches: Vec<RawMatch>,
        essay: &NormalizedEssay,
    ) -> GrammarAnalysis {
        let raw_count = matches.len();
        let errors = self.merge(self.flag(matches, essay));
        let analysis = self.measure(errors, essay.token_count());
        tracing::debug!(
            raw = raw_count,
            merged = analysis.errors.len(),
            kinds = analysis.distinct_kinds,
            sentences = essay.sentence_count(),
            "aggregated grammar errors"
        );
        analysis
    }

    /// Density and diversity over already merged errors
    pub fn measure(&self, errors: Vec<FlaggedError>, token_count: usize) -> GrammarAnalysis {
        let density = if token_count == 0 {
            0.0
        } else {
            errors.len() as f64 / token_count as f64
        };
        let kinds: BTreeSet<ErrorKind> = errors.iter().map(|e| e.kind).collect();
        let diversity = checked_metric(
            MetricName::ErrorDiversity,
            kinds.len() as f64 / KIND_COUNT,
            0.0,
            1.0,
        );

        let mut metrics = MetricVector::new();
        metrics.insert(
            MetricName::ErrorDensity,
            density,
            self.config.density_range.normalize(density),
        );
        metrics.insert(MetricName::ErrorDiversity, diversity, diversity);

        GrammarAnalysis {
            errors,
            metrics,
            distinct_kinds: kinds.len(),
        }
    }
}

/// Lowercase and turn `_ / : .` and spaces into single dashes
fn normalize_category(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = match c {
            '_' | '/' | ':' | '.' | ' ' | '-' => '-',
            other => other.to_ascii_lowercase(),
        };
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    out.trim_end_matches('-').to_string()
}
