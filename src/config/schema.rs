//! Config schema: the scoring constants and their defaults
//!
//! Every constant the analyzers and the band mapper use lives here so a
//! deployment can tune it from `.bandscorerc.json` without touching code.

use crate::{Band, ErrorKind, Task, TaskType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Lowest GRA band any configuration may produce
pub const MIN_GRA_FLOOR: f64 = 2.0;
/// Lowest LR band any configuration may produce
pub const MIN_LR_BAND: f64 = 3.0;
/// Highest LR band allowed for a low-confidence sample
pub const MAX_LOW_CONFIDENCE_LR: f64 = 6.0;

/// Invalid configuration value
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field}: range [{min}, {max}] is empty")]
    EmptyRange { field: String, min: f64, max: f64 },

    #[error("{field}: {value} must lie in [{min}, {max}]")]
    OutOfBounds {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("lexicalResource.table: {0}")]
    InvalidTable(String),

    #[error("{field}: {value} is not a half band between 0 and 9")]
    InvalidBand { field: String, value: f64 },
}

/// Inclusive clamp range used for min-max normalization, written as `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ClampRange {
    pub min: f64,
    pub max: f64,
}

impl ClampRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Clamp into the range, then rescale onto [0, 1]
    pub fn normalize(&self, value: f64) -> f64 {
        let width = self.max - self.min;
        if width <= 0.0 {
            return 0.0;
        }
        (self.clamp(value) - self.min) / width
    }

    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if !(self.min < self.max) {
            return Err(ConfigError::EmptyRange {
                field: field.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl From<[f64; 2]> for ClampRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<ClampRange> for [f64; 2] {
    fn from(range: ClampRange) -> Self {
        [range.min, range.max]
    }
}

/// Grammatical Range & Accuracy constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrammarConfig {
    /// Band before penalties
    pub start: f64,
    pub density_weight: f64,
    pub diversity_weight: f64,
    /// Below this many distinct kinds, diversity adds no penalty
    pub min_distinct_kinds: usize,
    pub floor: f64,
    /// Raw error density clamp (errors per word)
    pub density_range: ClampRange,
    /// Penalty when the average sentence is short
    pub short_sentence_penalty: f64,
    /// Penalty when sentence lengths barely vary
    pub monotony_penalty: f64,
    /// Spans overlapping by more than this share of the shorter one merge
    pub merge_overlap: f64,
    /// Severity weight per canonical kind
    pub severity: BTreeMap<ErrorKind, f64>,
    /// Exact raw category (case-insensitive) to kind, consulted before the keyword table
    pub category_aliases: BTreeMap<String, ErrorKind>,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            start: 9.0,
            density_weight: 4.0,
            diversity_weight: 1.5,
            min_distinct_kinds: 2,
            floor: 2.0,
            density_range: ClampRange::new(0.0, 0.3),
            short_sentence_penalty: 1.0,
            monotony_penalty: 0.5,
            merge_overlap: 0.5,
            severity: BTreeMap::from([
                (ErrorKind::Agreement, 1.0),
                (ErrorKind::Tense, 1.0),
                (ErrorKind::WordOrder, 0.8),
                (ErrorKind::Spelling, 0.6),
                (ErrorKind::Other, 0.5),
                (ErrorKind::Punctuation, 0.4),
            ]),
            category_aliases: BTreeMap::new(),
        }
    }
}

impl GrammarConfig {
    /// Severity for a kind; `other` falls back to 0.5
    pub fn severity_of(&self, kind: ErrorKind) -> f64 {
        self.severity.get(&kind).copied().unwrap_or(0.5)
    }
}

/// One row of the LR lookup table: a raw score at or above `min_raw` earns `band`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandRow {
    pub min_raw: f64,
    pub band: Band,
}

impl BandRow {
    fn new(min_raw: f64, band: f64) -> Self {
        Self {
            min_raw,
            band: Band::floor_from(band),
        }
    }
}

/// Lexical Resource constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LexicalConfig {
    /// Size of the common-word reference set
    pub reference_size: usize,
    /// Frequency-ordered word list replacing the bundled one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_list: Option<PathBuf>,
    /// Root TTR clamp
    pub ttr_range: ClampRange,
    /// A lemma used more than this many times counts as repeated
    pub repetition_min_count: usize,
    pub repetition_range: ClampRange,
    /// Normalized repetition at or above this costs `repetition_penalty`
    pub repetition_threshold: f64,
    pub repetition_penalty: f64,
    /// Fewer content words than this flags low confidence
    pub low_confidence_words: usize,
    pub low_confidence_cap: Band,
    /// How many frequent lemmas to report
    pub most_common: usize,
    pub ttr_weight: f64,
    pub rare_word_weight: f64,
    pub subordination_weight: f64,
    /// Lowest band, given when the raw score clears no row
    pub base_band: Band,
    /// Descending thresholds
    pub table: Vec<BandRow>,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            reference_size: crate::lexicon::DEFAULT_REFERENCE_SIZE,
            reference_list: None,
            ttr_range: ClampRange::new(2.5, 7.5),
            repetition_min_count: 3,
            repetition_range: ClampRange::new(0.0, 0.3),
            repetition_threshold: 0.5,
            repetition_penalty: 0.5,
            low_confidence_words: 20,
            low_confidence_cap: Band::floor_from(6.0),
            most_common: 5,
            ttr_weight: 0.4,
            rare_word_weight: 0.35,
            subordination_weight: 0.25,
            base_band: Band::floor_from(3.0),
            table: vec![
                BandRow::new(0.80, 9.0),
                BandRow::new(0.70, 8.0),
                BandRow::new(0.62, 7.5),
                BandRow::new(0.55, 7.0),
                BandRow::new(0.48, 6.5),
                BandRow::new(0.41, 6.0),
                BandRow::new(0.34, 5.5),
                BandRow::new(0.26, 5.0),
                BandRow::new(0.16, 4.0),
            ],
        }
    }
}

/// Complexity thresholds that depend on the task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComplexity {
    pub avg_length_range: ClampRange,
    /// Average sentence length below this is "short"
    pub short_sentence_words: f64,
    /// Sentence length stdev below this is "monotonous"
    pub monotony_stdev: f64,
}

/// Sentence complexity constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplexityConfig {
    pub task1: TaskComplexity,
    pub task2: TaskComplexity,
    pub stdev_range: ClampRange,
    pub subordination_range: ClampRange,
    /// The monotony check needs at least this many non-relaxed sentences
    pub monotony_min_sentences: usize,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            task1: TaskComplexity {
                avg_length_range: ClampRange::new(6.0, 25.0),
                short_sentence_words: 8.0,
                monotony_stdev: 1.5,
            },
            task2: TaskComplexity {
                avg_length_range: ClampRange::new(8.0, 30.0),
                short_sentence_words: 10.0,
                monotony_stdev: 2.0,
            },
            stdev_range: ClampRange::new(0.0, 10.0),
            subordination_range: ClampRange::new(0.0, 1.5),
            monotony_min_sentences: 5,
        }
    }
}

impl ComplexityConfig {
    pub fn for_task(&self, task: Task) -> &TaskComplexity {
        match task {
            Task::Task1 => &self.task1,
            Task::Task2 => &self.task2,
        }
    }
}

/// Every constant used from normalization to band mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    /// Word count at which `auto` resolves to Task 2
    pub task2_min_words: usize,
    /// Run the three analyzers concurrently
    pub parallel: bool,
    pub grammar: GrammarConfig,
    pub lexical_resource: LexicalConfig,
    pub complexity: ComplexityConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            task2_min_words: crate::parser::DEFAULT_TASK2_MIN_WORDS,
            parallel: true,
            grammar: GrammarConfig::default(),
            lexical_resource: LexicalConfig::default(),
            complexity: ComplexityConfig::default(),
        }
    }
}

impl ScoringConfig {
    /// Reject values the mapper cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.grammar;
        g.density_range.validate("grammar.densityRange")?;
        check_unit("grammar.mergeOverlap", g.merge_overlap)?;
        check_bounds("grammar.floor", g.floor, MIN_GRA_FLOOR, 9.0)?;
        check_bounds("grammar.start", g.start, g.floor, 9.0)?;
        check_non_negative("grammar.densityWeight", g.density_weight)?;
        check_non_negative("grammar.diversityWeight", g.diversity_weight)?;
        check_non_negative("grammar.shortSentencePenalty", g.short_sentence_penalty)?;
        check_non_negative("grammar.monotonyPenalty", g.monotony_penalty)?;
        for (kind, weight) in &g.severity {
            check_unit(&format!("grammar.severity.{}", kind), *weight)?;
        }

        let lr = &self.lexical_resource;
        lr.ttr_range.validate("lexicalResource.ttrRange")?;
        lr.repetition_range.validate("lexicalResource.repetitionRange")?;
        check_unit("lexicalResource.repetitionThreshold", lr.repetition_threshold)?;
        check_unit("lexicalResource.ttrWeight", lr.ttr_weight)?;
        check_unit("lexicalResource.rareWordWeight", lr.rare_word_weight)?;
        check_unit("lexicalResource.subordinationWeight", lr.subordination_weight)?;
        check_non_negative("lexicalResource.repetitionPenalty", lr.repetition_penalty)?;
        check_band(
            "lexicalResource.baseBand",
            lr.base_band,
            MIN_LR_BAND,
            9.0,
        )?;
        check_band(
            "lexicalResource.lowConfidenceCap",
            lr.low_confidence_cap,
            MIN_LR_BAND,
            MAX_LOW_CONFIDENCE_LR,
        )?;
        if lr.reference_size == 0 {
            return Err(ConfigError::OutOfBounds {
                field: "lexicalResource.referenceSize".to_string(),
                value: 0.0,
                min: 1.0,
                max: f64::INFINITY,
            });
        }
        if lr.table.is_empty() {
            return Err(ConfigError::InvalidTable("table has no rows".to_string()));
        }
        for (i, row) in lr.table.iter().enumerate() {
            check_band(
                &format!("lexicalResource.table[{}].band", i),
                row.band,
                MIN_LR_BAND,
                9.0,
            )?;
        }
        for pair in lr.table.windows(2) {
            if !(pair[0].min_raw > pair[1].min_raw) {
                return Err(ConfigError::InvalidTable(format!(
                    "thresholds must strictly descend ({} then {})",
                    pair[0].min_raw, pair[1].min_raw
                )));
            }
            if pair[0].band < pair[1].band {
                return Err(ConfigError::InvalidTable(format!(
                    "bands must not rise as thresholds fall ({} then {})",
                    pair[0].band, pair[1].band
                )));
            }
        }

        let c = &self.complexity;
        c.task1.avg_length_range.validate("complexity.task1.avgLengthRange")?;
        c.task2.avg_length_range.validate("complexity.task2.avgLengthRange")?;
        c.stdev_range.validate("complexity.stdevRange")?;
        c.subordination_range.validate("complexity.subordinationRange")?;
        Ok(())
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    check_bounds(field, value, 0.0, f64::INFINITY)
}

fn check_band(field: &str, band: Band, min: f64, max: f64) -> Result<(), ConfigError> {
    check_bounds(field, band.value(), min, max)
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    check_bounds(field, value, 0.0, 1.0)
}

fn check_bounds(field: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfBounds {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Grammar service settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarServiceConfig {
    /// LanguageTool server root, e.g. `http://localhost:8081`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languagetool_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Root config structure for .bandscorerc.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Minimum band (exit 1 if GRA or LR falls below)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Task type applied to every essay unless the CLI says otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskType>,

    /// Glob patterns for essays to skip in directory mode
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub grammar_service: GrammarServiceConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(
        mut self,
        cli_threshold: Option<f64>,
        cli_task: Option<TaskType>,
        cli_languagetool_url: Option<String>,
        cli_sequential: bool,
    ) -> Self {
        if cli_threshold.is_some() {
            self.threshold = cli_threshold;
        }
        if cli_task.is_some() {
            self.task = cli_task;
        }
        if cli_languagetool_url.is_some() {
            self.grammar_service.languagetool_url = cli_languagetool_url;
        }
        if cli_sequential {
            self.scoring.parallel = false;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threshold) = self.threshold {
            if Band::try_from(threshold).is_err() {
                return Err(ConfigError::InvalidBand {
                    field: "threshold".to_string(),
                    value: threshold,
                });
            }
        }
        self.scoring.validate()
    }

    /// Threshold as a band, once validated
    pub fn threshold_band(&self) -> Option<Band> {
        self.threshold.and_then(|t| Band::try_from(t).ok())
    }
}
