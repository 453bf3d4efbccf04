//! Bandscore: explainable IELTS Writing band estimation
//!
//! This library estimates the Grammatical Range & Accuracy (GRA) and Lexical
//! Resource (LR) sub-scores of an essay from grammar-checker output and token
//! statistics. Every band comes from an inspectable rule table, so each score
//! can be traced back to the metrics and flagged errors behind it.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod grammar;
pub mod lexicon;
pub mod parser;
pub mod reporter;

pub use error::{ScoringError, ScoringResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Task type declared by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Task1,
    Task2,
    /// Resolve from word count at normalization time
    #[default]
    Auto,
}

impl TaskType {
    /// Resolve `Auto` using the word count; explicit task types pass through.
    pub fn resolve(self, word_count: usize, task2_min_words: usize) -> Task {
        match self {
            TaskType::Task1 => Task::Task1,
            TaskType::Task2 => Task::Task2,
            TaskType::Auto if word_count >= task2_min_words => Task::Task2,
            TaskType::Auto => Task::Task1,
        }
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task1" | "1" => Ok(TaskType::Task1),
            "task2" | "2" => Ok(TaskType::Task2),
            "auto" => Ok(TaskType::Auto),
            other => Err(format!(
                "unknown task type '{}' (expected task1, task2 or auto)",
                other
            )),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Task1 => write!(f, "task1"),
            TaskType::Task2 => write!(f, "task2"),
            TaskType::Auto => write!(f, "auto"),
        }
    }
}

/// Resolved task type. Never `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Task1,
    Task2,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Task1 => write!(f, "Task 1"),
            Task::Task2 => write!(f, "Task 2"),
        }
    }
}

/// Validated essay submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EssayInput {
    text: String,
    task: TaskType,
}

impl EssayInput {
    /// Build an input, rejecting text that is empty after trimming
    pub fn new(text: impl Into<String>, task: TaskType) -> ScoringResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ScoringError::EmptyInput);
        }
        Ok(Self { text, task })
    }

    /// Decode raw bytes as UTF-8 (a leading byte-order mark is skipped)
    pub fn from_bytes(bytes: &[u8], task: TaskType) -> ScoringResult<Self> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let text = std::str::from_utf8(bytes).map_err(|e| ScoringError::UnsupportedEncoding {
            offset: e.valid_up_to(),
        })?;
        Self::new(text, task)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn task(&self) -> TaskType {
        self.task
    }
}

/// Half-open character span `[start, end)` over the normalized essay text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of characters shared with `other`
    pub fn overlap(&self, other: &Span) -> usize {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        end.saturating_sub(start)
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Part-of-speech tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PosTag {
    Noun,
    ProperNoun,
    Verb,
    Auxiliary,
    Adjective,
    Adverb,
    Pronoun,
    /// Relative and interrogative words (which, who, whose, ...)
    WhWord,
    Determiner,
    Preposition,
    CoordConj,
    SubordConj,
    Particle,
    Numeral,
    Interjection,
    Punctuation,
    Symbol,
}

impl PosTag {
    pub fn is_punctuation(self) -> bool {
        matches!(self, PosTag::Punctuation | PosTag::Symbol)
    }

    /// Any token that counts as a word (content or function)
    pub fn is_word(self) -> bool {
        !self.is_punctuation()
    }

    /// Words that take part in lexical statistics
    pub fn is_content(self) -> bool {
        self.is_word() && self != PosTag::Numeral
    }

    /// Subordinating conjunctions and relative pronouns
    pub fn is_subordinator(self) -> bool {
        matches!(self, PosTag::SubordConj | PosTag::WhWord)
    }

    pub fn is_function_word(self) -> bool {
        matches!(
            self,
            PosTag::Auxiliary
                | PosTag::Pronoun
                | PosTag::WhWord
                | PosTag::Determiner
                | PosTag::Preposition
                | PosTag::CoordConj
                | PosTag::SubordConj
                | PosTag::Particle
        )
    }
}

/// A single token produced by the tokenizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface form as it appears in the text
    pub text: String,
    /// Dictionary form, when the tagger could derive one
    pub lemma: Option<String>,
    pub pos: PosTag,
    /// Character offset of the first character
    pub offset: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, lemma: Option<String>, pos: PosTag, offset: usize) -> Self {
        Self {
            text: text.into(),
            lemma,
            pos,
            offset,
        }
    }

    /// Character offset one past the last character
    pub fn end(&self) -> usize {
        self.offset + self.text.chars().count()
    }

    /// Lowercased lemma, falling back to the lowercased surface form
    pub fn lemma_key(&self) -> String {
        match &self.lemma {
            Some(lemma) => lemma.to_lowercase(),
            None => self.text.to_lowercase(),
        }
    }
}

/// A sentence with its tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
    pub span: Span,
    /// Question or imperative; relaxes the monotony check
    pub relaxed: bool,
}

impl Sentence {
    /// Number of non-punctuation tokens
    pub fn word_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.pos.is_word()).count()
    }
}

/// Canonical grammar error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Agreement,
    Tense,
    Punctuation,
    Spelling,
    WordOrder,
    Other,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::Agreement,
        ErrorKind::Tense,
        ErrorKind::Punctuation,
        ErrorKind::Spelling,
        ErrorKind::WordOrder,
        ErrorKind::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Agreement => "Agreement",
            ErrorKind::Tense => "Tense",
            ErrorKind::Punctuation => "Punctuation",
            ErrorKind::Spelling => "Spelling",
            ErrorKind::WordOrder => "Word order",
            ErrorKind::Other => "Other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Agreement => write!(f, "agreement"),
            ErrorKind::Tense => write!(f, "tense"),
            ErrorKind::Punctuation => write!(f, "punctuation"),
            ErrorKind::Spelling => write!(f, "spelling"),
            ErrorKind::WordOrder => write!(f, "word-order"),
            ErrorKind::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "agreement" => Ok(ErrorKind::Agreement),
            "tense" => Ok(ErrorKind::Tense),
            "punctuation" => Ok(ErrorKind::Punctuation),
            "spelling" => Ok(ErrorKind::Spelling),
            "word-order" => Ok(ErrorKind::WordOrder),
            "other" => Ok(ErrorKind::Other),
            other => Err(format!("unknown error kind '{}'", other)),
        }
    }
}

/// A grammar error flagged by the external checker, mapped to a canonical kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedError {
    pub span: Span,
    /// Category string exactly as the checker reported it
    pub category: String,
    pub kind: ErrorKind,
    /// Severity weight in [0, 1]
    pub severity: f64,
    /// Flagged text
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<String>,
}

/// Metric names in the metric vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    ErrorDensity,
    ErrorDiversity,
    Ttr,
    RareWordRatio,
    AvgSentenceLength,
    SentenceLengthStdev,
    SubordinationRate,
    RepetitionRate,
}

impl MetricName {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::ErrorDensity => "error_density",
            MetricName::ErrorDiversity => "error_diversity",
            MetricName::Ttr => "ttr",
            MetricName::RareWordRatio => "rare_word_ratio",
            MetricName::AvgSentenceLength => "avg_sentence_length",
            MetricName::SentenceLengthStdev => "sentence_length_stdev",
            MetricName::SubordinationRate => "subordination_rate",
            MetricName::RepetitionRate => "repetition_rate",
        }
    }

    /// Display label for reports
    pub fn label(self) -> &'static str {
        match self {
            MetricName::ErrorDensity => "Error density",
            MetricName::ErrorDiversity => "Error diversity",
            MetricName::Ttr => "Root type-token ratio",
            MetricName::RareWordRatio => "Rare word ratio",
            MetricName::AvgSentenceLength => "Average sentence length",
            MetricName::SentenceLengthStdev => "Sentence length stdev",
            MetricName::SubordinationRate => "Subordination rate",
            MetricName::RepetitionRate => "Repetition rate",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw measurement and its normalized [0, 1] counterpart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub raw: f64,
    pub normalized: f64,
}

/// Ordered mapping from metric name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricVector(BTreeMap<MetricName, MetricValue>);

impl MetricVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a metric; the normalized value is clamped to [0, 1]
    pub fn insert(&mut self, name: MetricName, raw: f64, normalized: f64) {
        let normalized = if normalized.is_nan() {
            0.0
        } else {
            normalized.clamp(0.0, 1.0)
        };
        self.0.insert(name, MetricValue { raw, normalized });
    }

    /// Merge another fragment into this vector
    pub fn extend(&mut self, other: MetricVector) {
        self.0.extend(other.0);
    }

    pub fn get(&self, name: MetricName) -> Option<MetricValue> {
        self.0.get(&name).copied()
    }

    /// Normalized value, 0.0 when the metric is absent
    pub fn normalized(&self, name: MetricName) -> f64 {
        self.get(name).map(|v| v.normalized).unwrap_or(0.0)
    }

    /// Raw value, 0.0 when the metric is absent
    pub fn raw(&self, name: MetricName) -> f64 {
        self.get(name).map(|v| v.raw).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, MetricValue)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// IELTS band in half-band steps, stored as a count of halves (13 = 6.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Band(u8);

impl Band {
    pub const MIN: Band = Band(0);
    pub const MAX: Band = Band(18);

    /// Round down to the nearest half band, clamped to [0, 9]
    pub fn floor_from(value: f64) -> Self {
        if value.is_nan() {
            return Band::MIN;
        }
        let halves = (value.clamp(0.0, 9.0) * 2.0 + 1e-9).floor();
        Band(halves as u8)
    }

    pub fn value(self) -> f64 {
        self.0 as f64 / 2.0
    }

    pub fn halves(self) -> u8 {
        self.0
    }
}

impl From<Band> for f64 {
    fn from(band: Band) -> f64 {
        band.value()
    }
}

impl TryFrom<f64> for Band {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let halves = value * 2.0;
        if !(0.0..=18.0).contains(&halves) || halves.fract() != 0.0 {
            return Err(format!("{} is not a half band between 0 and 9", value));
        }
        Ok(Band(halves as u8))
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

/// Every term that went into the GRA band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraBreakdown {
    pub start: f64,
    pub density_penalty: f64,
    pub diversity_penalty: f64,
    pub range_penalty: f64,
    pub total_penalty: f64,
    /// Score before flooring and half-band rounding
    pub unrounded: f64,
    pub band: Band,
}

/// Every term that went into the LR band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LrBreakdown {
    pub ttr_term: f64,
    pub rare_word_term: f64,
    pub subordination_term: f64,
    /// Weighted sum looked up in the bucket table
    pub raw_score: f64,
    pub bucket_band: Band,
    pub repetition_penalty: f64,
    /// Cap applied because the sample was too small
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_confidence_cap: Option<Band>,
    pub band: Band,
}

/// A content lemma and how often it occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// The scored essay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandResult {
    pub gra: Band,
    pub lr: Band,
    pub task: Task,
    pub metrics: MetricVector,
    /// Merged, canonical errors backing the GRA band
    pub errors: Vec<FlaggedError>,
    /// Fewer content words than needed for a high LR claim
    pub low_confidence: bool,
    pub word_count: usize,
    /// Words counted for lexical statistics (numerals excluded)
    pub content_words: usize,
    /// Distinct lemmas among the content words
    pub unique_words: usize,
    pub sentence_count: usize,
    pub most_common: Vec<WordCount>,
    pub gra_breakdown: GraBreakdown,
    pub lr_breakdown: LrBreakdown,
}

/// Public API: score an essay against a grammar service with default configuration.
///
/// * `essay_text` - raw essay text
/// * `task_type` - declared task, or `TaskType::Auto`
/// * `checker` - grammar service, invoked exactly once
pub fn score<G: grammar::GrammarChecker>(
    essay_text: &str,
    task_type: TaskType,
    checker: G,
) -> ScoringResult<BandResult> {
    analyzer::ScoringEngine::new(checker).score(essay_text, task_type)
}
