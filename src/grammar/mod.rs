//! Grammar service contract and the bundled grammar sources
//!
//! The scoring engine treats the grammar checker as a black box: it sends the
//! normalized essay text once and receives flagged spans with raw category
//! strings. Mapping those categories onto the canonical error kinds happens in
//! the aggregator, not here.

pub mod languagetool;
pub mod matches_file;

pub use languagetool::{
    is_languagetool_available, LanguageToolClient, DEFAULT_LANGUAGE, DEFAULT_TIMEOUT_SECS,
};
pub use matches_file::MatchesFile;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One flagged span as reported by a grammar service.
///
/// Offsets are character offsets into the text passed to `check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMatch {
    pub start: usize,
    pub end: usize,
    /// Category string exactly as the service reports it
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replacements: Vec<String>,
}

impl RawMatch {
    pub fn new(start: usize, end: usize, category: impl Into<String>) -> Self {
        Self {
            start,
            end,
            category: category.into(),
            message: None,
            replacements: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Failure talking to a grammar service
#[derive(Debug, Error)]
pub enum GrammarServiceError {
    #[error("cannot reach {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("{endpoint} did not answer within {seconds}s")]
    TimedOut { endpoint: String, seconds: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("grammar service not configured: {0}")]
    NotConfigured(String),
}

/// Capability: check a text and return the flagged spans in text order
pub trait GrammarChecker {
    fn check(&self, text: &str) -> Result<Vec<RawMatch>, GrammarServiceError>;

    /// Short name for logs and reports
    fn name(&self) -> &str {
        "grammar-checker"
    }
}

impl<G: GrammarChecker + ?Sized> GrammarChecker for &G {
    fn check(&self, text: &str) -> Result<Vec<RawMatch>, GrammarServiceError> {
        (**self).check(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<G: GrammarChecker + ?Sized> GrammarChecker for Box<G> {
    fn check(&self, text: &str) -> Result<Vec<RawMatch>, GrammarServiceError> {
        (**self).check(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// An absent checker fails every check; scoring never proceeds without grammar data
impl<G: GrammarChecker> GrammarChecker for Option<G> {
    fn check(&self, text: &str) -> Result<Vec<RawMatch>, GrammarServiceError> {
        match self {
            Some(checker) => checker.check(text),
            None => Err(GrammarServiceError::NotConfigured(
                "no grammar source configured".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        match self {
            Some(checker) => checker.name(),
            None => "none",
        }
    }
}

/// Convert a UTF-16 code unit offset (as Java-based services report) into a char offset
pub(crate) fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        if units >= utf16_offset {
            return index;
        }
        units += c.len_utf16();
    }
    text.chars().count()
}
