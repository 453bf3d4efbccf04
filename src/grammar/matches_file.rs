//! Offline grammar source: matches recorded in a JSON file
//!
//! Two layouts are accepted:
//! - a plain array of `{ "start", "end", "category", "message"?, "replacements"? }`
//!   objects with character offsets;
//! - a saved LanguageTool `/v2/check` response (`{ "matches": [...] }`), whose
//!   UTF-16 offsets are converted against the checked text.

use super::languagetool::CheckResponse;
use super::{GrammarChecker, GrammarServiceError, RawMatch};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Source {
    Path(PathBuf),
    Json(String),
    Matches(Vec<RawMatch>),
}

/// Grammar checker that replays recorded matches
#[derive(Debug, Clone)]
pub struct MatchesFile {
    source: Source,
}

impl MatchesFile {
    /// Read matches from a file each time the essay is checked
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Path(path.into()),
        }
    }

    pub fn from_json(json: impl Into<String>) -> Self {
        Self {
            source: Source::Json(json.into()),
        }
    }

    pub fn from_matches(matches: Vec<RawMatch>) -> Self {
        Self {
            source: Source::Matches(matches),
        }
    }

    /// A source that reports a clean essay
    pub fn empty() -> Self {
        Self::from_matches(Vec::new())
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::Path(path) => Some(path),
            _ => None,
        }
    }

    fn load(&self, text: &str) -> Result<Vec<RawMatch>, GrammarServiceError> {
        match &self.source {
            Source::Matches(matches) => Ok(matches.clone()),
            Source::Json(json) => parse_matches(json, text),
            Source::Path(path) => {
                let json =
                    fs::read_to_string(path).map_err(|e| GrammarServiceError::Unreachable {
                        endpoint: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                parse_matches(&json, text).map_err(|e| match e {
                    GrammarServiceError::InvalidResponse(reason) => {
                        GrammarServiceError::InvalidResponse(format!(
                            "{}: {}",
                            path.display(),
                            reason
                        ))
                    }
                    other => other,
                })
            }
        }
    }
}

impl GrammarChecker for MatchesFile {
    fn check(&self, text: &str) -> Result<Vec<RawMatch>, GrammarServiceError> {
        let mut matches = self.load(text)?;
        let text_len = text.chars().count();
        if let Some(bad) = matches.iter().find(|m| m.start.max(m.end) > text_len) {
            return Err(GrammarServiceError::InvalidResponse(format!(
                "match [{}, {}) lies beyond the end of the text ({} chars)",
                bad.start, bad.end, text_len
            )));
        }
        matches.sort_by_key(|m| m.start);
        Ok(matches)
    }

    fn name(&self) -> &str {
        "matches-file"
    }
}

fn parse_matches(json: &str, text: &str) -> Result<Vec<RawMatch>, GrammarServiceError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| GrammarServiceError::InvalidResponse(e.to_string()))?;
    if value.is_array() {
        serde_json::from_value(value)
            .map_err(|e| GrammarServiceError::InvalidResponse(e.to_string()))
    } else if value.get("matches").is_some() {
        let response: CheckResponse = serde_json::from_value(value)
            .map_err(|e| GrammarServiceError::InvalidResponse(e.to_string()))?;
        Ok(response.into_raw_matches(text))
    } else {
        Err(GrammarServiceError::InvalidResponse(
            "expected an array of matches or an object with a \"matches\" field".to_string(),
        ))
    }
}
