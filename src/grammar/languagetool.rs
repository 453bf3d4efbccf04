//! LanguageTool HTTP client
//!
//! Requires the `languagetool` feature for network access:
//! ```toml
//! bandscore = { version = "0.3", features = ["languagetool"] }
//! ```
//! The response format is parsed regardless of the feature so saved
//! LanguageTool output can be replayed through [`MatchesFile`](super::MatchesFile).

use super::{utf16_to_char_offset, GrammarChecker, GrammarServiceError, RawMatch};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Blocking client for a LanguageTool server's `/v2/check` endpoint
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "languagetool"), allow(dead_code))]
pub struct LanguageToolClient {
    base_url: String,
    language: String,
    timeout: Duration,
}

impl LanguageToolClient {
    /// Client for a server root such as `http://localhost:8081`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v2/check", self.base_url)
    }

    #[cfg(feature = "languagetool")]
    fn request(&self, text: &str) -> Result<String, GrammarServiceError> {
        let endpoint = self.endpoint();
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GrammarServiceError::NotConfigured(e.to_string()))?;

        let response = client
            .post(&endpoint)
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    GrammarServiceError::TimedOut {
                        endpoint: endpoint.clone(),
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    GrammarServiceError::Unreachable {
                        endpoint: endpoint.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GrammarServiceError::Unreachable {
                endpoint,
                reason: format!("{}: {}", status, body.trim()),
            });
        }

        response
            .text()
            .map_err(|e| GrammarServiceError::InvalidResponse(e.to_string()))
    }

    /// Stub when the languagetool feature is disabled
    #[cfg(not(feature = "languagetool"))]
    fn request(&self, _text: &str) -> Result<String, GrammarServiceError> {
        Err(GrammarServiceError::NotConfigured(
            "LanguageTool support not enabled. Rebuild with: cargo build --features languagetool"
                .to_string(),
        ))
    }
}

impl GrammarChecker for LanguageToolClient {
    fn check(&self, text: &str) -> Result<Vec<RawMatch>, GrammarServiceError> {
        let body = self.request(text)?;
        let response: CheckResponse = serde_json::from_str(&body)
            .map_err(|e| GrammarServiceError::InvalidResponse(e.to_string()))?;
        tracing::debug!(
            endpoint = %self.endpoint(),
            matches = response.matches.len(),
            "languagetool responded"
        );
        Ok(response.into_raw_matches(text))
    }

    fn name(&self) -> &str {
        "languagetool"
    }
}

/// Body of a `/v2/check` response (only the fields scoring needs)
#[derive(Debug, Deserialize)]
pub(crate) struct CheckResponse {
    #[serde(default)]
    pub matches: Vec<LtMatch>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LtMatch {
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub replacements: Vec<LtReplacement>,
    pub rule: LtRule,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LtReplacement {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LtRule {
    pub id: String,
    #[serde(default, rename = "issueType")]
    pub issue_type: Option<String>,
    pub category: LtCategory,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LtCategory {
    pub id: String,
}

/// Suggestions kept per match
const MAX_REPLACEMENTS: usize = 3;

impl CheckResponse {
    /// Convert to raw matches with char offsets, category as `CATEGORY/RULE_ID`
    pub(crate) fn into_raw_matches(self, text: &str) -> Vec<RawMatch> {
        self.matches
            .into_iter()
            .map(|m| {
                let start = utf16_to_char_offset(text, m.offset);
                let end = utf16_to_char_offset(text, m.offset + m.length);
                let mut category = format!("{}/{}", m.rule.category.id, m.rule.id);
                if let Some(issue) = m.rule.issue_type.filter(|t| !t.is_empty()) {
                    category.push('/');
                    category.push_str(&issue);
                }
                RawMatch {
                    start,
                    end,
                    category,
                    message: m.message,
                    replacements: m
                        .replacements
                        .into_iter()
                        .take(MAX_REPLACEMENTS)
                        .map(|r| r.value)
                        .collect(),
                }
            })
            .collect()
    }
}

/// Whether the crate was built with network access to LanguageTool
pub fn is_languagetool_available() -> bool {
    cfg!(feature = "languagetool")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "software": {"name": "LanguageTool"},
        "matches": [
            {
                "message": "The verb does not agree with the subject.",
                "offset": 8,
                "length": 3,
                "replacements": [{"value": "sits"}, {"value": "sat"}],
                "rule": {
                    "id": "HE_VERB_AGR",
                    "issueType": "grammar",
                    "category": {"id": "GRAMMAR", "name": "Grammar"}
                }
            },
            {
                "message": "Possible spelling mistake found.",
                "offset": 20,
                "length": 4,
                "replacements": [],
                "rule": {
                    "id": "MORFOLOGIK_RULE_EN_US",
                    "issueType": "misspelling",
                    "category": {"id": "TYPOS"}
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_check_response() {
        let response: CheckResponse = serde_json::from_str(SAMPLE).unwrap();
        let matches = response.into_raw_matches("The cat sit on mat. Thsi is it.");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].start, 8);
        assert_eq!(matches[0].end, 11);
        assert_eq!(matches[0].category, "GRAMMAR/HE_VERB_AGR/grammar");
        assert_eq!(matches[0].replacements, vec!["sits", "sat"]);
        assert_eq!(
            matches[1].category,
            "TYPOS/MORFOLOGIK_RULE_EN_US/misspelling"
        );
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let client = LanguageToolClient::new("http://localhost:8081/");
        assert_eq!(client.endpoint(), "http://localhost:8081/v2/check");
    }

    #[cfg(not(feature = "languagetool"))]
    #[test]
    fn test_disabled_feature_reports_not_configured() {
        let client = LanguageToolClient::new("http://localhost:8081");
        let err = client.check("Some text.").unwrap_err();
        assert!(matches!(err, GrammarServiceError::NotConfigured(_)));
    }

    #[cfg(feature = "languagetool")]
    #[test]
    fn test_unreachable_server() {
        let client = LanguageToolClient::new("http://127.0.0.1:9")
            .timeout(Duration::from_secs(2));
        let err = client.check("Some text.").unwrap_err();
        assert!(matches!(
            err,
            GrammarServiceError::Unreachable { .. } | GrammarServiceError::TimedOut { .. }
        ));
    }
}
