//! Lexical diversity: root type-token ratio, rare words, repetition

use super::checked_metric;
use crate::config::LexicalConfig;
use crate::lexicon::ReferenceWords;
use crate::{MetricName, MetricVector, Token, WordCount};
use std::collections::HashMap;
use std::sync::Arc;

/// Output of the lexical analyzer
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalAnalysis {
    /// `ttr`, `rare_word_ratio` and `repetition_rate`
    pub metrics: MetricVector,
    pub content_words: usize,
    pub distinct_lemmas: usize,
    pub low_confidence: bool,
    pub most_common: Vec<WordCount>,
}

pub struct LexicalAnalyzer<'c> {
    config: &'c LexicalConfig,
    reference: Arc<ReferenceWords>,
}

impl<'c> LexicalAnalyzer<'c> {
    pub fn new(config: &'c LexicalConfig, reference: Arc<ReferenceWords>) -> Self {
        Self { config, reference }
    }

    pub fn analyze<'t>(&self, tokens: impl IntoIterator<Item = &'t Token>) -> LexicalAnalysis {
        let content: Vec<&Token> = tokens.into_iter().filter(|t| t.pos.is_content()).collect();
        let total = content.len();

        let mut lemma_counts: HashMap<String, usize> = HashMap::new();
        let mut topical_counts: HashMap<String, usize> = HashMap::new();
        let mut rare = 0usize;
        for token in &content {
            let lemma = token.lemma_key();
            if self.is_rare(token, &lemma) {
                rare += 1;
            }
            if !token.pos.is_function_word() {
                *topical_counts.entry(lemma.clone()).or_default() += 1;
            }
            *lemma_counts.entry(lemma).or_default() += 1;
        }
        let distinct = lemma_counts.len();

        let ttr = if total == 0 {
            0.0
        } else {
            distinct as f64 / (2.0 * total as f64).sqrt()
        };
        let rare_ratio = if total == 0 {
            0.0
        } else {
            checked_metric(MetricName::RareWordRatio, rare as f64 / total as f64, 0.0, 1.0)
        };
        let repetition = self.repetition_rate(&topical_counts, total);

        let mut metrics = MetricVector::new();
        metrics.insert(MetricName::Ttr, ttr, self.config.ttr_range.normalize(ttr));
        metrics.insert(MetricName::RareWordRatio, rare_ratio, rare_ratio);
        metrics.insert(
            MetricName::RepetitionRate,
            repetition,
            self.config.repetition_range.normalize(repetition),
        );

        let low_confidence = total < self.config.low_confidence_words;
        tracing::debug!(
            content_words = total,
            distinct,
            rare,
            low_confidence,
            "lexical analysis"
        );

        LexicalAnalysis {
            metrics,
            content_words: total,
            distinct_lemmas: distinct,
            low_confidence,
            most_common: most_common(&topical_counts, self.config.most_common),
        }
    }

    /// Absent from the reference set under both its lemma and its surface form
    fn is_rare(&self, token: &Token, lemma: &str) -> bool {
        !self.reference.contains(lemma) && !self.reference.contains(&token.text.to_lowercase())
    }

    /// Share of content words that repeat an over-used non-function lemma
    fn repetition_rate(&self, counts: &HashMap<String, usize>, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let repeats: usize = counts
            .values()
            .filter(|&&count| count > self.config.repetition_min_count)
            .map(|count| count - 1)
            .sum();
        checked_metric(
            MetricName::RepetitionRate,
            repeats as f64 / total as f64,
            0.0,
            1.0,
        )
    }
}

/// Most frequent lemmas, ties broken alphabetically
fn most_common(counts: &HashMap<String, usize>, limit: usize) -> Vec<WordCount> {
    let mut entries: Vec<WordCount> = counts
        .iter()
        .map(|(word, count)| WordCount {
            word: word.clone(),
            count: *count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{RuleTokenizer, Tokenizer};

    fn tokens(text: &str) -> Vec<Token> {
        RuleTokenizer::new().tokenize(text).into_iter().flatten().collect()
    }

    fn analyze(text: &str) -> LexicalAnalysis {
        let config = LexicalConfig::default();
        LexicalAnalyzer::new(&config, ReferenceWords::bundled()).analyze(&tokens(text))
    }

    #[test]
    fn test_root_ttr() {
        // 8 content words, 7 distinct lemmas ("the" twice)
        let analysis = analyze("The cat sat on the warm red mat.");
        assert_eq!(analysis.content_words, 8);
        assert_eq!(analysis.distinct_lemmas, 7);
        let ttr = analysis.metrics.get(MetricName::Ttr).unwrap();
        assert!((ttr.raw - 7.0 / 4.0).abs() < 1e-12);
        // 1.75 sits below the clamp floor of 2.5
        assert_eq!(ttr.normalized, 0.0);
    }

    #[test]
    fn test_punctuation_and_numbers_excluded() {
        let analysis = analyze("Sales rose 25% in 2020 , sharply !");
        assert_eq!(analysis.content_words, 4);
    }

    #[test]
    fn test_rare_words() {
        let analysis = analyze("Ubiquitous surveillance erodes people's trust.");
        let rare = analysis.metrics.raw(MetricName::RareWordRatio);
        assert!(rare > 0.0 && rare < 1.0, "rare ratio {}", rare);
        let common = analyze("The people have a good life.");
        assert_eq!(common.metrics.raw(MetricName::RareWordRatio), 0.0);
    }

    #[test]
    fn test_repetition_counts_overused_lemmas() {
        let text = "Technology helps. Technology harms. Technology grows. Technology wins. \
                    People adapt.";
        let analysis = analyze(text);
        // technology x4 (3 repeats) out of 10 content words
        let repetition = analysis.metrics.get(MetricName::RepetitionRate).unwrap();
        assert!((repetition.raw - 0.3).abs() < 1e-12);
        assert_eq!(repetition.normalized, 1.0);
    }

    #[test]
    fn test_function_words_do_not_count_as_repetition() {
        let analysis = analyze("The dog and the cat and the bird and the fish.");
        assert_eq!(analysis.metrics.raw(MetricName::RepetitionRate), 0.0);
    }

    #[test]
    fn test_low_confidence_below_twenty_words() {
        assert!(analyze("Short essays say little.").low_confidence);
        let long = "Modern cities offer residents many opportunities for work, study and \
                    leisure, yet they also bring noise, pollution and stress to daily life.";
        assert!(!analyze(long).low_confidence);
    }

    #[test]
    fn test_most_common_excludes_function_words() {
        let analysis =
            analyze("The city grows. The city changes. People love the city and people stay.");
        assert_eq!(analysis.most_common[0].word, "city");
        assert_eq!(analysis.most_common[0].count, 3);
        assert_eq!(analysis.most_common[1].word, "people");
        assert!(analysis.most_common.iter().all(|w| w.word != "the"));
        assert!(analysis.most_common.len() <= 5);
    }

    #[test]
    fn test_empty_tokens() {
        let analysis = analyze("...");
        assert_eq!(analysis.content_words, 0);
        assert_eq!(analysis.metrics.raw(MetricName::Ttr), 0.0);
        assert!(analysis.low_confidence);
    }
}
