//! Sentence complexity: length, length variation, subordination

use crate::config::ComplexityConfig;
use crate::{MetricName, MetricVector, Sentence, Task};

/// Range signals the band mapper penalizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplexitySignals {
    /// Average sentence length below the task threshold
    pub short_sentences: bool,
    /// Statement lengths barely vary
    pub monotonous: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexityAnalysis {
    /// `avg_sentence_length`, `sentence_length_stdev` and `subordination_rate`
    pub metrics: MetricVector,
    pub signals: ComplexitySignals,
}

pub struct ComplexityAnalyzer<'c> {
    config: &'c ComplexityConfig,
}

impl<'c> ComplexityAnalyzer<'c> {
    pub fn new(config: &'c ComplexityConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, sentences: &[Sentence], task: Task) -> ComplexityAnalysis {
        let thresholds = self.config.for_task(task);
        let counted: Vec<&Sentence> = sentences.iter().filter(|s| s.word_count() > 0).collect();
        let lengths: Vec<f64> = counted.iter().map(|s| s.word_count() as f64).collect();

        let (avg, stdev) = mean_and_stdev(&lengths);
        let subordinators: usize = counted
            .iter()
            .flat_map(|s| s.tokens.iter())
            .filter(|t| t.pos.is_subordinator())
            .count();
        let subordination = if counted.is_empty() {
            0.0
        } else {
            subordinators as f64 / counted.len() as f64
        };

        let mut metrics = MetricVector::new();
        metrics.insert(
            MetricName::AvgSentenceLength,
            avg,
            thresholds.avg_length_range.normalize(avg),
        );
        metrics.insert(
            MetricName::SentenceLengthStdev,
            stdev,
            self.config.stdev_range.normalize(stdev),
        );
        metrics.insert(
            MetricName::SubordinationRate,
            subordination,
            self.config.subordination_range.normalize(subordination),
        );

        // questions and imperatives are naturally short; leave them out of the variation check
        let statements: Vec<f64> = counted
            .iter()
            .filter(|s| !s.relaxed)
            .map(|s| s.word_count() as f64)
            .collect();
        let monotonous = statements.len() >= self.config.monotony_min_sentences
            && mean_and_stdev(&statements).1 < thresholds.monotony_stdev;
        let signals = ComplexitySignals {
            short_sentences: !counted.is_empty() && avg < thresholds.short_sentence_words,
            monotonous,
        };

        tracing::debug!(
            sentences = counted.len(),
            avg_length = avg,
            stdev,
            subordination,
            short = signals.short_sentences,
            monotonous,
            "complexity analysis"
        );

        ComplexityAnalysis { metrics, signals }
    }
}

/// Mean and population standard deviation; zeros for an empty sample
fn mean_and_stdev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{NormalizedEssay, Normalizer, RuleTokenizer};
    use crate::{EssayInput, TaskType};

    fn essay(text: &str, task: TaskType) -> NormalizedEssay {
        let input = EssayInput::new(text, task).unwrap();
        Normalizer::new(RuleTokenizer::new())
            .normalize(&input)
            .unwrap()
    }

    fn analyze(text: &str, task: TaskType) -> ComplexityAnalysis {
        let config = ComplexityConfig::default();
        let essay = essay(text, task);
        ComplexityAnalyzer::new(&config).analyze(&essay.sentences, essay.task)
    }

    #[test]
    fn test_mean_and_stdev() {
        assert_eq!(mean_and_stdev(&[]), (0.0, 0.0));
        let (mean, stdev) = mean_and_stdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mean, 5.0);
        assert_eq!(stdev, 2.0);
    }

    #[test]
    fn test_short_sentences_signal() {
        let analysis = analyze("The cat sit on mat. He is happy.", TaskType::Task2);
        assert_eq!(analysis.metrics.raw(MetricName::AvgSentenceLength), 4.0);
        assert_eq!(analysis.metrics.raw(MetricName::SentenceLengthStdev), 1.0);
        // 4 words is below the task 2 clamp floor of 8
        assert_eq!(analysis.metrics.normalized(MetricName::AvgSentenceLength), 0.0);
        assert!(analysis.signals.short_sentences);
        assert!(!analysis.signals.monotonous);
    }

    #[test]
    fn test_task_changes_normalization() {
        let text = "Sales of laptops rose steadily across the whole decade.";
        let task1 = analyze(text, TaskType::Task1);
        let task2 = analyze(text, TaskType::Task2);
        // 9 words: task 1 range [6, 25], task 2 range [8, 30]
        assert!((task1.metrics.normalized(MetricName::AvgSentenceLength) - 3.0 / 19.0).abs() < 1e-12);
        assert!((task2.metrics.normalized(MetricName::AvgSentenceLength) - 1.0 / 22.0).abs() < 1e-12);
        assert!(!task1.signals.short_sentences);
        assert!(task2.signals.short_sentences);
    }

    #[test]
    fn test_subordination_rate() {
        let analysis = analyze(
            "People move because rents rise. Cities which grow fast need planning. Prices fell.",
            TaskType::Task2,
        );
        assert!((analysis.metrics.raw(MetricName::SubordinationRate) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_monotony_ignores_questions() {
        let statement = "Many young people today choose to live in large cities. ";
        let text = statement.repeat(5);
        let flat = analyze(&text, TaskType::Task2);
        assert!(flat.signals.monotonous);

        // four statements plus questions: too few statements to judge
        let mixed = format!("{}Why? Really? ", statement.repeat(4));
        assert!(!analyze(&mixed, TaskType::Task2).signals.monotonous);
    }

    #[test]
    fn test_varied_lengths_not_monotonous() {
        let text = "Cities grow. Many young people today choose to live in large cities. \
                    Rents rise quickly. Governments must respond with better housing policies \
                    that protect residents from sudden increases. Planning matters.";
        assert!(!analyze(text, TaskType::Task2).signals.monotonous);
    }
}
