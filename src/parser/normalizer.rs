//! Text normalizer: noise stripping, sentence splitting and task resolution

use super::tagger::Tagger;
use super::tokenizer::{RuleTokenizer, Tokenizer};
use crate::{EssayInput, PosTag, ScoringError, ScoringResult, Sentence, Span, Task, Token};

/// Sentences longer than this (in characters) without terminal punctuation get re-split
pub const MAX_SENTENCE_CHARS: usize = 400;

/// Word count at which `auto` resolves to Task 2
pub const DEFAULT_TASK2_MIN_WORDS: usize = 150;

/// Normalized essay ready for the analyzers
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEssay {
    /// Cleaned text; every offset in the essay points into this string
    pub text: String,
    pub sentences: Vec<Sentence>,
    pub task: Task,
    /// Non-punctuation tokens
    pub word_count: usize,
}

impl NormalizedEssay {
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }

    pub fn token_count(&self) -> usize {
        self.word_count
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }
}

/// Turns raw essay text into sentences and tokens
#[derive(Debug, Clone)]
pub struct Normalizer<T: Tokenizer = RuleTokenizer> {
    tokenizer: T,
    tagger: Tagger,
    task2_min_words: usize,
}

impl Default for Normalizer<RuleTokenizer> {
    fn default() -> Self {
        Self::new(RuleTokenizer::new())
    }
}

impl<T: Tokenizer> Normalizer<T> {
    pub fn new(tokenizer: T) -> Self {
        Self {
            tokenizer,
            tagger: Tagger::new(),
            task2_min_words: DEFAULT_TASK2_MIN_WORDS,
        }
    }

    pub fn task2_min_words(mut self, words: usize) -> Self {
        self.task2_min_words = words;
        self
    }

    /// Strip noise, split sentences and resolve the task type
    pub fn normalize(&self, input: &EssayInput) -> ScoringResult<NormalizedEssay> {
        let text = strip_noise(input.text());
        if text.is_empty() {
            return Err(ScoringError::EmptyInput);
        }

        let mut sentences = Vec::new();
        for tokens in self.tokenizer.tokenize(&text) {
            for piece in resplit_long(tokens) {
                if let Some(sentence) = self.build_sentence(piece) {
                    sentences.push(sentence);
                }
            }
        }

        let word_count = sentences.iter().map(Sentence::word_count).sum();
        if word_count == 0 {
            return Err(ScoringError::EmptyInput);
        }
        let task = input.task().resolve(word_count, self.task2_min_words);

        tracing::debug!(
            sentences = sentences.len(),
            words = word_count,
            %task,
            "normalized essay"
        );

        Ok(NormalizedEssay {
            text,
            sentences,
            task,
            word_count,
        })
    }

    fn build_sentence(&self, tokens: Vec<Token>) -> Option<Sentence> {
        let first = tokens.first()?;
        let last = tokens.last()?;
        let span = Span::new(first.offset, last.end());
        let relaxed = is_question(&tokens) || self.is_imperative(&tokens);
        Some(Sentence {
            tokens,
            span,
            relaxed,
        })
    }

    fn is_imperative(&self, tokens: &[Token]) -> bool {
        tokens
            .iter()
            .find(|t| t.pos.is_word())
            .is_some_and(|t| t.pos == PosTag::Verb && self.tagger.is_imperative_verb(&t.text))
    }
}

fn is_question(tokens: &[Token]) -> bool {
    tokens
        .iter()
        .rev()
        .find(|t| !matches!(t.text.as_str(), "\"" | "'" | ")" | "”" | "’"))
        .is_some_and(|t| t.text == "?")
}

/// Apply the noise-stripping rules line by line
pub fn strip_noise(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned: String = unified
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !(c.is_control() || is_invisible(c)))
        .collect();

    let mut lines = Vec::new();
    for line in cleaned.lines() {
        let line = strip_markup(line.trim());
        let collapsed = line
            .split([' ', '\t'])
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(collapsed);
    }

    // drop leading and trailing blank lines, keep paragraph breaks
    let joined = lines.join("\n");
    joined.trim_matches('\n').to_string()
}

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{FEFF}' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{00AD}')
}

/// Remove Markdown heading markers and list bullets at line start
fn strip_markup(line: &str) -> &str {
    let heading = line.trim_start_matches('#');
    if heading.len() != line.len() && (heading.is_empty() || heading.starts_with(' ')) {
        return heading.trim_start();
    }
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    line
}

/// Re-split a run-on sentence at the comma nearest the length limit
fn resplit_long(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut pieces = Vec::new();
    let mut rest = tokens;
    loop {
        let (Some(first), Some(last)) = (rest.first(), rest.last()) else {
            break;
        };
        let length = last.end() - first.offset;
        let terminated = rest.iter().any(|t| matches!(t.text.as_str(), "." | "!" | "?"));
        if length <= MAX_SENTENCE_CHARS || terminated {
            pieces.push(rest);
            break;
        }

        let limit = first.offset + MAX_SENTENCE_CHARS;
        let split_at = rest
            .iter()
            .enumerate()
            .filter(|(i, t)| t.text == "," && *i + 1 < rest.len())
            .min_by_key(|(_, t)| t.offset.abs_diff(limit))
            .map(|(i, _)| i);

        match split_at {
            Some(index) => {
                let tail = rest.split_off(index + 1);
                pieces.push(rest);
                rest = tail;
            }
            None => {
                pieces.push(rest);
                break;
            }
        }
    }
    if pieces.len() > 1 {
        tracing::trace!(pieces = pieces.len(), "re-split run-on sentence");
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskType;

    fn normalize(text: &str, task: TaskType) -> ScoringResult<NormalizedEssay> {
        let input = EssayInput::new(text, task)?;
        Normalizer::new(RuleTokenizer::new()).normalize(&input)
    }

    #[test]
    fn test_strip_noise_rules() {
        let raw = "\u{FEFF}# Title\r\n\r\n- first   point\r\n*  second\tpoint \u{200B}\n   ";
        assert_eq!(strip_noise(raw), "Title\n\nfirst point\nsecond point");
    }

    #[test]
    fn test_strip_noise_keeps_hyphen_words() {
        assert_eq!(strip_noise("-5 degrees"), "-5 degrees");
        assert_eq!(strip_noise("#hashtag"), "#hashtag");
    }

    #[test]
    fn test_empty_after_stripping() {
        let err = normalize("\u{200B}\u{200B} x", TaskType::Auto).map(|_| ());
        assert!(err.is_ok());
        let err = normalize("##\n-\u{200B}", TaskType::Auto).unwrap_err();
        assert!(matches!(err, ScoringError::EmptyInput));
    }

    #[test]
    fn test_sentences_and_spans() {
        let essay = normalize("The cat sit on mat. He is happy.", TaskType::Task2).unwrap();
        assert_eq!(essay.sentence_count(), 2);
        assert_eq!(essay.word_count, 8);
        assert_eq!(essay.sentences[0].span, Span::new(0, 19));
        assert_eq!(essay.sentences[1].span, Span::new(20, 32));
        assert_eq!(essay.task, Task::Task2);
    }

    #[test]
    fn test_auto_task_resolution() {
        let short = normalize("Sales rose sharply in May.", TaskType::Auto).unwrap();
        assert_eq!(short.task, Task::Task1);

        let long_text = "People often travel abroad for work. ".repeat(30);
        let long = normalize(&long_text, TaskType::Auto).unwrap();
        assert!(long.word_count >= 150);
        assert_eq!(long.task, Task::Task2);
    }

    #[test]
    fn test_relaxed_flags() {
        let essay = normalize(
            "Why do people move? Consider the costs. Cities are expensive.",
            TaskType::Task2,
        )
        .unwrap();
        let flags: Vec<bool> = essay.sentences.iter().map(|s| s.relaxed).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn test_run_on_sentence_is_resplit() {
        let clause = "people in large cities spend many hours in traffic every day";
        let text = vec![clause; 12].join(", ");
        let essay = normalize(&text, TaskType::Task2).unwrap();
        assert!(essay.sentence_count() >= 2);
        for sentence in &essay.sentences {
            assert!(sentence.span.len() <= MAX_SENTENCE_CHARS + clause.len());
        }
    }

    #[test]
    fn test_long_terminated_sentence_is_kept() {
        let clause = "people in large cities spend many hours in traffic every day";
        let text = format!("{}.", vec![clause; 12].join(", "));
        let essay = normalize(&text, TaskType::Task2).unwrap();
        assert_eq!(essay.sentence_count(), 1);
    }
}
