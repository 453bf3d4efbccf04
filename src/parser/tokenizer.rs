//! Sentence splitting and word tokenization

use super::tagger::Tagger;
use crate::Token;
use once_cell::sync::Lazy;
use regex::Regex;

/// Abbreviations, words (with inner apostrophes or hyphens), numbers, then any other single character
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)
        \b(?:e\.g|i\.e|etc|mr|mrs|ms|dr|vs|approx|st)\.
        | [\p{L}\p{M}]+(?:['’\-][\p{L}\p{M}]+)*
        | \d+(?:[.,]\d+)*%?
        | \S",
    )
    .expect("token pattern is valid")
});

/// Capability: turn text into ordered sentences of tagged tokens.
///
/// Offsets on the returned tokens are character offsets into `text`.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<Vec<Token>>;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn tokenize(&self, text: &str) -> Vec<Vec<Token>> {
        (**self).tokenize(text)
    }
}

/// Built-in rule-based tokenizer and tagger
#[derive(Debug, Default, Clone)]
pub struct RuleTokenizer {
    tagger: Tagger,
}

/// A token match before tagging
struct RawToken<'t> {
    text: &'t str,
    byte_start: usize,
    byte_end: usize,
    offset: usize,
}

impl RuleTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn raw_tokens<'t>(&self, text: &'t str) -> Vec<RawToken<'t>> {
        let mut tokens = Vec::new();
        let mut char_pos = 0;
        let mut byte_pos = 0;
        for m in TOKEN_RE.find_iter(text) {
            char_pos += text[byte_pos..m.start()].chars().count();
            tokens.push(RawToken {
                text: m.as_str(),
                byte_start: m.start(),
                byte_end: m.end(),
                offset: char_pos,
            });
            char_pos += m.as_str().chars().count();
            byte_pos = m.end();
        }
        tokens
    }

    /// Whether a terminal mark at `index` closes the sentence
    fn ends_sentence(&self, text: &str, tokens: &[RawToken<'_>], index: usize) -> bool {
        let mut next = index + 1;
        // closing quotes and brackets stay with the sentence they close
        while next < tokens.len() && is_closer(tokens[next].text) && !has_gap(text, tokens, next) {
            next += 1;
        }
        match tokens.get(next) {
            None => true,
            Some(tok) => {
                has_gap(text, tokens, next)
                    && tok
                        .text
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit() || is_opener(c))
            }
        }
    }
}

impl Tokenizer for RuleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Vec<Token>> {
        let raw = self.raw_tokens(text);
        let mut sentences = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut prev_tag = None;

        let mut i = 0;
        while i < raw.len() {
            // a line break always closes the running sentence
            if !current.is_empty() && i > 0 && text[raw[i - 1].byte_end..raw[i].byte_start].contains('\n')
            {
                sentences.push(std::mem::take(&mut current));
                prev_tag = None;
            }

            let tok = &raw[i];
            let (pos, lemma) = self.tagger.tag(tok.text, prev_tag, current.is_empty());
            current.push(Token::new(tok.text, lemma, pos, tok.offset));
            if pos.is_word() {
                prev_tag = Some(pos);
            }

            if self.tagger.is_terminal(tok.text) && self.ends_sentence(text, &raw, i) {
                // absorb trailing closers into this sentence
                while i + 1 < raw.len() && is_closer(raw[i + 1].text) && !has_gap(text, &raw, i + 1)
                {
                    i += 1;
                    let closer = &raw[i];
                    current.push(Token::new(
                        closer.text,
                        None,
                        crate::PosTag::Punctuation,
                        closer.offset,
                    ));
                }
                sentences.push(std::mem::take(&mut current));
                prev_tag = None;
            }
            i += 1;
        }

        if !current.is_empty() {
            sentences.push(current);
        }
        sentences
    }
}

fn has_gap(text: &str, tokens: &[RawToken<'_>], index: usize) -> bool {
    index > 0 && tokens[index - 1].byte_end < tokens[index].byte_start && {
        let between = &text[tokens[index - 1].byte_end..tokens[index].byte_start];
        between.chars().any(char::is_whitespace)
    }
}

fn is_closer(token: &str) -> bool {
    matches!(token, "\"" | "'" | ")" | "]" | "”" | "’" | "»")
}

fn is_opener(c: char) -> bool {
    matches!(c, '"' | '\'' | '(' | '[' | '“' | '‘' | '«')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PosTag;

    fn sentences(text: &str) -> Vec<Vec<String>> {
        RuleTokenizer::new()
            .tokenize(text)
            .into_iter()
            .map(|s| s.into_iter().map(|t| t.text).collect())
            .collect()
    }

    #[test]
    fn test_two_simple_sentences() {
        let s = sentences("The cat sit on mat. He is happy.");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0], vec!["The", "cat", "sit", "on", "mat", "."]);
        assert_eq!(s[1], vec!["He", "is", "happy", "."]);
    }

    #[test]
    fn test_char_offsets() {
        let tokens = RuleTokenizer::new().tokenize("The cat sit on mat.");
        let sit = &tokens[0][2];
        assert_eq!(sit.text, "sit");
        assert_eq!(sit.offset, 8);
        assert_eq!(sit.end(), 11);
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let tokens = RuleTokenizer::new().tokenize("Café culture grows.");
        assert_eq!(tokens[0][1].text, "culture");
        assert_eq!(tokens[0][1].offset, 5);
    }

    #[test]
    fn test_abbreviation_does_not_split() {
        let s = sentences("Some fruits, e.g. Apples, are cheap. Others are not.");
        assert_eq!(s.len(), 2);
        assert!(s[0].contains(&"e.g.".to_string()));
    }

    #[test]
    fn test_question_and_exclamation() {
        let s = sentences("Why do people travel? Nobody knows! It is a mystery.");
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].last().unwrap(), "?");
    }

    #[test]
    fn test_lowercase_after_period_keeps_sentence() {
        let s = sentences("The value rose to 3.5 percent. then it fell.");
        assert_eq!(s.len(), 1);
        assert!(s[0].contains(&"3.5".to_string()));
    }

    #[test]
    fn test_newline_closes_sentence() {
        let s = sentences("Introduction\nThe chart shows sales.");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0], vec!["Introduction"]);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let s = sentences("He said \"stop.\" Then he left.");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].last().unwrap(), "\"");
    }

    #[test]
    fn test_hyphenated_and_contractions_single_tokens() {
        let s = sentences("Long-term plans don't fail.");
        assert_eq!(s[0], vec!["Long-term", "plans", "don't", "fail", "."]);
    }

    #[test]
    fn test_tags_assigned() {
        let tokens = RuleTokenizer::new().tokenize("Students learn because teachers care.");
        let tags: Vec<PosTag> = tokens[0].iter().map(|t| t.pos).collect();
        assert_eq!(tags[2], PosTag::SubordConj);
        assert_eq!(*tags.last().unwrap(), PosTag::Punctuation);
    }
}
