//! Parser module: noise stripping, sentence splitting, tokenization and tagging

pub mod normalizer;
pub mod tagger;
pub mod tokenizer;

pub use normalizer::{
    strip_noise, NormalizedEssay, Normalizer, DEFAULT_TASK2_MIN_WORDS, MAX_SENTENCE_CHARS,
};
pub use tagger::Tagger;
pub use tokenizer::{RuleTokenizer, Tokenizer};
