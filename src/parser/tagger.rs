//! Lexicon and suffix based part-of-speech tagger with a light lemmatizer

use crate::lexicon::{
    is_in, ADVERBS, AUXILIARIES, COMMON_VERBS, COORDINATORS, DETERMINERS, INTERJECTIONS,
    IRREGULAR_LEMMAS, PARTICLES, PREPOSITIONS, PRONOUNS, SUBORDINATORS, WH_WORDS,
};
use crate::PosTag;

const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ment", "ness", "ity", "ism", "ance", "ence", "ship", "hood", "ist", "ture",
    "age", "ery", "dom",
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "ive", "able", "ible", "al", "ic", "less", "ish", "ary",
];

const TERMINAL_PUNCTUATION: &[&str] = &[".", "!", "?"];

/// Tags single words given the tag of the previous word
#[derive(Debug, Default, Clone, Copy)]
pub struct Tagger;

impl Tagger {
    pub fn new() -> Self {
        Self
    }

    /// Tag a word. Returns the POS tag and the lemma when one applies.
    pub fn tag(
        &self,
        word: &str,
        prev: Option<PosTag>,
        sentence_start: bool,
    ) -> (PosTag, Option<String>) {
        if !word.chars().any(char::is_alphanumeric) {
            return (punctuation_tag(word), None);
        }
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return (PosTag::Numeral, None);
        }

        let lower = word.to_lowercase();

        if let Some(tagged) = tag_contraction(&lower) {
            return tagged;
        }

        if lower == "that" {
            let pos = match prev {
                Some(PosTag::Noun | PosTag::ProperNoun | PosTag::Verb | PosTag::Adjective) => {
                    PosTag::SubordConj
                }
                _ => PosTag::Determiner,
            };
            return (pos, Some(lower));
        }

        if let Some(pos) = closed_class(&lower) {
            let lemma = irregular_lemma(&lower).unwrap_or(&lower).to_string();
            return (pos, Some(lemma));
        }

        if let Some(lemma) = irregular_lemma(&lower) {
            let pos = if matches!(lemma, "good" | "bad") {
                PosTag::Adjective
            } else if is_in(COMMON_VERBS, lemma) || matches!(lemma, "be" | "have" | "do") {
                PosTag::Verb
            } else {
                PosTag::Noun
            };
            return (pos, Some(lemma.to_string()));
        }

        if is_in(COMMON_VERBS, &lower) {
            let pos = if matches!(prev, Some(PosTag::Determiner | PosTag::Adjective)) {
                PosTag::Noun
            } else {
                PosTag::Verb
            };
            return (pos, Some(lower));
        }

        let capitalized = word.chars().next().is_some_and(char::is_uppercase);
        if capitalized && !sentence_start {
            return (PosTag::ProperNoun, Some(word.to_string()));
        }

        tag_by_suffix(&lower)
    }

    /// Whether the word is a base-form verb that can open an imperative
    pub fn is_imperative_verb(&self, token_text: &str) -> bool {
        is_in(COMMON_VERBS, &token_text.to_lowercase())
    }

    pub fn is_terminal(&self, token_text: &str) -> bool {
        is_in(TERMINAL_PUNCTUATION, token_text)
    }
}

fn punctuation_tag(word: &str) -> PosTag {
    let is_punct = word.chars().all(|c| {
        c.is_ascii_punctuation() && !matches!(c, '$' | '%' | '&' | '+' | '=' | '<' | '>' | '@' | '#')
            || matches!(c, '–' | '—' | '…' | '“' | '”' | '‘' | '’' | '«' | '»')
    });
    if is_punct {
        PosTag::Punctuation
    } else {
        PosTag::Symbol
    }
}

fn closed_class(lower: &str) -> Option<PosTag> {
    if is_in(WH_WORDS, lower) {
        Some(PosTag::WhWord)
    } else if is_in(SUBORDINATORS, lower) {
        Some(PosTag::SubordConj)
    } else if is_in(AUXILIARIES, lower) {
        Some(PosTag::Auxiliary)
    } else if is_in(PRONOUNS, lower) {
        Some(PosTag::Pronoun)
    } else if is_in(DETERMINERS, lower) {
        Some(PosTag::Determiner)
    } else if is_in(PREPOSITIONS, lower) {
        Some(PosTag::Preposition)
    } else if is_in(PARTICLES, lower) {
        Some(PosTag::Particle)
    } else if is_in(COORDINATORS, lower) {
        Some(PosTag::CoordConj)
    } else if is_in(INTERJECTIONS, lower) {
        Some(PosTag::Interjection)
    } else if is_in(ADVERBS, lower) {
        Some(PosTag::Adverb)
    } else {
        None
    }
}

fn irregular_lemma(lower: &str) -> Option<&'static str> {
    IRREGULAR_LEMMAS
        .iter()
        .find(|(form, _)| *form == lower)
        .map(|(_, lemma)| *lemma)
}

fn tag_contraction(lower: &str) -> Option<(PosTag, Option<String>)> {
    let lower = lower.replace('’', "'");
    if let Some(base) = lower.strip_suffix("n't") {
        let lemma = match base {
            "ca" | "can" => "can",
            "wo" => "will",
            "sha" => "shall",
            other => irregular_lemma(other).unwrap_or(other),
        };
        return Some((PosTag::Auxiliary, Some(lemma.to_string())));
    }
    let (base, _) = lower.split_once('\'')?;
    if base.is_empty() {
        return None;
    }
    let pos = closed_class(base).unwrap_or(PosTag::Noun);
    Some((pos, Some(base.to_string())))
}

fn tag_by_suffix(lower: &str) -> (PosTag, Option<String>) {
    let len = lower.chars().count();

    if len > 4 && lower.ends_with("ly") {
        return (PosTag::Adverb, Some(lower.to_string()));
    }
    if len > 5 && lower.ends_with("ing") {
        return (PosTag::Verb, Some(verb_stem(&lower[..lower.len() - 3])));
    }
    if len > 4 && lower.ends_with("ied") {
        return (PosTag::Verb, Some(format!("{}y", &lower[..lower.len() - 3])));
    }
    if len > 4 && lower.ends_with("ed") {
        return (PosTag::Verb, Some(verb_stem(&lower[..lower.len() - 2])));
    }

    let singular = singularize(lower);
    if singular != lower && is_in(COMMON_VERBS, &singular) {
        return (PosTag::Verb, Some(singular));
    }
    if NOUN_SUFFIXES.iter().any(|s| singular.ends_with(s)) {
        return (PosTag::Noun, Some(singular));
    }
    if ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) && len > 4 {
        return (PosTag::Adjective, Some(lower.to_string()));
    }
    (PosTag::Noun, Some(singular))
}

/// Recover a verb stem after removing -ing or -ed
fn verb_stem(stem: &str) -> String {
    if is_in(COMMON_VERBS, stem) {
        return stem.to_string();
    }
    let with_e = format!("{}e", stem);
    if is_in(COMMON_VERBS, &with_e) {
        return with_e;
    }
    let chars: Vec<char> = stem.chars().collect();
    if chars.len() >= 3 {
        let last = chars[chars.len() - 1];
        let before = chars[chars.len() - 2];
        if last == before && !matches!(last, 'l' | 's' | 'z') && !"aeiou".contains(last) {
            return chars[..chars.len() - 1].iter().collect();
        }
    }
    stem.to_string()
}

/// Strip plural or third-person endings
fn singularize(lower: &str) -> String {
    let len = lower.chars().count();
    if len > 4 && lower.ends_with("ies") {
        return format!("{}y", &lower[..lower.len() - 3]);
    }
    if len > 4
        && ["sses", "xes", "ches", "shes", "zes"]
            .iter()
            .any(|s| lower.ends_with(s))
    {
        return lower[..lower.len() - 2].to_string();
    }
    if len > 3
        && lower.ends_with('s')
        && !["ss", "us", "is", "ous"].iter().any(|s| lower.ends_with(s))
    {
        return lower[..lower.len() - 1].to_string();
    }
    lower.to_string()
}
