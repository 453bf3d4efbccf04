//! Word lists: the high-frequency reference set and closed-class vocabulary

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Bundled frequency-ordered list of common English lemmas
const BUNDLED_COMMON_WORDS: &str = include_str!("../data/common_words.txt");

/// Default size of the reference set (top-N common words)
pub const DEFAULT_REFERENCE_SIZE: usize = 2000;

static BUNDLED_DEFAULT: Lazy<Arc<ReferenceWords>> = Lazy::new(|| {
    Arc::new(ReferenceWords::from_list(
        BUNDLED_COMMON_WORDS,
        DEFAULT_REFERENCE_SIZE,
    ))
});

/// Set of the N most common English words; absence signals a rarer word.
///
/// Built once and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct ReferenceWords {
    words: HashSet<String>,
}

impl ReferenceWords {
    /// Bundled list at the default size, shared process-wide
    pub fn bundled() -> Arc<ReferenceWords> {
        Arc::clone(&BUNDLED_DEFAULT)
    }

    /// Bundled list truncated to the first `size` entries
    pub fn bundled_with_size(size: usize) -> Arc<ReferenceWords> {
        if size == DEFAULT_REFERENCE_SIZE {
            return Self::bundled();
        }
        Arc::new(Self::from_list(BUNDLED_COMMON_WORDS, size))
    }

    /// Load a frequency-ordered list from a file and keep the first `size` entries
    pub fn from_file(path: &Path, size: usize) -> Result<ReferenceWords> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read word list: {}", path.display()))?;
        let words = Self::from_list(&content, size);
        if words.is_empty() {
            anyhow::bail!("Word list is empty: {}", path.display());
        }
        Ok(words)
    }

    /// Parse a whitespace-separated list; `#` starts a comment line, duplicates count once
    pub fn from_list(list: &str, size: usize) -> ReferenceWords {
        let mut words = HashSet::with_capacity(size.min(4096));
        for word in list
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .flat_map(str::split_whitespace)
        {
            if words.len() >= size {
                break;
            }
            words.insert(word.to_lowercase());
        }
        ReferenceWords { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

pub(crate) const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every", "either", "neither",
    "some", "any", "no", "all", "both", "many", "much", "few", "several", "another", "such",
    "my", "your", "his", "her", "its", "our", "their",
];

pub(crate) const PRONOUNS: &[&str] = &[
    "i", "me", "you", "he", "him", "she", "it", "we", "us", "they", "them", "myself",
    "yourself", "himself", "herself", "itself", "ourselves", "themselves", "mine", "yours",
    "hers", "ours", "theirs", "one", "someone", "anyone", "everyone", "nobody", "somebody",
    "anybody", "everybody", "something", "anything", "everything", "nothing",
];

/// Relative and interrogative words
pub(crate) const WH_WORDS: &[&str] = &[
    "which", "who", "whom", "whose", "what", "whatever", "whichever", "whoever",
];

pub(crate) const PREPOSITIONS: &[&str] = &[
    "of", "in", "to", "for", "with", "on", "at", "from", "by", "about", "as", "into", "like",
    "through", "after", "over", "between", "out", "against", "during", "without", "before",
    "under", "around", "among", "across", "behind", "beyond", "despite", "towards", "toward",
    "upon", "within", "along", "onto", "off", "near", "above", "below", "beside", "besides",
    "per", "via", "regarding", "concerning", "throughout", "than",
];

pub(crate) const COORDINATORS: &[&str] = &["and", "but", "or", "nor", "yet", "so"];

pub(crate) const SUBORDINATORS: &[&str] = &[
    "because", "although", "though", "while", "whereas", "if", "unless", "since", "when",
    "whenever", "where", "wherever", "until", "till", "that", "whether", "once", "lest",
    "why", "how",
];

pub(crate) const AUXILIARIES: &[&str] = &[
    "be", "am", "is", "are", "was", "were", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "will", "would", "shall", "should", "can", "could", "may", "might",
    "must", "ought",
];

pub(crate) const PARTICLES: &[&str] = &["not", "n't", "to"];

pub(crate) const INTERJECTIONS: &[&str] = &["oh", "yes", "yeah", "hello", "hi", "wow", "okay"];

pub(crate) const ADVERBS: &[&str] = &[
    "very", "also", "often", "never", "always", "sometimes", "usually", "too", "quite",
    "rather", "already", "still", "just", "even", "however", "therefore", "moreover",
    "furthermore", "nevertheless", "thus", "hence", "here", "there", "now", "then", "soon",
    "today", "tomorrow", "yesterday", "again", "almost", "perhaps", "maybe", "indeed",
    "instead", "well", "only", "ever", "seldom", "rarely", "otherwise", "meanwhile",
];

/// Base-form verbs common enough to anchor the tagger and the imperative check
pub(crate) const COMMON_VERBS: &[&str] = &[
    "go", "get", "make", "know", "think", "take", "see", "come", "want", "look", "use",
    "find", "give", "tell", "work", "call", "try", "ask", "need", "feel", "become", "leave",
    "put", "mean", "keep", "let", "begin", "seem", "help", "talk", "turn", "start", "show",
    "hear", "play", "run", "move", "like", "live", "believe", "hold", "bring", "happen",
    "write", "provide", "sit", "stand", "lose", "pay", "meet", "include", "continue", "set",
    "learn", "change", "lead", "understand", "watch", "follow", "stop", "create", "speak",
    "read", "allow", "add", "spend", "grow", "open", "walk", "win", "offer", "remember",
    "love", "consider", "appear", "buy", "wait", "serve", "die", "send", "expect", "build",
    "stay", "fall", "cut", "reach", "kill", "remain", "suggest", "raise", "pass", "sell",
    "require", "report", "decide", "pull", "imagine", "note", "explain", "develop", "argue",
    "agree", "claim", "eat", "drink", "sleep", "study", "teach", "improve",
    "reduce", "increase", "encourage", "prevent", "protect", "support", "travel", "sing",
    "say",
];

/// Irregular inflections mapped to their lemma
pub(crate) const IRREGULAR_LEMMAS: &[(&str, &str)] = &[
    ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"), ("been", "be"),
    ("being", "be"), ("has", "have"), ("had", "have"), ("having", "have"), ("does", "do"),
    ("did", "do"), ("done", "do"), ("went", "go"), ("gone", "go"), ("goes", "go"),
    ("made", "make"), ("said", "say"), ("says", "say"), ("took", "take"), ("taken", "take"),
    ("came", "come"), ("saw", "see"), ("seen", "see"), ("knew", "know"), ("known", "know"),
    ("got", "get"), ("gotten", "get"), ("gave", "give"), ("given", "give"), ("found", "find"),
    ("thought", "think"), ("told", "tell"), ("became", "become"), ("left", "leave"),
    ("felt", "feel"), ("brought", "bring"), ("began", "begin"), ("begun", "begin"),
    ("kept", "keep"), ("held", "hold"), ("wrote", "write"), ("written", "write"),
    ("stood", "stand"), ("heard", "hear"), ("meant", "mean"), ("met", "meet"), ("ran", "run"),
    ("paid", "pay"), ("sat", "sit"), ("spoke", "speak"), ("spoken", "speak"), ("led", "lead"),
    ("grew", "grow"), ("grown", "grow"), ("lost", "lose"), ("fell", "fall"), ("fallen", "fall"),
    ("sent", "send"), ("built", "build"), ("understood", "understand"), ("spent", "spend"),
    ("won", "win"), ("taught", "teach"), ("bought", "buy"), ("caught", "catch"),
    ("chose", "choose"), ("chosen", "choose"), ("ate", "eat"), ("eaten", "eat"),
    ("drank", "drink"), ("drunk", "drink"), ("slept", "sleep"), ("rose", "rise"),
    ("risen", "rise"), ("driven", "drive"), ("drove", "drive"), ("sold", "sell"),
    ("children", "child"), ("men", "man"), ("women", "woman"), ("people", "people"),
    ("feet", "foot"), ("teeth", "tooth"), ("mice", "mouse"), ("lives", "life"),
    ("wives", "wife"), ("knives", "knife"), ("better", "good"), ("best", "good"),
    ("worse", "bad"), ("worst", "bad"), ("data", "data"), ("news", "news"),
    ("this", "this"), ("its", "its"), ("less", "less"), ("unless", "unless"),
    ("always", "always"), ("perhaps", "perhaps"), ("analysis", "analysis"),
    ("crisis", "crisis"), ("basis", "basis"), ("thesis", "thesis"),
];

pub(crate) fn is_in(list: &[&str], word: &str) -> bool {
    list.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_list_is_populated() {
        let words = ReferenceWords::bundled();
        assert!(words.len() >= 1500, "bundled list has {} words", words.len());
        assert!(words.contains("the"));
        assert!(words.contains("government"));
        assert!(!words.contains("ubiquitous"));
    }

    #[test]
    fn test_size_truncates_in_frequency_order() {
        let words = ReferenceWords::bundled_with_size(3);
        assert_eq!(words.len(), 3);
        assert!(words.contains("the"));
        assert!(words.contains("be"));
        assert!(words.contains("and"));
        assert!(!words.contains("of"));
    }

    #[test]
    fn test_from_list_skips_comments_and_duplicates() {
        let words = ReferenceWords::from_list("# header\nCat dog\ncat bird\n", 10);
        assert_eq!(words.len(), 3);
        assert!(words.contains("cat"));
    }

    #[test]
    fn test_from_file_missing() {
        let result = ReferenceWords::from_file(Path::new("/nonexistent/words.txt"), 10);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_reads_list() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha\nbeta\ngamma").unwrap();
        let words = ReferenceWords::from_file(file.path(), 2).unwrap();
        assert_eq!(words.len(), 2);
        assert!(words.contains("beta"));
        assert!(!words.contains("gamma"));
    }
}
