//! Property tests: band granularity, monotonicity, merge behavior

use bandscore::analyzer::{BandMapper, ComplexitySignals, GrammarAggregator, ScoringEngine};
use bandscore::config::{GrammarConfig, LexicalConfig};
use bandscore::grammar::{MatchesFile, RawMatch};
use bandscore::{Band, ErrorKind, FlaggedError, MetricName, MetricVector, Span, TaskType};
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "people", "city", "because", "although", "which", "grow", "quickly", "government",
    "should", "invest", "education", "the", "a", "in", "many", "young", "students",
    "believe", "that", "technology", "is", "useful", "ubiquitous", "infrastructure",
    "and", "but", "rents", "rise", "every", "year", "2020", "sustainable",
];

const CATEGORIES: &[&str] = &[
    "GRAMMAR/HE_VERB_AGR",
    "TYPOS/MORFOLOGIK_RULE_EN_US",
    "PUNCTUATION/COMMA_PARENTHESIS_WHITESPACE",
    "GRAMMAR/TENSE_SEQUENCE",
    "WORD_ORDER",
    "STYLE/WORDINESS",
];

fn essay_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec((prop::sample::select(WORDS), any::<u8>()), 1..120).prop_map(|words| {
        let mut text = String::new();
        for (i, (word, roll)) in words.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(word);
            match roll % 9 {
                0 => text.push('.'),
                1 => text.push(','),
                _ => {}
            }
        }
        text.push('.');
        text
    })
}

fn matches_for(text: &str, picks: &[(u16, u8, usize)]) -> Vec<RawMatch> {
    let len = text.chars().count();
    picks
        .iter()
        .map(|&(at, span, category)| {
            let start = at as usize % len;
            let end = (start + span as usize % 12).min(len);
            RawMatch::new(start, end, CATEGORIES[category % CATEGORIES.len()])
        })
        .collect()
}

fn error(start: usize, len: usize, kind: ErrorKind, severity: f64) -> FlaggedError {
    FlaggedError {
        span: Span::new(start, start + len),
        category: kind.to_string(),
        kind,
        severity,
        excerpt: String::new(),
        message: None,
        replacements: Vec::new(),
    }
}

fn is_half_band(band: Band) -> bool {
    let doubled = band.value() * 2.0;
    doubled.fract() == 0.0 && (0.0..=9.0).contains(&band.value())
}

#[test]
fn overlapping_pair_merges_and_disjoint_pair_does_not() {
    let config = GrammarConfig::default();
    let aggregator = GrammarAggregator::new(&config);
    let merged = aggregator.merge(vec![
        error(0, 10, ErrorKind::Agreement, 1.0),
        error(5, 7, ErrorKind::Spelling, 0.6),
    ]);
    assert_eq!(merged.len(), 1);
    let apart = aggregator.merge(vec![
        error(0, 10, ErrorKind::Agreement, 1.0),
        error(20, 10, ErrorKind::Spelling, 0.6),
    ]);
    assert_eq!(apart.len(), 2);
}

proptest! {
    #[test]
    fn bands_are_half_steps(
        text in essay_strategy(),
        picks in prop::collection::vec((any::<u16>(), any::<u8>(), any::<usize>()), 0..20),
    ) {
        let matches = matches_for(&text, &picks);
        let result = ScoringEngine::new(MatchesFile::from_matches(matches))
            .score(&text, TaskType::Auto)
            .unwrap();
        prop_assert!(is_half_band(result.gra));
        prop_assert!(is_half_band(result.lr));
        prop_assert!(result.gra.value() >= 2.0);
        prop_assert!(result.lr.value() >= 3.0);
        for (_, value) in result.metrics.iter() {
            prop_assert!((0.0..=1.0).contains(&value.normalized));
        }
        if result.low_confidence {
            prop_assert!(result.lr.value() <= 6.0);
        }
    }

    #[test]
    fn parallel_equals_sequential(
        text in essay_strategy(),
        picks in prop::collection::vec((any::<u16>(), any::<u8>(), any::<usize>()), 0..10),
    ) {
        let matches = matches_for(&text, &picks);
        let parallel = ScoringEngine::new(MatchesFile::from_matches(matches.clone()))
            .score(&text, TaskType::Auto)
            .unwrap();
        let sequential = ScoringEngine::new(MatchesFile::from_matches(matches))
            .parallel(false)
            .score(&text, TaskType::Auto)
            .unwrap();
        prop_assert_eq!(parallel, sequential);
    }

    #[test]
    fn merge_keeps_sorted_subset(
        raw in prop::collection::vec((0usize..200, 0usize..15, 0usize..6, 0u8..=10), 0..40),
    ) {
        let config = GrammarConfig::default();
        let errors: Vec<FlaggedError> = raw
            .iter()
            .map(|&(start, len, kind, severity)| {
                error(start, len, ErrorKind::ALL[kind], severity as f64 / 10.0)
            })
            .collect();
        let merged = GrammarAggregator::new(&config).merge(errors.clone());

        prop_assert!(merged.len() <= errors.len());
        prop_assert_eq!(merged.is_empty(), errors.is_empty());
        prop_assert!(merged.windows(2).all(|w| w[0].span.start <= w[1].span.start));
        for kept in &merged {
            prop_assert!(errors.contains(kept));
        }
    }

    #[test]
    fn disjoint_errors_are_all_kept(count in 0usize..30, gap in 1usize..5) {
        let config = GrammarConfig::default();
        let errors: Vec<FlaggedError> = (0..count)
            .map(|i| error(i * (3 + gap), 3, ErrorKind::Spelling, 0.6))
            .collect();
        let merged = GrammarAggregator::new(&config).merge(errors);
        prop_assert_eq!(merged.len(), count);
    }

    #[test]
    fn gra_never_rises_with_density(a in 0.0f64..=1.0, b in 0.0f64..=1.0, diversity in 0.0f64..=1.0) {
        let (grammar, lexical) = (GrammarConfig::default(), LexicalConfig::default());
        let mapper = BandMapper::new(&grammar, &lexical);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let band_at = |density: f64| {
            let mut metrics = MetricVector::new();
            metrics.insert(MetricName::ErrorDensity, density, density);
            metrics.insert(MetricName::ErrorDiversity, diversity, diversity);
            mapper.map_gra(&metrics, 3, ComplexitySignals::default()).band
        };
        prop_assert!(band_at(high) <= band_at(low));
    }

    #[test]
    fn lr_lookup_is_monotone(a in 0.0f64..=1.2, b in 0.0f64..=1.2) {
        let (grammar, lexical) = (GrammarConfig::default(), LexicalConfig::default());
        let mapper = BandMapper::new(&grammar, &lexical);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(mapper.lookup(low) <= mapper.lookup(high));
    }

    #[test]
    fn floor_rounds_down_within_half(value in 0.0f64..=9.0) {
        let band = Band::floor_from(value);
        prop_assert!(band.value() <= value + 1e-6);
        prop_assert!(value - band.value() < 0.5);
    }
}
