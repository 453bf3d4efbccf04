//! Band mapping: the rule table that turns metrics into GRA and LR bands

use super::checked_metric;
use super::complexity::ComplexitySignals;
use crate::config::{GrammarConfig, LexicalConfig};
use crate::{Band, BandResult, ErrorKind, GraBreakdown, LrBreakdown, MetricName, MetricVector};

/// Maps metric vectors onto bands using configured constants
pub struct BandMapper<'c> {
    grammar: &'c GrammarConfig,
    lexical: &'c LexicalConfig,
}

impl<'c> BandMapper<'c> {
    pub fn new(grammar: &'c GrammarConfig, lexical: &'c LexicalConfig) -> Self {
        Self { grammar, lexical }
    }

    /// GRA = start - (density + diversity + range penalties), floored and rounded down
    pub fn map_gra(
        &self,
        metrics: &MetricVector,
        distinct_kinds: usize,
        signals: ComplexitySignals,
    ) -> GraBreakdown {
        let g = self.grammar;
        let density = checked_metric(
            MetricName::ErrorDensity,
            metrics.normalized(MetricName::ErrorDensity),
            0.0,
            1.0,
        );
        let diversity = checked_metric(
            MetricName::ErrorDiversity,
            metrics.normalized(MetricName::ErrorDiversity),
            0.0,
            1.0,
        );

        let density_penalty = g.density_weight * density;
        // a single kind of mistake is a slip, not a range problem
        let diversity_penalty = if distinct_kinds < g.min_distinct_kinds {
            0.0
        } else {
            g.diversity_weight * diversity
        };
        let mut range_penalty = 0.0;
        if signals.short_sentences {
            range_penalty += g.short_sentence_penalty;
        }
        if signals.monotonous {
            range_penalty += g.monotony_penalty;
        }

        let total_penalty = density_penalty + diversity_penalty + range_penalty;
        let unrounded = g.start - total_penalty;
        let band = Band::floor_from(unrounded.clamp(g.floor, 9.0));

        GraBreakdown {
            start: g.start,
            density_penalty,
            diversity_penalty,
            range_penalty,
            total_penalty,
            unrounded,
            band,
        }
    }

    /// LR from the weighted raw score, the table, repetition and the confidence cap
    pub fn map_lr(&self, metrics: &MetricVector, low_confidence: bool) -> LrBreakdown {
        let lr = self.lexical;
        let ttr_term = lr.ttr_weight * metrics.normalized(MetricName::Ttr);
        let rare_word_term = lr.rare_word_weight * metrics.normalized(MetricName::RareWordRatio);
        let subordination_term =
            lr.subordination_weight * metrics.normalized(MetricName::SubordinationRate);

        let raw_score = ttr_term + rare_word_term + subordination_term;
        let bucket_band = self.lookup(raw_score);

        let repetition_penalty =
            if metrics.normalized(MetricName::RepetitionRate) >= lr.repetition_threshold {
                lr.repetition_penalty
            } else {
                0.0
            };
        let mut band = if repetition_penalty > 0.0 {
            let penalized = Band::floor_from(bucket_band.value() - repetition_penalty);
            penalized.max(lr.base_band.min(bucket_band))
        } else {
            bucket_band
        };

        let low_confidence_cap = if low_confidence && band > lr.low_confidence_cap {
            band = lr.low_confidence_cap;
            Some(lr.low_confidence_cap)
        } else {
            None
        };

        LrBreakdown {
            ttr_term,
            rare_word_term,
            subordination_term,
            raw_score,
            bucket_band,
            repetition_penalty,
            low_confidence_cap,
            band,
        }
    }

    /// First table row whose threshold the raw score reaches
    pub fn lookup(&self, raw_score: f64) -> Band {
        self.lexical
            .table
            .iter()
            .find(|row| raw_score >= row.min_raw)
            .map(|row| row.band)
            .unwrap_or(self.lexical.base_band)
    }

    /// Get a description of a band
    pub fn band_description(band: Band) -> &'static str {
        match band.halves() {
            18 => "Expert user - full operational command",
            16..=17 => "Very good user - occasional unsystematic inaccuracies",
            14..=15 => "Good user - operational command with occasional inaccuracies",
            12..=13 => "Competent user - generally effective despite some inaccuracies",
            10..=11 => "Modest user - partial command, frequent problems",
            8..=9 => "Limited user - basic competence in familiar situations",
            6..=7 => "Extremely limited user - conveys only general meaning",
            _ => "Intermittent user - great difficulty with written English",
        }
    }

    /// Recommendations based on the scored essay
    pub fn recommendations(result: &BandResult) -> Vec<String> {
        let mut recs = Vec::new();
        let metrics = &result.metrics;

        if metrics.normalized(MetricName::ErrorDensity) >= 0.3 {
            match dominant_kind(result) {
                Some(kind) => recs.push(format!(
                    "Proofread for {} errors - they are the most frequent kind in this essay",
                    kind.label().to_lowercase()
                )),
                None => recs.push("Proofread carefully to reduce grammar errors".to_string()),
            }
        }

        if result.gra_breakdown.range_penalty > 0.0 {
            if metrics.raw(MetricName::SentenceLengthStdev) < 2.0 {
                recs.push("Vary sentence length - mix short statements with longer ones".to_string());
            }
            if result.gra_breakdown.range_penalty >= 1.0 {
                recs.push(
                    "Use more complex sentences - join ideas with because, although, which"
                        .to_string(),
                );
            }
        }

        if metrics.normalized(MetricName::Ttr) < 0.4 {
            recs.push("Expand vocabulary variety - avoid reusing the same words".to_string());
        }

        if metrics.normalized(MetricName::RareWordRatio) < 0.1 {
            recs.push("Use more precise, less common vocabulary where it fits".to_string());
        }

        if result.lr_breakdown.repetition_penalty > 0.0 {
            let repeated: Vec<&str> = result
                .most_common
                .iter()
                .take(3)
                .map(|w| w.word.as_str())
                .collect();
            recs.push(format!(
                "Find synonyms for repeated words ({})",
                repeated.join(", ")
            ));
        }

        if metrics.normalized(MetricName::SubordinationRate) < 0.2 {
            recs.push("Add subordinate clauses to show relationships between ideas".to_string());
        }

        if result.low_confidence {
            recs.push("Write a longer response - the sample is too short for a reliable estimate".to_string());
        }

        if recs.is_empty() {
            recs.push("Writing is in good shape! Keep practising under timed conditions.".to_string());
        }

        recs
    }
}

/// The error kind with the most occurrences, ties by taxonomy order
fn dominant_kind(result: &BandResult) -> Option<ErrorKind> {
    ErrorKind::ALL
        .iter()
        .copied()
        .map(|kind| {
            let count = result.errors.iter().filter(|e| e.kind == kind).count();
            (kind, count)
        })
        .filter(|(_, count)| *count > 0)
        .fold(None, |best: Option<(ErrorKind, usize)>, (kind, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((kind, count)),
        })
        .map(|(kind, _)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(entries: &[(MetricName, f64)]) -> MetricVector {
        let mut metrics = MetricVector::new();
        for (name, normalized) in entries {
            metrics.insert(*name, *normalized, *normalized);
        }
        metrics
    }

    fn mapper_parts() -> (GrammarConfig, LexicalConfig) {
        (GrammarConfig::default(), LexicalConfig::default())
    }

    #[test]
    fn test_gra_clean_essay_scores_nine() {
        let (g, l) = mapper_parts();
        let mapper = BandMapper::new(&g, &l);
        let gra = mapper.map_gra(&MetricVector::new(), 0, ComplexitySignals::default());
        assert_eq!(gra.band.value(), 9.0);
        assert_eq!(gra.total_penalty, 0.0);
    }

    #[test]
    fn test_gra_single_kind_has_no_diversity_penalty() {
        let (g, l) = mapper_parts();
        let mapper = BandMapper::new(&g, &l);
        let m = metrics(&[
            (MetricName::ErrorDensity, 0.25),
            (MetricName::ErrorDiversity, 1.0 / 6.0),
        ]);
        let gra = mapper.map_gra(&m, 1, ComplexitySignals::default());
        assert_eq!(gra.diversity_penalty, 0.0);
        assert_eq!(gra.density_penalty, 1.0);
        assert_eq!(gra.band.value(), 8.0);
    }

    #[test]
    fn test_gra_rounds_down_to_half_band() {
        let (g, l) = mapper_parts();
        let mapper = BandMapper::new(&g, &l);
        let m = metrics(&[
            (MetricName::ErrorDensity, 0.3),
            (MetricName::ErrorDiversity, 0.5),
        ]);
        // 9 - (1.2 + 0.75) = 7.05
        let gra = mapper.map_gra(&m, 3, ComplexitySignals::default());
        assert!((gra.unrounded - 7.05).abs() < 1e-9);
        assert_eq!(gra.band.value(), 7.0);
    }

    #[test]
    fn test_gra_floor() {
        let (mut g, l) = mapper_parts();
        g.density_weight = 6.0;
        let mapper = BandMapper::new(&g, &l);
        let m = metrics(&[
            (MetricName::ErrorDensity, 1.0),
            (MetricName::ErrorDiversity, 1.0),
        ]);
        let signals = ComplexitySignals {
            short_sentences: true,
            monotonous: true,
        };
        let gra = mapper.map_gra(&m, 6, signals);
        assert_eq!(gra.range_penalty, 1.5);
        // 9 - (6 + 1.5 + 1.5) = 0, held at the floor
        assert_eq!(gra.unrounded, 0.0);
        assert_eq!(gra.band.value(), 2.0);
    }

    #[test]
    fn test_gra_worst_default_case_lands_on_floor() {
        let (g, l) = mapper_parts();
        let mapper = BandMapper::new(&g, &l);
        let m = metrics(&[
            (MetricName::ErrorDensity, 1.0),
            (MetricName::ErrorDiversity, 1.0),
        ]);
        let signals = ComplexitySignals {
            short_sentences: true,
            monotonous: true,
        };
        let gra = mapper.map_gra(&m, 6, signals);
        assert_eq!(gra.total_penalty, 7.0);
        assert_eq!(gra.band.value(), 2.0);
    }

    #[test]
    fn test_lr_table_lookup() {
        let (g, l) = mapper_parts();
        let mapper = BandMapper::new(&g, &l);
        assert_eq!(mapper.lookup(1.0).value(), 9.0);
        assert_eq!(mapper.lookup(0.80).value(), 9.0);
        assert_eq!(mapper.lookup(0.79).value(), 8.0);
        assert_eq!(mapper.lookup(0.55).value(), 7.0);
        assert_eq!(mapper.lookup(0.41).value(), 6.0);
        assert_eq!(mapper.lookup(0.16).value(), 4.0);
        assert_eq!(mapper.lookup(0.0).value(), 3.0);
    }

    #[test]
    fn test_lr_weights_and_cap() {
        let (g, l) = mapper_parts();
        let mapper = BandMapper::new(&g, &l);
        let m = metrics(&[
            (MetricName::Ttr, 1.0),
            (MetricName::RareWordRatio, 1.0),
            (MetricName::SubordinationRate, 1.0),
        ]);
        let lr = mapper.map_lr(&m, false);
        assert!((lr.raw_score - 1.0).abs() < 1e-12);
        assert_eq!(lr.band.value(), 9.0);
        assert_eq!(lr.low_confidence_cap, None);

        let capped = mapper.map_lr(&m, true);
        assert_eq!(capped.bucket_band.value(), 9.0);
        assert_eq!(capped.band.value(), 6.0);
        assert_eq!(capped.low_confidence_cap.map(Band::value), Some(6.0));
    }

    #[test]
    fn test_lr_repetition_penalty_not_below_base() {
        let (g, l) = mapper_parts();
        let mapper = BandMapper::new(&g, &l);
        let repeated = metrics(&[
            (MetricName::Ttr, 0.5),
            (MetricName::RareWordRatio, 0.5),
            (MetricName::SubordinationRate, 0.5),
            (MetricName::RepetitionRate, 0.6),
        ]);
        // raw 0.5 -> 6.5, minus 0.5
        let lr = mapper.map_lr(&repeated, false);
        assert_eq!(lr.bucket_band.value(), 6.5);
        assert_eq!(lr.band.value(), 6.0);

        let weak = metrics(&[(MetricName::RepetitionRate, 1.0)]);
        let lr = mapper.map_lr(&weak, false);
        assert_eq!(lr.bucket_band.value(), 3.0);
        assert_eq!(lr.band.value(), 3.0);
    }

    #[test]
    fn test_band_description() {
        assert!(BandMapper::band_description(Band::MAX).contains("Expert"));
        assert!(BandMapper::band_description(Band::floor_from(6.5)).contains("Competent"));
        assert!(BandMapper::band_description(Band::floor_from(2.0)).contains("Intermittent"));
    }
}
