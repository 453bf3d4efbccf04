//! Scoring engine - normalizes, checks grammar once, fans out to the analyzers

use crate::config::ScoringConfig;
use crate::grammar::{GrammarChecker, RawMatch};
use crate::lexicon::ReferenceWords;
use crate::parser::{NormalizedEssay, Normalizer, RuleTokenizer, Tokenizer};
use crate::{BandResult, EssayInput, MetricVector, ScoringResult, TaskType};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::sync::Arc;

use super::complexity::{ComplexityAnalysis, ComplexityAnalyzer};
use super::grammar::{GrammarAggregator, GrammarAnalysis};
use super::lexical::{LexicalAnalysis, LexicalAnalyzer};
use super::BandMapper;

/// Main scoring engine. One instance can score any number of essays.
pub struct ScoringEngine<G, T: Tokenizer = RuleTokenizer> {
    checker: G,
    normalizer: Normalizer<T>,
    config: Arc<ScoringConfig>,
    reference: Arc<ReferenceWords>,
}

impl<G: GrammarChecker> ScoringEngine<G, RuleTokenizer> {
    /// Engine with default configuration and the bundled word list
    pub fn new(checker: G) -> Self {
        let config = ScoringConfig::default();
        Self {
            checker,
            normalizer: Normalizer::new(RuleTokenizer::new())
                .task2_min_words(config.task2_min_words),
            config: Arc::new(config),
            reference: ReferenceWords::bundled(),
        }
    }

    /// Engine with validated configuration; loads a custom word list if one is named
    pub fn with_config(checker: G, config: ScoringConfig) -> Result<Self> {
        config.validate().context("Invalid scoring configuration")?;
        let lexical = &config.lexical_resource;
        let reference = match &lexical.reference_list {
            Some(path) => Arc::new(ReferenceWords::from_file(path, lexical.reference_size)?),
            None => ReferenceWords::bundled_with_size(lexical.reference_size),
        };
        Ok(Self {
            checker,
            normalizer: Normalizer::new(RuleTokenizer::new())
                .task2_min_words(config.task2_min_words),
            config: Arc::new(config),
            reference,
        })
    }
}

impl<G: GrammarChecker, T: Tokenizer> ScoringEngine<G, T> {
    /// Swap in another tokenizer implementation
    pub fn with_tokenizer<U: Tokenizer>(self, tokenizer: U) -> ScoringEngine<G, U> {
        ScoringEngine {
            checker: self.checker,
            normalizer: Normalizer::new(tokenizer).task2_min_words(self.config.task2_min_words),
            config: self.config,
            reference: self.reference,
        }
    }

    /// Share a reference word set across engines
    pub fn with_reference(mut self, reference: Arc<ReferenceWords>) -> Self {
        self.reference = reference;
        self
    }

    /// Run the analyzers concurrently (default) or one after another
    pub fn parallel(mut self, parallel: bool) -> Self {
        Arc::make_mut(&mut self.config).parallel = parallel;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn checker(&self) -> &G {
        &self.checker
    }

    /// Score raw essay text
    pub fn score(&self, essay_text: &str, task_type: TaskType) -> ScoringResult<BandResult> {
        let input = EssayInput::new(essay_text, task_type)?;
        self.score_input(&input)
    }

    /// Score raw bytes, which must be UTF-8
    pub fn score_bytes(&self, bytes: &[u8], task_type: TaskType) -> ScoringResult<BandResult> {
        let input = EssayInput::from_bytes(bytes, task_type)?;
        self.score_input(&input)
    }

    pub fn score_input(&self, input: &EssayInput) -> ScoringResult<BandResult> {
        self.score_input_with(&self.checker, input)
    }

    /// Score against a different grammar source while reusing this engine's configuration
    #[tracing::instrument(skip_all, fields(checker = checker.name(), task = %input.task()))]
    pub fn score_input_with<C: GrammarChecker + ?Sized>(
        &self,
        checker: &C,
        input: &EssayInput,
    ) -> ScoringResult<BandResult> {
        let essay = self.normalizer.normalize(input)?;

        // the only external call; a failure aborts with no partial result
        let matches = checker.check(&essay.text).map_err(|e| {
            tracing::warn!(error = %e, "grammar service failed");
            e
        })?;

        let (grammar, lexical, complexity) = if self.config.parallel {
            analyze_parallel(&self.config, &self.reference, &essay, matches)
        } else {
            analyze_sequential(&self.config, &self.reference, &essay, matches)
        };

        let result = assemble(&self.config, essay, grammar, lexical, complexity);
        tracing::info!(gra = %result.gra, lr = %result.lr, task = ?result.task, "scored essay");
        Ok(result)
    }

    /// Score many essays across the rayon thread pool, results in input order
    pub fn score_many_parallel(&self, essays: &[EssayInput]) -> Vec<ScoringResult<BandResult>>
    where
        G: Sync,
        T: Sync,
    {
        essays.par_iter().map(|input| self.score_input(input)).collect()
    }
}

type Analyses = (GrammarAnalysis, LexicalAnalysis, ComplexityAnalysis);

/// Reference path: one analyzer after another
fn analyze_sequential(
    config: &ScoringConfig,
    reference: &Arc<ReferenceWords>,
    essay: &NormalizedEssay,
    matches: Vec<RawMatch>,
) -> Analyses {
    let grammar = GrammarAggregator::new(&config.grammar).analyze(matches, essay);
    let lexical =
        LexicalAnalyzer::new(&config.lexical_resource, Arc::clone(reference)).analyze(essay.tokens());
    let complexity =
        ComplexityAnalyzer::new(&config.complexity).analyze(&essay.sentences, essay.task);
    (grammar, lexical, complexity)
}

/// Same analyzers fanned out with rayon::join; output is identical to the sequential path
fn analyze_parallel(
    config: &ScoringConfig,
    reference: &Arc<ReferenceWords>,
    essay: &NormalizedEssay,
    matches: Vec<RawMatch>,
) -> Analyses {
    let (grammar, (lexical, complexity)) = rayon::join(
        || GrammarAggregator::new(&config.grammar).analyze(matches, essay),
        || {
            rayon::join(
                || {
                    LexicalAnalyzer::new(&config.lexical_resource, Arc::clone(reference))
                        .analyze(essay.tokens())
                },
                || ComplexityAnalyzer::new(&config.complexity).analyze(&essay.sentences, essay.task),
            )
        },
    );
    (grammar, lexical, complexity)
}

/// Combine analyzer output into the final, immutable result
fn assemble(
    config: &ScoringConfig,
    essay: NormalizedEssay,
    grammar: GrammarAnalysis,
    lexical: LexicalAnalysis,
    complexity: ComplexityAnalysis,
) -> BandResult {
    let mut metrics = MetricVector::new();
    metrics.extend(grammar.metrics);
    metrics.extend(lexical.metrics);
    metrics.extend(complexity.metrics);

    let mapper = BandMapper::new(&config.grammar, &config.lexical_resource);
    let gra_breakdown = mapper.map_gra(&metrics, grammar.distinct_kinds, complexity.signals);
    let lr_breakdown = mapper.map_lr(&metrics, lexical.low_confidence);

    BandResult {
        gra: gra_breakdown.band,
        lr: lr_breakdown.band,
        task: essay.task,
        metrics,
        errors: grammar.errors,
        low_confidence: lexical.low_confidence,
        word_count: essay.word_count,
        content_words: lexical.content_words,
        unique_words: lexical.distinct_lemmas,
        sentence_count: essay.sentence_count(),
        most_common: lexical.most_common,
        gra_breakdown,
        lr_breakdown,
    }
}
