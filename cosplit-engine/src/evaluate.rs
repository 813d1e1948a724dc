//! Evaluation pipeline
//!
//! Runs a method over a labeled test set and aggregates the per-case
//! alignments into precision, recall and accuracy.
//!
//! Cases that cannot be aligned are counted as skipped; cases whose split
//! request fails are counted as failed. Neither stops the run and neither
//! contributes to the metrics.

use crate::config::EvaluationConfig;
use crate::error::{EngineError, Result};
use crate::manager::EngineManager;
use cosplit_align::{Aligner, Alignment, SplitOutcome};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A labeled compound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// The word as it is fed to the method
    pub compound: String,
    /// The word with its boundaries marked
    pub expected: String,
}

impl TestCase {
    /// Create a test case
    pub fn new(compound: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            compound: compound.into(),
            expected: expected.into(),
        }
    }
}

/// What happened to a single case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Aligned against the expected split
    Scored(Alignment),
    /// The method's split could not be aligned with the expected split
    Skipped,
    /// The split request itself failed
    Failed(String),
}

/// Aggregated metrics of one method over one test set
#[derive(Debug, Clone, Serialize)]
pub struct MethodStats {
    /// Method name
    pub method: String,
    /// correctly split / (correctly split + incorrectly split); NaN without splits
    pub precision: f64,
    /// correctly split / compounds; NaN without compounds
    pub recall: f64,
    /// (passed through + correctly split) / evaluated; NaN when nothing was evaluated
    pub accuracy: f64,
    /// Cases that could not be aligned
    pub skipped: usize,
    /// Cases whose split request failed
    pub failed: usize,
    /// Cases submitted (after sampling)
    pub total: usize,
    /// Cases that were scored
    pub evaluated: usize,
    /// Scored cases with every boundary right and at least one boundary
    pub correctly_split: usize,
    /// Scored cases with at least one false positive
    pub incorrectly_split: usize,
    /// Scored non-compounds left whole
    pub passed_through: usize,
    /// Scored cases with a boundary in either split
    pub compounds: usize,
    /// Boundaries found in both splits
    pub true_positives: usize,
    /// Boundaries only the method produced
    pub false_positives: usize,
    /// Boundaries the method missed
    pub false_negatives: usize,
}

#[derive(Debug, Default)]
struct Tally {
    total: usize,
    skipped: usize,
    failed: usize,
    evaluated: usize,
    correctly_split: usize,
    incorrectly_split: usize,
    passed_through: usize,
    compounds: usize,
    true_positives: usize,
    false_positives: usize,
    false_negatives: usize,
}

impl Tally {
    fn record(&mut self, outcome: &CaseOutcome) {
        self.total += 1;
        let alignment = match outcome {
            CaseOutcome::Scored(alignment) => alignment,
            CaseOutcome::Skipped => {
                self.skipped += 1;
                return;
            }
            CaseOutcome::Failed(_) => {
                self.failed += 1;
                return;
            }
        };

        self.evaluated += 1;
        self.true_positives += alignment.true_positives;
        self.false_positives += alignment.false_positives;
        self.false_negatives += alignment.false_negatives;

        match alignment.outcome() {
            SplitOutcome::CorrectlySplit => self.correctly_split += 1,
            SplitOutcome::PassedThrough => self.passed_through += 1,
            SplitOutcome::IncorrectlySplit => self.incorrectly_split += 1,
            SplitOutcome::MissedSplit => {}
        }
        if alignment.is_compound() {
            self.compounds += 1;
        }
    }

    fn finish(self, method: &str) -> MethodStats {
        MethodStats {
            method: method.to_string(),
            precision: ratio(
                self.correctly_split,
                self.correctly_split + self.incorrectly_split,
            ),
            recall: ratio(self.correctly_split, self.compounds),
            accuracy: ratio(self.passed_through + self.correctly_split, self.evaluated),
            skipped: self.skipped,
            failed: self.failed,
            total: self.total,
            evaluated: self.evaluated,
            correctly_split: self.correctly_split,
            incorrectly_split: self.incorrectly_split,
            passed_through: self.passed_through,
            compounds: self.compounds,
            true_positives: self.true_positives,
            false_positives: self.false_positives,
            false_negatives: self.false_negatives,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        f64::NAN
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Result of evaluating several methods on the same cases
#[derive(Debug, Default)]
pub struct Comparison {
    /// Successful runs, best accuracy first
    pub ranked: Vec<MethodStats>,
    /// Methods that could not be evaluated at all
    pub errors: Vec<(String, EngineError)>,
}

/// Drives methods through test sets
pub struct Evaluator<'a> {
    manager: &'a EngineManager,
    config: EvaluationConfig,
}

impl<'a> Evaluator<'a> {
    /// Evaluator with the default configuration
    pub fn new(manager: &'a EngineManager) -> Self {
        Self::with_config(manager, EvaluationConfig::default())
    }

    /// Evaluator with a custom configuration
    pub fn with_config(manager: &'a EngineManager, config: EvaluationConfig) -> Self {
        Self { manager, config }
    }

    /// Active configuration
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    fn aligner(&self) -> Aligner {
        Aligner::new(self.config.marker, self.config.infix_tolerance)
    }

    /// Cases to evaluate: everything, or a uniform sample of `max_cases`
    pub fn sample<'c>(&self, cases: &'c [TestCase]) -> Cow<'c, [TestCase]> {
        let Some(max) = self.config.max_cases else {
            return Cow::Borrowed(cases);
        };
        if cases.len() <= max {
            return Cow::Borrowed(cases);
        }

        tracing::info!(total = cases.len(), max, "sampling test cases");
        match self.config.seed {
            Some(seed) => Cow::Owned(choose(cases, max, &mut StdRng::seed_from_u64(seed))),
            None => Cow::Owned(choose(cases, max, &mut rand::rng())),
        }
    }

    /// Evaluate `method` over `cases`
    pub fn evaluate(&self, method: &str, cases: &[TestCase]) -> Result<MethodStats> {
        self.evaluate_with(method, cases, |_, _| {})
    }

    /// Evaluate `method`, reporting every case to `observer`
    ///
    /// Fails only when the method cannot be acquired.
    pub fn evaluate_with<F>(
        &self,
        method: &str,
        cases: &[TestCase],
        observer: F,
    ) -> Result<MethodStats>
    where
        F: FnMut(&TestCase, &CaseOutcome),
    {
        let cases = self.sample(cases);
        self.run(method, &cases, observer)
    }

    fn run<F>(&self, method: &str, cases: &[TestCase], mut observer: F) -> Result<MethodStats>
    where
        F: FnMut(&TestCase, &CaseOutcome),
    {
        let handle = self.manager.acquire(method)?;
        let aligner = self.aligner();
        let mut tally = Tally::default();

        for case in cases {
            let outcome = match handle.split(&case.compound) {
                Ok(result) => {
                    let actual = result.best_joined(&case.compound, self.config.marker);
                    match aligner.score(&actual, &case.expected) {
                        Ok(alignment) => CaseOutcome::Scored(alignment),
                        Err(e) => {
                            tracing::debug!(
                                method,
                                actual = %actual,
                                expected = %case.expected,
                                error = %e,
                                "skipping case"
                            );
                            CaseOutcome::Skipped
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(method, compound = %case.compound, error = %e, "split failed");
                    CaseOutcome::Failed(e.to_string())
                }
            };
            observer(case, &outcome);
            tally.record(&outcome);
        }

        let stats = tally.finish(method);
        tracing::info!(
            method,
            evaluated = stats.evaluated,
            skipped = stats.skipped,
            failed = stats.failed,
            "evaluation finished"
        );
        Ok(stats)
    }

    /// Evaluate every method on the same cases, best accuracy first
    ///
    /// A sample is drawn once and shared by all methods.
    pub fn compare(&self, methods: &[String], cases: &[TestCase]) -> Comparison {
        let cases = self.sample(cases);

        #[cfg(feature = "parallel")]
        let results: Vec<(String, Result<MethodStats>)> = methods
            .par_iter()
            .map(|method| (method.clone(), self.run(method, &cases, |_, _| {})))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<(String, Result<MethodStats>)> = methods
            .iter()
            .map(|method| (method.clone(), self.run(method, &cases, |_, _| {})))
            .collect();

        let mut comparison = Comparison::default();
        for (method, result) in results {
            match result {
                Ok(stats) => comparison.ranked.push(stats),
                Err(e) => comparison.errors.push((method, e)),
            }
        }
        comparison
            .ranked
            .sort_by(|a, b| rank_key(b.accuracy).total_cmp(&rank_key(a.accuracy)));
        comparison
    }
}

// NaN accuracy ranks last
fn rank_key(accuracy: f64) -> f64 {
    if accuracy.is_nan() {
        f64::NEG_INFINITY
    } else {
        accuracy
    }
}

fn choose<R: Rng + ?Sized>(cases: &[TestCase], amount: usize, rng: &mut R) -> Vec<TestCase> {
    cases.choose_multiple(rng, amount).cloned().collect()
}
