//! Evaluate command implementation

use super::CommonArgs;
use crate::error::CliError;
use crate::input::{load_test_sets, resolve_patterns};
use crate::output::{OutputFormat, OutputFormatter};
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::Args;
use cosplit_engine::{EngineManager, EvaluationConfig, Evaluator, MethodStats, TestCase};
use std::fs::File;
use std::io;
use std::path::PathBuf;

/// Arguments for the evaluate command
#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Methods to evaluate
    #[arg(short, long = "method", value_name = "METHOD")]
    pub methods: Vec<String>,

    /// Evaluate and rank every registered method
    #[arg(long, conflicts_with = "methods")]
    pub all: bool,

    /// Test set files or patterns (supports glob)
    #[arg(short, long = "test-set", value_name = "FILE/PATTERN", required = true)]
    pub test_sets: Vec<String>,

    /// Evaluate a random sample of at most this many cases
    #[arg(long, value_name = "N")]
    pub max_cases: Option<usize>,

    /// Seed for the random sample
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl EvaluateArgs {
    /// Execute the evaluate command
    pub fn execute(&self) -> Result<()> {
        self.common.init_logging();
        log::info!("Starting evaluation");

        let config = self.common.load_config()?;
        let files = resolve_patterns(&self.test_sets)?;
        let cases = load_test_sets(&files)?;

        let manager = self.common.manager(&config)?;
        let evaluation = self.evaluation_config(config.evaluation_config());
        let evaluator = Evaluator::with_config(&manager, evaluation);

        let stats = if self.all {
            self.compare(&manager, &evaluator, &cases)?
        } else {
            if self.methods.is_empty() {
                return Err(CliError::NoMethods.into());
            }
            self.evaluate_each(&evaluator, &cases)?
        };

        let mut formatter = self.formatter()?;
        for row in &stats {
            formatter.format_stats(row)?;
        }
        formatter.finish()
    }

    fn evaluation_config(&self, config: EvaluationConfig) -> EvaluationConfig {
        let max_cases = self.max_cases.or(config.max_cases);
        let seed = self.seed.or(config.seed);
        config.with_max_cases(max_cases).with_seed(seed)
    }

    fn evaluate_each(
        &self,
        evaluator: &Evaluator<'_>,
        cases: &[TestCase],
    ) -> Result<Vec<MethodStats>> {
        // one sample for all methods
        let sample = evaluator.sample(cases).into_owned();
        let mut reporter = ProgressReporter::new(self.common.quiet);

        let mut stats = Vec::with_capacity(self.methods.len());
        for method in &self.methods {
            reporter.init_cases(method, sample.len() as u64);
            let result = evaluator.evaluate_with(method, &sample, |case, outcome| {
                reporter.case_completed(&case.compound, outcome)
            });
            reporter.finish();
            stats.push(result.with_context(|| format!("Failed to evaluate {method}"))?);
        }
        Ok(stats)
    }

    fn compare(
        &self,
        manager: &EngineManager,
        evaluator: &Evaluator<'_>,
        cases: &[TestCase],
    ) -> Result<Vec<MethodStats>> {
        let methods: Vec<String> = manager.methods().iter().map(|d| d.name.clone()).collect();
        if methods.is_empty() {
            return Err(CliError::NoMethods.into());
        }

        let comparison = evaluator.compare(&methods, cases);
        for (method, error) in &comparison.errors {
            log::error!("Failed to evaluate {method}: {error}");
        }
        if comparison.ranked.is_empty() {
            anyhow::bail!("No method could be evaluated");
        }
        Ok(comparison.ranked)
    }

    fn formatter(&self) -> Result<Box<dyn OutputFormatter>> {
        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Ok(self.format.formatter(file))
            }
            None => Ok(self.format.formatter(io::stdout())),
        }
    }
}
