//! Progress reporting module

use cosplit_engine::CaseOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for evaluation runs
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(quiet: bool) -> Self {
        Self {
            progress_bar: None,
            quiet,
        }
    }

    /// Initialize progress bar for evaluating `method` over `total_cases`
    pub fn init_cases(&mut self, method: &str, total_cases: u64) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total_cases);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {prefix} {bar:40.cyan/blue} {pos}/{len} cases {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        pb.set_style(style);
        pb.set_prefix(method.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        self.progress_bar = Some(pb);
    }

    /// Update progress for a completed case
    pub fn case_completed(&self, compound: &str, outcome: &CaseOutcome) {
        if let Some(pb) = &self.progress_bar {
            match outcome {
                CaseOutcome::Scored(_) => pb.set_message(compound.to_string()),
                CaseOutcome::Skipped => pb.set_message(format!("{compound} (skipped)")),
                CaseOutcome::Failed(_) => pb.set_message(format!("{compound} (failed)")),
            }
            pb.inc(1);
        }
    }

    /// Finish progress reporting
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }
}
