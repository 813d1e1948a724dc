//! Configuration types for the engine

use cosplit_align::{BOUNDARY_MARKER, INFIX_TOLERANCE};
use std::time::Duration;

/// Lifecycle manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on a single engine start (None = wait forever)
    pub start_timeout: Option<Duration>,
    /// Upper bound on a single split call (None = wait forever)
    pub call_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_timeout: Some(Duration::from_secs(120)),
            call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl EngineConfig {
    /// No timeouts at all
    pub fn unbounded() -> Self {
        Self {
            start_timeout: None,
            call_timeout: None,
        }
    }

    /// Override the start timeout
    pub fn with_start_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Override the call timeout
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Evaluation pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationConfig {
    /// Boundary marker used by the test set
    pub marker: char,
    /// Infix lookahead window and plain-mismatch budget
    pub infix_tolerance: usize,
    /// Evaluate a random sample of this size for larger test sets
    pub max_cases: Option<usize>,
    /// Seed for the sample; unseeded runs differ between invocations
    pub seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            marker: BOUNDARY_MARKER,
            infix_tolerance: INFIX_TOLERANCE,
            max_cases: None,
            seed: None,
        }
    }
}

impl EvaluationConfig {
    /// Limit the number of evaluated cases
    pub fn with_max_cases(mut self, max_cases: Option<usize>) -> Self {
        self.max_cases = max_cases;
        self
    }

    /// Make sampling reproducible
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}
