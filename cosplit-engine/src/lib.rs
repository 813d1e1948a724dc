//! Orchestration of external compound splitters
//!
//! This crate discovers splitting methods, starts their engines on demand
//! (at most once per method), and evaluates them against labeled test sets.
//!
//! ```no_run
//! use cosplit_engine::{EngineManager, Evaluator, MethodRegistry, TestCase};
//!
//! let registry = MethodRegistry::discover("methods")?;
//! let manager = EngineManager::new(registry);
//!
//! let result = manager.split("secos", "kwaliteitscontrole")?;
//! println!("{}", result.best_joined("kwaliteitscontrole", '_'));
//!
//! let cases = vec![TestCase::new("kwaliteitscontrole", "kwaliteits_controle")];
//! let stats = Evaluator::new(&manager).evaluate("secos", &cases)?;
//! println!("accuracy {:.3}", stats.accuracy);
//! # Ok::<(), cosplit_engine::EngineError>(())
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod candidate;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod evaluate;
pub mod manager;

// Re-export key types
pub use adapter::{DefaultEngineFactory, EngineFactory, EngineKind, RetryPolicy, SplitEngine};
pub use candidate::{Candidate, SplitResult};
pub use config::{EngineConfig, EvaluationConfig};
pub use descriptor::{EngineSpec, MethodDescriptor, MethodRegistry, Protocol};
pub use error::{EngineError, Result};
pub use evaluate::{CaseOutcome, Comparison, Evaluator, MethodStats, TestCase};
pub use manager::{EngineHandle, EngineManager, EngineState};

// Re-export from align for convenience
pub use cosplit_align::{Alignment, SplitOutcome, BOUNDARY_MARKER};
