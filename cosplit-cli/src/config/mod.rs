//! Configuration module
//!
//! The configuration file is TOML. Every section and key is optional:
//!
//! ```toml
//! [methods]
//! dir = "methods"
//!
//! [engine]
//! start_timeout_secs = 120   # 0 disables the limit
//! call_timeout_secs = 30
//!
//! [evaluation]
//! max_cases = 1000
//! marker = "_"
//! infix_tolerance = 4
//! seed = 7
//!
//! [server]
//! host = "127.0.0.1"
//! port = 7005
//! ```

use crate::error::CliError;
use anyhow::{Context, Result};
use cosplit_engine::{EngineConfig, EvaluationConfig, BOUNDARY_MARKER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct CliConfig {
    /// Where method descriptors live
    #[serde(default)]
    pub methods: MethodsConfig,

    /// Engine lifecycle configuration
    #[serde(default)]
    pub engine: EngineSection,

    /// Evaluation configuration
    #[serde(default)]
    pub evaluation: EvaluationSection,

    /// Socket server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Method discovery configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MethodsConfig {
    /// Directory with one subdirectory per method
    pub dir: PathBuf,
}

impl Default for MethodsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("methods"),
        }
    }
}

/// Engine timeouts in seconds; 0 waits forever
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EngineSection {
    /// Limit on starting an engine
    pub start_timeout_secs: u64,
    /// Limit on a single split
    pub call_timeout_secs: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            start_timeout_secs: 120,
            call_timeout_secs: 30,
        }
    }
}

/// Evaluation configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EvaluationSection {
    /// Sample size for large test sets
    pub max_cases: Option<usize>,
    /// Boundary marker used by the test sets
    pub marker: char,
    /// Infix lookahead window
    pub infix_tolerance: usize,
    /// Seed for reproducible samples
    pub seed: Option<u64>,
}

impl Default for EvaluationSection {
    fn default() -> Self {
        let defaults = EvaluationConfig::default();
        Self {
            max_cases: defaults.max_cases,
            marker: BOUNDARY_MARKER,
            infix_tolerance: defaults.infix_tolerance,
            seed: defaults.seed,
        }
    }
}

/// Socket server configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7005,
        }
    }
}

fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl CliConfig {
    /// Read a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CliError::FileNotFound(path.display().to_string()).into());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse TOML configuration
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::ConfigError(e.to_string()).into())
    }

    /// Configuration file, or the defaults when none is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Lifecycle manager configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_start_timeout(timeout(self.engine.start_timeout_secs))
            .with_call_timeout(timeout(self.engine.call_timeout_secs))
    }

    /// Evaluation pipeline configuration
    pub fn evaluation_config(&self) -> EvaluationConfig {
        EvaluationConfig {
            marker: self.evaluation.marker,
            infix_tolerance: self.evaluation.infix_tolerance,
            max_cases: self.evaluation.max_cases,
            seed: self.evaluation.seed,
        }
    }
}
