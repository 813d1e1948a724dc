//! CLI command implementations

use crate::config::CliConfig;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use cosplit_engine::{EngineManager, MethodRegistry};
use std::path::PathBuf;

pub mod evaluate;
pub mod list;
pub mod prepare;
pub mod serve;
pub mod split;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List available splitting methods
    List(list::ListArgs),

    /// Split words with a method
    Split(split::SplitArgs),

    /// Evaluate methods against labeled test sets
    Evaluate(evaluate::EvaluateArgs),

    /// Fetch or build engine resources
    Prepare(prepare::PrepareArgs),

    /// Answer "lemma,method" requests over TCP
    Serve(serve::ServeArgs),
}

impl Commands {
    /// Execute the selected command
    pub fn execute(&self) -> Result<()> {
        match self {
            Commands::List(args) => args.execute(),
            Commands::Split(args) => args.execute(),
            Commands::Evaluate(args) => args.execute(),
            Commands::Prepare(args) => args.execute(),
            Commands::Serve(args) => args.execute(),
        }
    }
}

/// Options shared by every command
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Methods directory (overrides the configuration file)
    #[arg(long, value_name = "DIR", env = "COSPLIT_METHODS")]
    pub methods_dir: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        let log_level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        if !self.quiet {
            // a second initialization (tests, embedding) keeps the first logger
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or(log_level),
            )
            .try_init();
        }
    }

    /// Configuration file merged with command-line overrides
    pub fn load_config(&self) -> Result<CliConfig> {
        let mut config = CliConfig::load_or_default(self.config.as_deref())?;
        if let Some(dir) = &self.methods_dir {
            config.methods.dir = dir.clone();
        }
        log::debug!("Configuration: {:?}", config);
        Ok(config)
    }

    /// Method registry of the configured methods directory
    pub fn registry(&self, config: &CliConfig) -> Result<MethodRegistry> {
        let dir = &config.methods.dir;
        MethodRegistry::discover(dir)
            .with_context(|| format!("Failed to load methods from {}", dir.display()))
    }

    /// Engine manager over the configured methods
    pub fn manager(&self, config: &CliConfig) -> Result<EngineManager> {
        Ok(EngineManager::new(self.registry(config)?).with_config(config.engine_config()))
    }
}
