//! List command implementation

use super::CommonArgs;
use crate::output::OutputFormat;
use anyhow::Result;
use clap::Args;
use std::io;

/// Arguments for the list command
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ListArgs {
    /// Execute the list command
    pub fn execute(&self) -> Result<()> {
        self.common.init_logging();
        let config = self.common.load_config()?;
        let registry = self.common.registry(&config)?;

        if registry.is_empty() {
            log::warn!("No methods found in {}", config.methods.dir.display());
        }

        let mut formatter = self.format.formatter(io::stdout());
        for method in registry.list() {
            formatter.format_method(&method)?;
        }
        formatter.finish()
    }
}
