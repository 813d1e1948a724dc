//! Prepare command implementation

use super::CommonArgs;
use anyhow::Result;
use clap::Args;
use rayon::prelude::*;

/// Arguments for the prepare command
#[derive(Debug, Args)]
pub struct PrepareArgs {
    /// Methods to prepare (default: all)
    #[arg(short, long = "method", value_name = "METHOD")]
    pub methods: Vec<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl PrepareArgs {
    /// Execute the prepare command
    pub fn execute(&self) -> Result<()> {
        self.common.init_logging();
        let config = self.common.load_config()?;
        let manager = self.common.manager(&config)?;

        let methods: Vec<String> = if self.methods.is_empty() {
            manager.methods().iter().map(|d| d.name.clone()).collect()
        } else {
            self.methods.clone()
        };

        // downloads are independent of each other
        let results: Vec<(String, cosplit_engine::Result<()>)> = methods
            .par_iter()
            .map(|method| (method.clone(), manager.prepare(method)))
            .collect();

        let mut failures = 0;
        for (method, result) in results {
            match result {
                Ok(()) => println!("✓ {method}"),
                Err(e) => {
                    failures += 1;
                    println!("✗ {method}: {e}");
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{failures} of {} methods failed to prepare", methods.len());
        }
        Ok(())
    }
}
