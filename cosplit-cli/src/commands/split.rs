//! Split command implementation

use super::CommonArgs;
use anyhow::Result;
use clap::Args;
use cosplit_engine::SplitResult;
use serde::Serialize;

/// Arguments for the split command
#[derive(Debug, Default, Args)]
pub struct SplitArgs {
    /// Method to split with
    #[arg(short, long, value_name = "METHOD", required = true)]
    pub method: String,

    /// Words to split
    #[arg(value_name = "WORD", required = true)]
    pub words: Vec<String>,

    /// Print every candidate with its score
    #[arg(short, long)]
    pub all: bool,

    /// Print the results as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Serialize)]
struct WordSplit<'a> {
    word: &'a str,
    #[serde(flatten)]
    result: SplitResult,
}

impl SplitArgs {
    /// Execute the split command
    pub fn execute(&self) -> Result<()> {
        self.common.init_logging();
        let config = self.common.load_config()?;
        let manager = self.common.manager(&config)?;
        let marker = config.evaluation.marker;

        let mut splits = Vec::with_capacity(self.words.len());
        for word in &self.words {
            let result = manager.split(&self.method, word)?;
            if !self.json {
                println!("{}", self.render(word, &result, marker));
            }
            splits.push(WordSplit { word, result });
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&splits)?);
        }
        Ok(())
    }

    fn render(&self, word: &str, result: &SplitResult, marker: char) -> String {
        if !self.all {
            return format!("{word}\t{}", result.best_joined(word, marker));
        }

        let mut lines = vec![word.to_string()];
        for candidate in &result.candidates {
            lines.push(format!("  {:.3}\t{}", candidate.score, candidate.joined(marker)));
        }
        lines.join("\n")
    }
}
