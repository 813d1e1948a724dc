//! Plain text output formatter

use super::{metric, OutputFormatter};
use anyhow::Result;
use cosplit_engine::{MethodDescriptor, MethodStats};
use std::io::Write;

/// Plain text formatter
pub struct TextFormatter<W: Write> {
    writer: W,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send + Sync> OutputFormatter for TextFormatter<W> {
    fn format_method(&mut self, method: &MethodDescriptor) -> Result<()> {
        writeln!(
            self.writer,
            "{:<24} {:<32} {}",
            method.name,
            method.display_name,
            method.protocol().as_str()
        )?;
        Ok(())
    }

    fn format_stats(&mut self, stats: &MethodStats) -> Result<()> {
        writeln!(self.writer, "{}", stats.method)?;
        writeln!(self.writer, "  precision  {}", metric(stats.precision))?;
        writeln!(self.writer, "  recall     {}", metric(stats.recall))?;
        writeln!(self.writer, "  accuracy   {}", metric(stats.accuracy))?;
        writeln!(
            self.writer,
            "  evaluated  {} of {} (skipped {}, failed {})",
            stats.evaluated, stats.total, stats.skipped, stats.failed
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
