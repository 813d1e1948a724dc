//! JSON output formatter

use super::OutputFormatter;
use anyhow::Result;
use cosplit_engine::{MethodDescriptor, MethodStats};
use serde_json::Value;
use std::io::Write;

/// JSON formatter - collects records and writes one array
pub struct JsonFormatter<W: Write> {
    writer: W,
    records: Vec<Value>,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records: Vec::new(),
        }
    }
}

impl<W: Write + Send + Sync> OutputFormatter for JsonFormatter<W> {
    fn format_method(&mut self, method: &MethodDescriptor) -> Result<()> {
        self.records.push(serde_json::to_value(method)?);
        Ok(())
    }

    fn format_stats(&mut self, stats: &MethodStats) -> Result<()> {
        self.records.push(serde_json::to_value(stats)?);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, &self.records)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
