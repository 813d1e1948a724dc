//! Markdown output formatter

use super::{metric, OutputFormatter};
use anyhow::Result;
use cosplit_engine::{MethodDescriptor, MethodStats};
use std::io::Write;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Table {
    None,
    Methods,
    Stats,
}

/// Markdown formatter - outputs a table
pub struct MarkdownFormatter<W: Write> {
    writer: W,
    table: Table,
    rows: usize,
}

impl<W: Write> MarkdownFormatter<W> {
    /// Create a new markdown formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            table: Table::None,
            rows: 0,
        }
    }

    fn header(&mut self, table: Table) -> Result<()> {
        if self.table == table {
            return Ok(());
        }
        if self.table != Table::None {
            writeln!(self.writer)?;
        }
        match table {
            Table::Methods => {
                writeln!(self.writer, "| Method | Name | Protocol |")?;
                writeln!(self.writer, "|--------|------|----------|")?;
            }
            Table::Stats => {
                writeln!(
                    self.writer,
                    "| Method | Precision | Recall | Accuracy | Evaluated | Skipped | Failed |"
                )?;
                writeln!(
                    self.writer,
                    "|--------|-----------|--------|----------|-----------|---------|--------|"
                )?;
            }
            Table::None => {}
        }
        self.table = table;
        Ok(())
    }
}

impl<W: Write + Send + Sync> OutputFormatter for MarkdownFormatter<W> {
    fn format_method(&mut self, method: &MethodDescriptor) -> Result<()> {
        self.header(Table::Methods)?;
        self.rows += 1;
        writeln!(
            self.writer,
            "| `{}` | {} | {} |",
            method.name,
            method.display_name,
            method.protocol().as_str()
        )?;
        Ok(())
    }

    fn format_stats(&mut self, stats: &MethodStats) -> Result<()> {
        self.header(Table::Stats)?;
        self.rows += 1;
        writeln!(
            self.writer,
            "| `{}` | {} | {} | {} | {} | {} | {} |",
            stats.method,
            metric(stats.precision),
            metric(stats.recall),
            metric(stats.accuracy),
            stats.evaluated,
            stats.skipped,
            stats.failed
        )?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "---")?;
        writeln!(self.writer, "*Total rows: {}*", self.rows)?;
        self.writer.flush()?;
        Ok(())
    }
}
