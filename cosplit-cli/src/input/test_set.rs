//! Labeled test sets
//!
//! A test set is a CSV file with a `compound,expected` header, where
//! `expected` marks the boundaries of the compound:
//!
//! ```text
//! compound,expected
//! kwaliteitscontrole,kwaliteits_controle
//! tafel,tafel
//! ```

use crate::error::CliError;
use anyhow::{Context, Result};
use cosplit_engine::TestCase;
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Read test cases from CSV
pub fn read_test_set<R: Read>(reader: R) -> Result<Vec<TestCase>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut cases = Vec::new();
    for (row, record) in reader.deserialize::<TestCase>().enumerate() {
        // row 1 is the header
        let case = record.with_context(|| format!("Malformed test case on line {}", row + 2))?;
        cases.push(case);
    }
    Ok(cases)
}

/// Load one test set file
pub fn load_test_set(path: &Path) -> Result<Vec<TestCase>> {
    let file = std::fs::File::open(path)
        .map_err(|_| CliError::FileNotFound(path.display().to_string()))?;
    let cases = read_test_set(file).with_context(|| format!("Failed to read {}", path.display()))?;
    if cases.is_empty() {
        return Err(CliError::EmptyTestSet(path.display().to_string()).into());
    }
    log::info!("Loaded {} cases from {}", cases.len(), path.display());
    Ok(cases)
}

/// Load and concatenate several test set files
pub fn load_test_sets(paths: &[PathBuf]) -> Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    for path in paths {
        cases.extend(load_test_set(path)?);
    }
    Ok(cases)
}
