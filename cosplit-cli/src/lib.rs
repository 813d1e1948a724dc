//! cosplit CLI library
//!
//! This library provides the command-line interface for evaluating and
//! serving compound splitters.

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;
pub mod server;

pub use error::{CliError, CliResult};
