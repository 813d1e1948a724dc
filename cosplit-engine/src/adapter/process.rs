//! Command-per-word adapter

use super::prepare::run_prepare;
use super::SplitEngine;
use crate::candidate::{Candidate, SplitResult};
use crate::descriptor::ProcessSpec;
use crate::error::{EngineError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const WORD_PLACEHOLDER: &str = "{word}";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Wait for `child`, killing it once `timeout` has passed
///
/// Returns `None` when the child had to be killed.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "child exited before kill");
            }
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Runs the configured command once for every word
///
/// Each non-empty output line is one candidate, best first; the candidate
/// at rank `r` scores `1 / (r + 1)`.
#[derive(Debug)]
pub struct ProcessEngine {
    method: String,
    dir: PathBuf,
    spec: ProcessSpec,
}

impl ProcessEngine {
    /// Create the adapter
    pub fn new(method: &str, dir: &Path, spec: ProcessSpec) -> Self {
        Self {
            method: method.to_string(),
            dir: dir.to_path_buf(),
            spec,
        }
    }

    fn command(&self, word: &str) -> Command {
        let mut cmd = Command::new(&self.spec.command);
        let mut substituted = false;
        for arg in &self.spec.args {
            if arg.contains(WORD_PLACEHOLDER) {
                substituted = true;
                cmd.arg(arg.replace(WORD_PLACEHOLDER, word));
            } else {
                cmd.arg(arg);
            }
        }
        if !substituted {
            cmd.arg(word);
        }
        cmd.current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Turn command output into candidates
    pub fn parse_output(&self, output: &str) -> Result<SplitResult> {
        let mut candidates = Vec::new();
        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let field = match self.spec.column {
                Some(column) => line.split('\t').nth(column).ok_or_else(|| {
                    EngineError::call(
                        &self.method,
                        format!("output line has no column {column}: {line:?}"),
                    )
                })?,
                None => line,
            };

            let parts: Vec<String> = field
                .split_whitespace()
                .map(|part| {
                    if self.spec.lowercase {
                        part.to_lowercase()
                    } else {
                        part.to_string()
                    }
                })
                .collect();
            if parts.is_empty() {
                continue;
            }

            let rank = candidates.len();
            candidates.push(Candidate {
                parts,
                score: 1.0 / (rank as f64 + 1.0),
            });
        }
        Ok(SplitResult::new(candidates))
    }
}

impl SplitEngine for ProcessEngine {
    fn start(&self) -> Result<()> {
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn split(&self, word: &str) -> Result<SplitResult> {
        self.split_with_timeout(word, None)
    }

    fn split_with_timeout(&self, word: &str, timeout: Option<Duration>) -> Result<SplitResult> {
        let command = &self.spec.command;
        let mut child = self.command(word).spawn().map_err(|e| {
            EngineError::call(&self.method, format!("failed to run {command}: {e}"))
        })?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_with_deadline(&mut child, timeout).map_err(|e| {
            EngineError::call(&self.method, format!("failed to wait for {command}: {e}"))
        })?;
        let Some(status) = status else {
            // leave the pipe readers behind, a grandchild may still hold the pipes
            return Err(EngineError::call(
                &self.method,
                format!("{command} killed after {:?}", timeout.unwrap_or_default()),
            ));
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(EngineError::call(
                &self.method,
                format!("{command} exited with {status}: {}", stderr.trim()),
            ));
        }

        self.parse_output(&String::from_utf8_lossy(&stdout))
    }

    fn prepare(&self) -> Result<()> {
        match &self.spec.prepare {
            Some(spec) => run_prepare(&self.method, &self.dir, spec),
            None => Ok(()),
        }
    }
}
