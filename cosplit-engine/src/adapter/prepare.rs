//! Idempotent resource preparation shared by the adapters

use crate::descriptor::PrepareSpec;
use crate::error::{EngineError, Result};
use std::path::Path;
use std::process::Command;

/// Run `spec` in `dir` unless its marker path already exists
pub fn run_prepare(method: &str, dir: &Path, spec: &PrepareSpec) -> Result<()> {
    let marker = dir.join(&spec.creates);
    if marker.exists() {
        tracing::debug!(method, path = %marker.display(), "already prepared");
        return Ok(());
    }

    let (program, args) = spec.command.split_first().ok_or_else(|| EngineError::Prepare {
        method: method.to_string(),
        reason: "empty prepare command".to_string(),
    })?;

    tracing::info!(method, program = %program, "preparing engine resources");
    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .status()
        .map_err(|e| EngineError::Prepare {
            method: method.to_string(),
            reason: format!("failed to run {program}: {e}"),
        })?;

    if !status.success() {
        return Err(EngineError::Prepare {
            method: method.to_string(),
            reason: format!("{program} exited with {status}"),
        });
    }

    if !marker.exists() {
        return Err(EngineError::Prepare {
            method: method.to_string(),
            reason: format!("{} was not created", spec.creates.display()),
        });
    }

    Ok(())
}
