// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded subprocess execution.
//!
//! Every external call the orchestrator makes goes through
//! [`run_with_timeout`]: argv-based, never shell-interpolated, and killed on
//! timeout so a frozen CLI cannot hang more than one probe.

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Timeout for liveness/state probes (tmux, gh).
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for git worktree add/remove.
pub const WORKTREE_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from subprocess execution.
#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{label} failed to spawn: {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{label} timed out after {seconds}s")]
    TimedOut { label: String, seconds: u64 },
}

/// Run a command to completion, killing it if the timeout elapses.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    label: &str,
) -> Result<Output, SubprocessError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(SubprocessError::Spawn { label: label.to_string(), source }),
        Err(_) => {
            tracing::warn!(label, seconds = timeout.as_secs(), "subprocess timed out");
            Err(SubprocessError::TimedOut { label: label.to_string(), seconds: timeout.as_secs() })
        }
    }
}

/// Run a command and return trimmed stdout, treating a non-zero exit as an
/// error carrying stderr.
pub async fn run_capture(
    cmd: Command,
    timeout: Duration,
    label: &str,
) -> Result<String, String> {
    let output = run_with_timeout(cmd, timeout, label)
        .await
        .map_err(|e| e.to_string())?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} failed: {}", label, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
