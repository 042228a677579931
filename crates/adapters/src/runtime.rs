// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime adapter: where agent processes live.
//!
//! A runtime owns process execution and returns an opaque handle. The stock
//! implementation keeps each agent in a detached tmux session so humans can
//! attach to a misbehaving agent with `tmux attach -t <handle>`.

use crate::subprocess::{run_with_timeout, PROBE_TIMEOUT};
use ao_core::RuntimeHandle;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

/// Errors from runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("start failed: {0}")]
    StartFailed(String),

    #[error("session not found: {0}")]
    NotFound(RuntimeHandle),

    #[error("runtime io: {0}")]
    Io(String),
}

/// Parameters for starting an agent process.
#[derive(Debug, Clone)]
pub struct StartSpec {
    /// Requested handle name; the runtime may reject a taken name but must
    /// not silently substitute another.
    pub handle_hint: String,
    /// Argv of the agent command; never shell-interpolated by the caller.
    pub argv: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

/// Adapter owning agent process execution.
#[async_trait]
pub trait RuntimeAdapter: Send + Sync + 'static {
    /// Start a process, returning the opaque handle that names it.
    async fn start(&self, spec: StartSpec) -> Result<RuntimeHandle, RuntimeError>;

    /// Whether the handle still refers to a live session.
    async fn is_alive(&self, handle: &RuntimeHandle) -> bool;

    /// Recent visible terminal output, last `lines` lines.
    async fn output(&self, handle: &RuntimeHandle, lines: u32) -> Result<String, RuntimeError>;

    /// Type text into the session.
    async fn send(&self, handle: &RuntimeHandle, text: &str) -> Result<(), RuntimeError>;

    /// Stop the session. Stopping a dead session is not an error.
    async fn stop(&self, handle: &RuntimeHandle) -> Result<(), RuntimeError>;
}

/// Tmux-backed runtime. One detached session per agent.
#[derive(Debug, Default)]
pub struct TmuxRuntime;

impl TmuxRuntime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RuntimeAdapter for TmuxRuntime {
    async fn start(&self, spec: StartSpec) -> Result<RuntimeHandle, RuntimeError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["new-session", "-d", "-s", &spec.handle_hint]);
        cmd.args(["-c", &spec.cwd.display().to_string()]);
        for (key, value) in &spec.env {
            cmd.arg("-e").arg(format!("{}={}", key, value));
        }
        // tmux runs the remaining argv words as the session's command.
        for word in &spec.argv {
            cmd.arg(word);
        }

        let output = run_with_timeout(cmd, PROBE_TIMEOUT, "tmux new-session")
            .await
            .map_err(|e| RuntimeError::StartFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RuntimeError::StartFailed(stderr.trim().to_string()));
        }
        Ok(RuntimeHandle::new(spec.handle_hint))
    }

    async fn is_alive(&self, handle: &RuntimeHandle) -> bool {
        let mut cmd = Command::new("tmux");
        cmd.args(["has-session", "-t", handle.as_str()]);
        match run_with_timeout(cmd, PROBE_TIMEOUT, "tmux has-session").await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    async fn output(&self, handle: &RuntimeHandle, lines: u32) -> Result<String, RuntimeError> {
        let start = format!("-{}", lines);
        let mut cmd = Command::new("tmux");
        cmd.args(["capture-pane", "-t", handle.as_str(), "-p", "-S", &start]);
        let output = run_with_timeout(cmd, PROBE_TIMEOUT, "tmux capture-pane")
            .await
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
        if !output.status.success() {
            return Err(RuntimeError::NotFound(handle.clone()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn send(&self, handle: &RuntimeHandle, text: &str) -> Result<(), RuntimeError> {
        // Literal text first, Enter as a separate key so tmux never
        // interprets the message body.
        let mut cmd = Command::new("tmux");
        cmd.args(["send-keys", "-t", handle.as_str(), "-l", text]);
        let output = run_with_timeout(cmd, PROBE_TIMEOUT, "tmux send-keys")
            .await
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
        if !output.status.success() {
            return Err(RuntimeError::NotFound(handle.clone()));
        }

        let mut enter = Command::new("tmux");
        enter.args(["send-keys", "-t", handle.as_str(), "Enter"]);
        let output = run_with_timeout(enter, PROBE_TIMEOUT, "tmux send-keys Enter")
            .await
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
        if !output.status.success() {
            return Err(RuntimeError::NotFound(handle.clone()));
        }
        Ok(())
    }

    async fn stop(&self, handle: &RuntimeHandle) -> Result<(), RuntimeError> {
        let mut cmd = Command::new("tmux");
        cmd.args(["kill-session", "-t", handle.as_str()]);
        // kill-session on a dead session exits non-zero; that is fine.
        let _ = run_with_timeout(cmd, PROBE_TIMEOUT, "tmux kill-session")
            .await
            .map_err(|e| RuntimeError::Io(e.to_string()))?;
        Ok(())
    }
}

/// Resolve the pane PID of a tmux session, used by agents to check whether
/// their process is still running inside the pane.
pub(crate) async fn tmux_pane_pid(handle: &RuntimeHandle) -> Option<u32> {
    let mut cmd = Command::new("tmux");
    cmd.args(["display-message", "-p", "-t", handle.as_str(), "#{pane_pid}"]);
    let output = run_with_timeout(cmd, PROBE_TIMEOUT, "tmux display-message").await.ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}
