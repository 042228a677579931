// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent adapter: how a coding agent is launched, observed, and addressed.
//!
//! The agent owns its launch argv, the heuristics that classify its terminal
//! output, and the in-workspace post-tool hook that writes detected facts
//! (branch created, PR url, methodology artifacts) back into the session's
//! own metadata file.

use crate::runtime::{tmux_pane_pid, RuntimeAdapter};
use crate::subprocess::{run_with_timeout, PROBE_TIMEOUT};
use ao_core::{Activity, RuntimeHandle, SessionId};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Errors from agent adapter operations.
#[derive(Debug, Error)]
pub enum AgentAdapterError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("workspace setup failed: {0}")]
    SetupFailed(String),
}

/// Parameters for building an agent launch command.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    /// Initial prompt, passed as the final positional argument.
    pub prompt: String,
    /// Methodology system-prompt file, referenced by path.
    pub system_prompt_file: Option<std::path::PathBuf>,
    pub model: Option<String>,
    pub skip_permissions: bool,
    /// Resume the agent's previous conversation instead of starting fresh.
    pub resume: bool,
}

/// Adapter for one kind of coding agent.
#[async_trait]
pub trait AgentAdapter: Send + Sync + 'static {
    /// Argv for launching the agent. The runtime executes it verbatim.
    fn build_launch_command(&self, spec: &LaunchSpec) -> Vec<String>;

    /// Classify the agent's state from a terminal tail.
    fn detect_activity(&self, terminal_tail: &str) -> Activity;

    /// Whether the agent process itself (not just the session) is running.
    async fn is_process_running(&self, handle: &RuntimeHandle) -> bool;

    /// Install the in-workspace post-tool hook that appends detected facts
    /// to this session's metadata file.
    async fn post_launch_setup(
        &self,
        workspace: &Path,
        session_id: &SessionId,
        metadata_path: &Path,
    ) -> Result<(), AgentAdapterError>;

    /// Deliver a message to the agent. The agent owns the transport; the
    /// default pastes into the runtime session.
    async fn deliver(
        &self,
        runtime: &dyn RuntimeAdapter,
        handle: &RuntimeHandle,
        message: &str,
    ) -> Result<(), AgentAdapterError> {
        runtime
            .send(handle, message)
            .await
            .map_err(|e| AgentAdapterError::SendFailed(e.to_string()))
    }

    /// Upper bound for one message delivery.
    fn send_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}

/// The Claude Code CLI agent.
#[derive(Debug)]
pub struct ClaudeAgent {
    process_name: String,
}

impl ClaudeAgent {
    pub fn new() -> Self {
        Self { process_name: "claude".to_string() }
    }
}

impl Default for ClaudeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentAdapter for ClaudeAgent {
    fn build_launch_command(&self, spec: &LaunchSpec) -> Vec<String> {
        let mut argv = vec![self.process_name.clone()];
        if spec.resume {
            argv.push("--continue".to_string());
        }
        if let Some(model) = &spec.model {
            argv.push("--model".to_string());
            argv.push(model.clone());
        }
        if spec.skip_permissions {
            argv.push("--dangerously-skip-permissions".to_string());
        }
        if let Some(file) = &spec.system_prompt_file {
            argv.push("--append-system-prompt-file".to_string());
            argv.push(file.display().to_string());
        }
        if !spec.prompt.is_empty() {
            argv.push(spec.prompt.clone());
        }
        argv
    }

    fn detect_activity(&self, terminal_tail: &str) -> Activity {
        let tail = terminal_tail.trim_end();
        if tail.is_empty() {
            return Activity::Ready;
        }
        // Order matters: an interrupt hint means the agent is mid-task even
        // when a prompt box is also visible below it.
        if tail.contains("esc to interrupt") || tail.contains("ctrl+c to interrupt") {
            return Activity::Active;
        }
        if tail.contains("usage limit") || tail.contains("rate limit") {
            return Activity::Blocked;
        }
        let lower = tail.to_lowercase();
        if lower.contains("do you want")
            || lower.contains("waiting for your input")
            || lower.contains("❯ 1.")
            || lower.contains("(y/n)")
        {
            return Activity::WaitingInput;
        }
        Activity::Idle
    }

    async fn is_process_running(&self, handle: &RuntimeHandle) -> bool {
        let Some(pane_pid) = tmux_pane_pid(handle).await else {
            return false;
        };
        let mut cmd = Command::new("pgrep");
        cmd.args(["-P", &pane_pid.to_string(), "-f", &self.process_name]);
        match run_with_timeout(cmd, PROBE_TIMEOUT, "pgrep").await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }

    async fn post_launch_setup(
        &self,
        workspace: &Path,
        session_id: &SessionId,
        metadata_path: &Path,
    ) -> Result<(), AgentAdapterError> {
        install_metadata_hook(workspace, session_id, metadata_path)
            .await
            .map_err(|e| AgentAdapterError::SetupFailed(e.to_string()))
    }
}

/// Shell hook installed into each workspace. It mirrors the metadata
/// store's rename discipline so the orchestrator and the hook can write the
/// same file concurrently.
const HOOK_SCRIPT: &str = r#"#!/bin/sh
# Post-tool hook: records facts observed from tool use into this session's
# metadata file. Installed by the orchestrator at spawn time.
META="__META_PATH__"
[ -f "$META" ] || exit 0

set_key() {
  key="$1"; value="$2"
  tmp="${META}.hook.$$"
  { grep -v "^${key}=" "$META" 2>/dev/null; printf '%s=%s\n' "$key" "$value"; } > "$tmp" \
    && mv "$tmp" "$META"
}

get_key() {
  sed -n "s/^$1=//p" "$META" | tail -n 1
}

payload=$(cat)
cmd=$(printf '%s' "$payload" | sed -n 's/.*"command"[[:space:]]*:[[:space:]]*"\([^"]*\)".*/\1/p' | head -n 1)

case "$cmd" in
  *"gh pr create"*)
    url=$(printf '%s' "$payload" | grep -Eo 'https://[^"\\ ]*/pull/[0-9]+' | head -n 1)
    if [ -n "$url" ]; then
      set_key pr "$url"
    fi
    ;;
  *"git checkout -b"*)
    branch=$(printf '%s' "$cmd" | sed -n 's/.*checkout -b \([^ ]*\).*/\1/p')
    if [ -n "$branch" ]; then
      set_key branch "$branch"
    fi
    ;;
  *"gh pr merge"*)
    set_key status merged
    ;;
esac

# Methodology artifacts advance the phase; never regress past the gate.
phase=$(get_key prpPhase)
case "$phase" in
  plan_gate|implementing) exit 0 ;;
esac
if ls .claude/PRPs/plans/*.plan.md >/dev/null 2>&1; then
  [ "$phase" = planning_complete ] || set_key prpPhase planning_complete
elif [ -d .claude/PRPs/plans ]; then
  [ "$phase" = planning ] || set_key prpPhase planning
elif [ -d .claude/PRPs/research ]; then
  [ "$phase" = investigating ] || set_key prpPhase investigating
fi
exit 0
"#;

async fn install_metadata_hook(
    workspace: &Path,
    session_id: &SessionId,
    metadata_path: &Path,
) -> Result<(), std::io::Error> {
    let claude_dir = workspace.join(".claude");
    let hooks_dir = claude_dir.join("hooks");
    tokio::fs::create_dir_all(&hooks_dir).await?;

    let script = HOOK_SCRIPT.replace("__META_PATH__", &metadata_path.display().to_string());
    let script_path = hooks_dir.join("ao-metadata-hook.sh");
    tokio::fs::write(&script_path, script).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o755);
        tokio::fs::set_permissions(&script_path, perms).await?;
    }

    // Merge the hook into the workspace settings without clobbering keys an
    // agent or template may already have written.
    let settings_path = claude_dir.join("settings.json");
    let mut settings: serde_json::Value = match tokio::fs::read_to_string(&settings_path).await {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|_| serde_json::json!({})),
        Err(_) => serde_json::json!({}),
    };
    if !settings.is_object() {
        settings = serde_json::json!({});
    }
    if !settings.get("hooks").map(serde_json::Value::is_object).unwrap_or(false) {
        settings["hooks"] = serde_json::json!({});
    }
    let hook_entry = serde_json::json!([{
        "matcher": "Bash",
        "hooks": [{
            "type": "command",
            "command": ".claude/hooks/ao-metadata-hook.sh"
        }]
    }]);
    settings["hooks"]["PostToolUse"] = hook_entry;

    let tmp = claude_dir.join(".settings.json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(&settings).unwrap_or_default()).await?;
    tokio::fs::rename(&tmp, &settings_path).await?;

    tracing::debug!(
        session = %session_id,
        workspace = %workspace.display(),
        "installed post-tool metadata hook"
    );
    Ok(())
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
