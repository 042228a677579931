// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered prompt construction.
//!
//! The agent prompt is base + issue context + project extras, in that order.
//! When the structured methodology is enabled, a separate system-prompt file
//! is written to a per-project scratch directory and the methodology
//! plugin's skill/rule directories are symlinked into the workspace — never
//! the plugin root itself, because the workspace's `.claude/settings.json`
//! is written by the post-launch hook and must not leak into the plugin
//! source.

use ao_config::PrpGates;
use ao_core::SessionId;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from prompt/workspace preparation.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt io: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed role-establishing block at the top of every agent prompt.
pub const BASE_PROMPT: &str = "\
You are an autonomous coding agent assigned to a single tracker issue.
Work only on this issue, in this workspace, on the branch you were given.
Investigate before you change anything, keep commits focused, open a pull
request when the change is ready, and address review feedback yourself.
";

/// Compose the agent prompt: base, then issue context, then project extras.
pub fn compose_prompt(issue_context: &str, extras: &[String]) -> String {
    let mut prompt = String::from(BASE_PROMPT);
    if !issue_context.is_empty() {
        prompt.push('\n');
        prompt.push_str(issue_context);
    }
    for extra in extras {
        prompt.push('\n');
        prompt.push_str(extra);
        if !extra.ends_with('\n') {
            prompt.push('\n');
        }
    }
    prompt
}

/// Compose the methodology system prompt: the fixed lifecycle block, the
/// command sequence, and the gate sections the project configured.
pub fn compose_system_prompt(gates: &PrpGates) -> String {
    let mut prompt = String::from(
        "\
# Working method

You follow a five-step lifecycle. Do not skip or reorder steps:

1. **Investigate** — read the issue, explore the codebase, record findings.
2. **Plan** — write an implementation plan before touching code.
3. **Implement** — make the change, validating autonomously (build, test,
   lint) in a loop until everything passes.
4. **Pull request** — open a PR describing the change.
5. **Self-review** — review your own diff and address what you find.

Run the step commands in this order:

1. `/prp:investigate`
2. `/prp:plan`
3. `/prp:implement`
4. `/prp:pr`
5. `/prp:review`
",
    );
    if gates.plan {
        prompt.push_str(
            "\n## Plan gate\n\nAfter the plan is written, STOP. Do not start implementing. \
             A human reviews the plan on the issue and replies with an approval \
             comment; you will receive a message when you may continue.\n",
        );
    }
    if gates.pr {
        prompt.push_str(
            "\n## PR gate\n\nAfter opening the pull request, STOP and wait for human \
             review before making further changes.\n",
        );
    }
    prompt
}

/// Write the system prompt under the per-project scratch directory, named by
/// session id.
pub fn write_system_prompt_file(
    prompts_dir: &Path,
    project: &str,
    session_id: &SessionId,
    content: &str,
) -> Result<PathBuf, PromptError> {
    let dir = prompts_dir.join(project);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.md", session_id));
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Symlink the methodology plugin's skill and rule directories into the
/// workspace's `.claude/` directory, replacing whatever is there.
pub fn link_methodology(plugin_root: &Path, workspace: &Path) -> Result<(), PromptError> {
    let claude_dir = workspace.join(".claude");
    std::fs::create_dir_all(&claude_dir)?;
    for subdir in ["skills", "rules"] {
        let source = plugin_root.join(subdir);
        if !source.is_dir() {
            continue;
        }
        let target = claude_dir.join(subdir);
        replace_with_symlink(&source, &target)?;
    }
    Ok(())
}

/// Symlink an extra configured directory into the workspace root under its
/// own name.
pub fn link_extra(source: &Path, workspace: &Path) -> Result<(), PromptError> {
    let Some(name) = source.file_name() else {
        return Ok(());
    };
    replace_with_symlink(source, &workspace.join(name))
}

/// Replace `target` with a symlink to `source`. Removes an existing link or
/// directory at the target path; never touches anything through the link.
fn replace_with_symlink(source: &Path, target: &Path) -> Result<(), PromptError> {
    match std::fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(target)?,
        Ok(_) => std::fs::remove_file(target)?,
        Err(_) => {}
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(source, target)?;
    #[cfg(not(unix))]
    {
        let _ = source;
        let _ = target;
    }
    Ok(())
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
