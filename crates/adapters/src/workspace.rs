// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace adapter: isolated checkouts for agents.
//!
//! The stock implementation is a git worktree off the project's default
//! branch. Destruction is best-effort throughout — a half-removed worktree
//! must never block archiving the session.

use crate::subprocess::{run_with_timeout, WORKTREE_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

/// Errors from workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace create failed: {0}")]
    CreateFailed(String),

    #[error("workspace io: {0}")]
    Io(String),
}

/// Parameters for provisioning a workspace.
#[derive(Debug, Clone)]
pub struct CreateSpec {
    /// Repository the worktree branches off.
    pub repo_root: PathBuf,
    /// Where the workspace lands.
    pub path: PathBuf,
    pub branch: String,
    /// Commit-ish the new branch starts from.
    pub start_point: String,
    /// Create the branch (`-b`); false when restoring onto an existing one.
    pub create_branch: bool,
}

/// A provisioned workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub path: PathBuf,
}

/// Adapter for provisioning and tearing down agent workspaces.
#[async_trait]
pub trait WorkspaceAdapter: Send + Sync + 'static {
    async fn create(&self, spec: CreateSpec) -> Result<Workspace, WorkspaceError>;

    /// Tear down a workspace. Inner steps are best-effort; only a failure to
    /// remove the directory itself is an error.
    async fn destroy(&self, path: &Path, branch: Option<&str>) -> Result<(), WorkspaceError>;
}

/// Git-worktree workspaces.
#[derive(Debug, Default)]
pub struct WorktreeWorkspace;

impl WorktreeWorkspace {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WorkspaceAdapter for WorktreeWorkspace {
    async fn create(&self, spec: CreateSpec) -> Result<Workspace, WorkspaceError> {
        if let Some(parent) = spec.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        }

        let path_str = spec.path.display().to_string();
        let mut cmd = Command::new("git");
        cmd.args(["-C", &spec.repo_root.display().to_string(), "worktree", "add"]);
        if spec.create_branch {
            cmd.args(["-b", &spec.branch, &path_str, &spec.start_point]);
        } else {
            cmd.args([path_str.as_str(), spec.branch.as_str()]);
        }
        cmd.env_remove("GIT_DIR").env_remove("GIT_WORK_TREE");

        let output = run_with_timeout(cmd, WORKTREE_TIMEOUT, "git worktree add")
            .await
            .map_err(|e| WorkspaceError::CreateFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkspaceError::CreateFailed(stderr.trim().to_string()));
        }
        Ok(Workspace { path: spec.path })
    }

    async fn destroy(&self, path: &Path, branch: Option<&str>) -> Result<(), WorkspaceError> {
        // Unregister the worktree first when the path is one. Run from
        // within the worktree so git can locate the parent repository.
        let dot_git = path.join(".git");
        let is_worktree = tokio::fs::symlink_metadata(&dot_git)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_worktree {
            let mut cmd = Command::new("git");
            cmd.args(["worktree", "remove", "--force"])
                .arg(path)
                .current_dir(path);
            let _ = run_with_timeout(cmd, WORKTREE_TIMEOUT, "git worktree remove").await;

            if let Some(branch) = branch {
                if let Some(repo_root) = worktree_repo_root(&dot_git).await {
                    let mut cmd = Command::new("git");
                    cmd.args(["-C", &repo_root.display().to_string(), "branch", "-D", branch])
                        .env_remove("GIT_DIR")
                        .env_remove("GIT_WORK_TREE");
                    let _ = run_with_timeout(cmd, WORKTREE_TIMEOUT, "git branch delete").await;
                }
            }
        }

        if path.exists() {
            tokio::fs::remove_dir_all(path)
                .await
                .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        }
        Ok(())
    }
}

/// Resolve a worktree's parent repository from its `.git` pointer file,
/// which contains `gitdir: <repo>/.git/worktrees/<name>`.
async fn worktree_repo_root(dot_git: &Path) -> Option<PathBuf> {
    let contents = tokio::fs::read_to_string(dot_git).await.ok()?;
    let gitdir = contents.trim().strip_prefix("gitdir: ")?;
    let gitdir = Path::new(gitdir);
    gitdir.parent()?.parent()?.parent().map(Path::to_path_buf)
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
