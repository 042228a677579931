// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker adapter: the issue system sessions work against.
//!
//! The stock implementation drives the `gh` CLI with argv invocation and
//! JSON output. Issue ids may be raw numbers or full URLs; the trailing
//! digit run identifies the issue either way.

use crate::subprocess::{run_with_timeout, PROBE_TIMEOUT};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

/// Errors from tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("issue not found: {0}")]
    NotFound(String),

    #[error("tracker call failed: {0}")]
    CallFailed(String),

    #[error("tracker response unparsable: {0}")]
    BadResponse(String),
}

/// Project context a tracker needs to resolve issues.
#[derive(Debug, Clone)]
pub struct TrackerContext {
    /// Provider-side repo identity, e.g. `org/app`.
    pub repo: Option<String>,
    /// Local checkout, used when no repo identity is configured.
    pub path: PathBuf,
}

/// An issue as the orchestrator sees it.
#[derive(Debug, Clone, Default)]
pub struct Issue {
    pub id: String,
    pub number: Option<u64>,
    pub title: String,
    pub body: String,
    pub state: String,
    pub labels: Vec<String>,
    pub url: String,
}

/// Fields to push back to the tracker.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub comment: Option<String>,
    pub status: Option<String>,
}

impl IssueUpdate {
    pub fn comment(text: impl Into<String>) -> Self {
        Self { comment: Some(text.into()), status: None }
    }
}

/// Adapter for one issue tracker.
#[async_trait]
pub trait TrackerAdapter: Send + Sync + 'static {
    async fn get_issue(&self, id: &str, ctx: &TrackerContext) -> Result<Issue, TrackerError>;

    async fn is_completed(&self, id: &str, ctx: &TrackerContext) -> Result<bool, TrackerError>;

    fn issue_url(&self, id: &str, ctx: &TrackerContext) -> String;

    /// Tracker-derived branch name, if the tracker has a convention.
    fn branch_name(&self, id: &str, ctx: &TrackerContext) -> Option<String>;

    /// Issue context block for the agent prompt.
    async fn generate_prompt(&self, id: &str, ctx: &TrackerContext)
        -> Result<String, TrackerError>;

    async fn update_issue(
        &self,
        id: &str,
        update: IssueUpdate,
        ctx: &TrackerContext,
    ) -> Result<(), TrackerError>;
}

/// Extract the issue number from a raw id or URL: the last digit run.
pub fn issue_number(id: &str) -> Option<u64> {
    id.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .next_back()
        .and_then(|run| run.parse().ok())
}

/// GitHub issues via the `gh` CLI.
#[derive(Debug, Default)]
pub struct GithubTracker;

impl GithubTracker {
    pub fn new() -> Self {
        Self
    }

    fn gh(&self, ctx: &TrackerContext) -> Command {
        let mut cmd = Command::new("gh");
        cmd.current_dir(&ctx.path);
        cmd
    }

    fn repo_args(cmd: &mut Command, ctx: &TrackerContext) {
        if let Some(repo) = &ctx.repo {
            cmd.args(["--repo", repo]);
        }
    }
}

#[async_trait]
impl TrackerAdapter for GithubTracker {
    async fn get_issue(&self, id: &str, ctx: &TrackerContext) -> Result<Issue, TrackerError> {
        let number = issue_number(id).ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        let mut cmd = self.gh(ctx);
        cmd.args(["issue", "view", &number.to_string()]);
        Self::repo_args(&mut cmd, ctx);
        cmd.args(["--json", "number,title,body,state,labels,url"]);

        let output = run_with_timeout(cmd, PROBE_TIMEOUT, "gh issue view")
            .await
            .map_err(|e| TrackerError::CallFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrackerError::NotFound(format!("{}: {}", id, stderr.trim())));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| TrackerError::BadResponse(e.to_string()))?;
        Ok(Issue {
            id: id.to_string(),
            number: json.get("number").and_then(|v| v.as_u64()),
            title: json.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            body: json.get("body").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            state: json
                .get("state")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_lowercase(),
            labels: json
                .get("labels")
                .and_then(|v| v.as_array())
                .map(|labels| {
                    labels
                        .iter()
                        .filter_map(|l| l.get("name").and_then(|n| n.as_str()))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            url: json.get("url").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        })
    }

    async fn is_completed(&self, id: &str, ctx: &TrackerContext) -> Result<bool, TrackerError> {
        let issue = self.get_issue(id, ctx).await?;
        Ok(issue.state == "closed")
    }

    fn issue_url(&self, id: &str, ctx: &TrackerContext) -> String {
        if id.starts_with("http://") || id.starts_with("https://") {
            return id.to_string();
        }
        match (&ctx.repo, issue_number(id)) {
            (Some(repo), Some(number)) => {
                format!("https://github.com/{}/issues/{}", repo, number)
            }
            _ => id.to_string(),
        }
    }

    fn branch_name(&self, id: &str, _ctx: &TrackerContext) -> Option<String> {
        issue_number(id).map(|n| format!("issue-{}", n))
    }

    async fn generate_prompt(
        &self,
        id: &str,
        ctx: &TrackerContext,
    ) -> Result<String, TrackerError> {
        let issue = self.get_issue(id, ctx).await?;
        let mut prompt = format!("## Issue: {}\n\n{}\n", issue.title, issue.url);
        if !issue.labels.is_empty() {
            prompt.push_str(&format!("\nLabels: {}\n", issue.labels.join(", ")));
        }
        if !issue.body.is_empty() {
            prompt.push_str(&format!("\n{}\n", issue.body));
        }
        Ok(prompt)
    }

    async fn update_issue(
        &self,
        id: &str,
        update: IssueUpdate,
        ctx: &TrackerContext,
    ) -> Result<(), TrackerError> {
        let number = issue_number(id).ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        if let Some(comment) = update.comment {
            let mut cmd = self.gh(ctx);
            cmd.args(["issue", "comment", &number.to_string()]);
            Self::repo_args(&mut cmd, ctx);
            cmd.args(["--body", &comment]);
            let output = run_with_timeout(cmd, PROBE_TIMEOUT, "gh issue comment")
                .await
                .map_err(|e| TrackerError::CallFailed(e.to_string()))?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(TrackerError::CallFailed(stderr.trim().to_string()));
            }
        }
        if let Some(status) = update.status {
            let subcommand = match status.as_str() {
                "closed" => "close",
                "open" => "reopen",
                other => {
                    return Err(TrackerError::CallFailed(format!(
                        "unsupported issue status: {}",
                        other
                    )))
                }
            };
            let mut cmd = self.gh(ctx);
            cmd.args(["issue", subcommand, &number.to_string()]);
            Self::repo_args(&mut cmd, ctx);
            let output = run_with_timeout(cmd, PROBE_TIMEOUT, "gh issue state")
                .await
                .map_err(|e| TrackerError::CallFailed(e.to_string()))?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(TrackerError::CallFailed(stderr.trim().to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
