// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SCM adapter: pull request, CI, and review state.

use crate::subprocess::{run_with_timeout, PROBE_TIMEOUT};
use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors from SCM probes.
#[derive(Debug, Error)]
pub enum ScmError {
    #[error("pr not found: {0}")]
    NotFound(String),

    #[error("scm call failed: {0}")]
    CallFailed(String),

    #[error("scm response unparsable: {0}")]
    BadResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CiSummary {
    pub failing: bool,
    pub pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Pending,
    Approved,
    ChangesRequested,
}

/// Adapter for pull-request state probing.
#[async_trait]
pub trait ScmAdapter: Send + Sync + 'static {
    async fn pr_state(&self, pr: &str) -> Result<PrState, ScmError>;

    async fn ci_summary(&self, pr: &str) -> Result<CiSummary, ScmError>;

    async fn review_decision(&self, pr: &str) -> Result<ReviewDecision, ScmError>;

    async fn mergeability(&self, pr: &str) -> Result<bool, ScmError>;
}

/// GitHub pull requests via the `gh` CLI.
#[derive(Debug, Default)]
pub struct GithubScm;

impl GithubScm {
    pub fn new() -> Self {
        Self
    }

    async fn fetch(&self, pr: &str, fields: &str) -> Result<serde_json::Value, ScmError> {
        let mut cmd = Command::new("gh");
        cmd.args(["pr", "view", pr, "--json", fields]);
        let output = run_with_timeout(cmd, PROBE_TIMEOUT, "gh pr view")
            .await
            .map_err(|e| ScmError::CallFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScmError::NotFound(format!("{}: {}", pr, stderr.trim())));
        }
        serde_json::from_slice(&output.stdout).map_err(|e| ScmError::BadResponse(e.to_string()))
    }
}

#[async_trait]
impl ScmAdapter for GithubScm {
    async fn pr_state(&self, pr: &str) -> Result<PrState, ScmError> {
        let json = self.fetch(pr, "state").await?;
        match json.get("state").and_then(|v| v.as_str()) {
            Some("OPEN") => Ok(PrState::Open),
            Some("MERGED") => Ok(PrState::Merged),
            Some("CLOSED") => Ok(PrState::Closed),
            other => Err(ScmError::BadResponse(format!("unknown pr state: {:?}", other))),
        }
    }

    async fn ci_summary(&self, pr: &str) -> Result<CiSummary, ScmError> {
        let json = self.fetch(pr, "statusCheckRollup").await?;
        Ok(summarize_checks(&json))
    }

    async fn review_decision(&self, pr: &str) -> Result<ReviewDecision, ScmError> {
        let json = self.fetch(pr, "reviewDecision").await?;
        Ok(parse_review_decision(&json))
    }

    async fn mergeability(&self, pr: &str) -> Result<bool, ScmError> {
        let json = self.fetch(pr, "mergeable").await?;
        Ok(matches!(json.get("mergeable").and_then(|v| v.as_str()), Some("MERGEABLE")))
    }
}

/// Fold a `statusCheckRollup` array into pass/fail/pending flags.
fn summarize_checks(json: &serde_json::Value) -> CiSummary {
    let mut summary = CiSummary::default();
    if let Some(checks) = json.get("statusCheckRollup").and_then(|v| v.as_array()) {
        for check in checks {
            match check.get("conclusion").and_then(|v| v.as_str()) {
                Some("FAILURE") | Some("TIMED_OUT") | Some("CANCELLED") => {
                    summary.failing = true;
                }
                Some("SUCCESS") | Some("NEUTRAL") | Some("SKIPPED") => {}
                // No conclusion yet: queued or in progress.
                _ => summary.pending = true,
            }
        }
    }
    summary
}

fn parse_review_decision(json: &serde_json::Value) -> ReviewDecision {
    match json.get("reviewDecision").and_then(|v| v.as_str()) {
        Some("APPROVED") => ReviewDecision::Approved,
        Some("CHANGES_REQUESTED") => ReviewDecision::ChangesRequested,
        _ => ReviewDecision::Pending,
    }
}

#[cfg(test)]
#[path = "scm_tests.rs"]
mod tests;
