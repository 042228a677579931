// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Normalized tracker events and agent activity classification.
//!
//! Webhook payloads from every provider are reduced to a [`TriggerEvent`]
//! before rule evaluation, so the trigger engine never sees provider JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a normalized tracker event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    #[serde(rename = "issue.opened")]
    IssueOpened,
    #[serde(rename = "issue.labeled")]
    IssueLabeled,
    #[serde(rename = "issue.assigned")]
    IssueAssigned,
    #[serde(rename = "issue.reopened")]
    IssueReopened,
    #[serde(rename = "issue.comment")]
    IssueComment,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::IssueOpened => "issue.opened",
            TriggerKind::IssueLabeled => "issue.labeled",
            TriggerKind::IssueAssigned => "issue.assigned",
            TriggerKind::IssueReopened => "issue.reopened",
            TriggerKind::IssueComment => "issue.comment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "issue.opened" => TriggerKind::IssueOpened,
            "issue.labeled" => TriggerKind::IssueLabeled,
            "issue.assigned" => TriggerKind::IssueAssigned,
            "issue.reopened" => TriggerKind::IssueReopened,
            "issue.comment" => TriggerKind::IssueComment,
            _ => return None,
        })
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue fields carried by a normalized event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub state: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub url: String,
}

/// A tracker event normalized from a provider webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub provider: String,
    pub delivery_id: String,
    pub kind: TriggerKind,
    pub action: String,
    pub issue: IssueRef,
    /// Provider-side container: repo full name for GitHub, workspace id for
    /// Plane.
    pub repo: String,
    pub label: Option<String>,
    pub assignee: Option<String>,
    pub sender: String,
    pub timestamp_ms: u64,
    pub comment_body: Option<String>,
    pub raw: serde_json::Value,
}

/// Agent activity as detected from a terminal tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Active,
    Idle,
    WaitingInput,
    Blocked,
    Ready,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Activity::Active => "active",
            Activity::Idle => "idle",
            Activity::WaitingInput => "waiting_input",
            Activity::Blocked => "blocked",
            Activity::Ready => "ready",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
