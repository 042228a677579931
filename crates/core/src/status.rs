// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session status DAG.
//!
//! Statuses advance monotonically through the lifecycle; the only permitted
//! back-transitions are `needs_input`/`stuck` returning to `working` once the
//! agent shows activity again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Spawning,
    Working,
    NeedsInput,
    Stuck,
    PrOpen,
    CiFailed,
    ReviewPending,
    ChangesRequested,
    Approved,
    Mergeable,
    Merged,
    Errored,
    Killed,
    Terminated,
    Done,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Spawning => "spawning",
            SessionStatus::Working => "working",
            SessionStatus::NeedsInput => "needs_input",
            SessionStatus::Stuck => "stuck",
            SessionStatus::PrOpen => "pr_open",
            SessionStatus::CiFailed => "ci_failed",
            SessionStatus::ReviewPending => "review_pending",
            SessionStatus::ChangesRequested => "changes_requested",
            SessionStatus::Approved => "approved",
            SessionStatus::Mergeable => "mergeable",
            SessionStatus::Merged => "merged",
            SessionStatus::Errored => "errored",
            SessionStatus::Killed => "killed",
            SessionStatus::Terminated => "terminated",
            SessionStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "spawning" => SessionStatus::Spawning,
            "working" => SessionStatus::Working,
            "needs_input" => SessionStatus::NeedsInput,
            "stuck" => SessionStatus::Stuck,
            "pr_open" => SessionStatus::PrOpen,
            "ci_failed" => SessionStatus::CiFailed,
            "review_pending" => SessionStatus::ReviewPending,
            "changes_requested" => SessionStatus::ChangesRequested,
            "approved" => SessionStatus::Approved,
            "mergeable" => SessionStatus::Mergeable,
            "merged" => SessionStatus::Merged,
            "errored" => SessionStatus::Errored,
            "killed" => SessionStatus::Killed,
            "terminated" => SessionStatus::Terminated,
            "done" => SessionStatus::Done,
            _ => return None,
        })
    }

    /// Terminal statuses never leave their state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Merged
                | SessionStatus::Killed
                | SessionStatus::Terminated
                | SessionStatus::Errored
                | SessionStatus::Done
        )
    }

    /// Statuses from which a session may return to `working`.
    pub fn can_reenter_working(&self) -> bool {
        matches!(self, SessionStatus::NeedsInput | SessionStatus::Stuck)
    }

    /// Position in the lifecycle DAG, used to pick the further-along of two
    /// observations of the same session (in-memory vs persisted).
    pub fn rank(&self) -> u8 {
        match self {
            SessionStatus::Spawning => 0,
            SessionStatus::Working => 10,
            SessionStatus::NeedsInput => 20,
            SessionStatus::Stuck => 21,
            SessionStatus::PrOpen => 30,
            SessionStatus::CiFailed => 40,
            SessionStatus::ReviewPending => 41,
            SessionStatus::ChangesRequested => 42,
            SessionStatus::Approved => 43,
            SessionStatus::Mergeable => 50,
            SessionStatus::Merged => 60,
            SessionStatus::Errored => 61,
            SessionStatus::Killed => 62,
            SessionStatus::Terminated => 63,
            SessionStatus::Done => 64,
        }
    }

    /// The further-along of two observations.
    pub fn max_by_rank(a: Self, b: Self) -> Self {
        if b.rank() > a.rank() {
            b
        } else {
            a
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
