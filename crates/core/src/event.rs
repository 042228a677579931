// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classification of status transitions into orchestrator events.
//!
//! Every status transition maps to at most one [`EventType`]; event types
//! carry the reaction key that may be configured for them and a default
//! notification priority used when no reaction is configured.

use crate::status::SessionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification priority band, routed per `notificationRouting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    Action,
    Warning,
    Info,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::Action => "action",
            Priority::Warning => "warning",
            Priority::Info => "info",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "urgent" => Priority::Urgent,
            "action" => Priority::Action,
            "warning" => Priority::Warning,
            "info" => Priority::Info,
            _ => return None,
        })
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Orchestrator event derived from a status transition or engine action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    PrCreated,
    CiFailing,
    ReviewPending,
    ReviewChangesRequested,
    ReviewApproved,
    MergeReady,
    MergeCompleted,
    SessionNeedsInput,
    SessionStuck,
    SessionErrored,
    SessionKilled,
    ReactionTriggered,
    ReactionEscalated,
    PrpPlanGate,
    SessionAllComplete,
}

impl EventType {
    /// Classify a transition by the status it lands on.
    pub fn for_transition(to: SessionStatus) -> Option<Self> {
        Some(match to {
            SessionStatus::PrOpen => EventType::PrCreated,
            SessionStatus::CiFailed => EventType::CiFailing,
            SessionStatus::ReviewPending => EventType::ReviewPending,
            SessionStatus::ChangesRequested => EventType::ReviewChangesRequested,
            SessionStatus::Approved => EventType::ReviewApproved,
            SessionStatus::Mergeable => EventType::MergeReady,
            SessionStatus::Merged => EventType::MergeCompleted,
            SessionStatus::NeedsInput => EventType::SessionNeedsInput,
            SessionStatus::Stuck => EventType::SessionStuck,
            SessionStatus::Errored => EventType::SessionErrored,
            SessionStatus::Killed => EventType::SessionKilled,
            _ => return None,
        })
    }

    /// The reaction key a project may configure for this event.
    pub fn reaction_key(&self) -> Option<&'static str> {
        Some(match self {
            EventType::CiFailing => "ci-failed",
            EventType::ReviewChangesRequested => "changes-requested",
            EventType::MergeReady => "approved-and-green",
            EventType::SessionNeedsInput => "agent-needs-input",
            EventType::SessionStuck => "agent-stuck",
            EventType::SessionKilled => "agent-exited",
            EventType::SessionAllComplete => "all-complete",
            _ => return None,
        })
    }

    /// Default notification priority when no reaction handles the event.
    pub fn priority(&self) -> Priority {
        match self {
            EventType::SessionStuck | EventType::SessionErrored | EventType::ReactionEscalated => {
                Priority::Urgent
            }
            EventType::SessionNeedsInput
            | EventType::MergeReady
            | EventType::PrpPlanGate
            | EventType::SessionAllComplete => Priority::Action,
            EventType::CiFailing
            | EventType::ReviewChangesRequested
            | EventType::SessionKilled
            | EventType::ReactionTriggered => Priority::Warning,
            EventType::PrCreated
            | EventType::ReviewPending
            | EventType::ReviewApproved
            | EventType::MergeCompleted => Priority::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PrCreated => "pr.created",
            EventType::CiFailing => "ci.failing",
            EventType::ReviewPending => "review.pending",
            EventType::ReviewChangesRequested => "review.changes_requested",
            EventType::ReviewApproved => "review.approved",
            EventType::MergeReady => "merge.ready",
            EventType::MergeCompleted => "merge.completed",
            EventType::SessionNeedsInput => "session.needs_input",
            EventType::SessionStuck => "session.stuck",
            EventType::SessionErrored => "session.errored",
            EventType::SessionKilled => "session.killed",
            EventType::ReactionTriggered => "reaction.triggered",
            EventType::ReactionEscalated => "reaction.escalated",
            EventType::PrpPlanGate => "prp.plan_gate",
            EventType::SessionAllComplete => "session.all_complete",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
