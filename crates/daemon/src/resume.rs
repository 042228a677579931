// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan-gate resume: approval comments un-pause gated sessions.
//!
//! `issue.comment` events bypass the trigger engine entirely. If the
//! comment approves and an active session on that issue is parked at the
//! plan gate, the session gets a resume message and moves to
//! `implementing`. A second approval finds no gated session and is a
//! no-op, which is what makes approvals idempotent.

use crate::server::AppCtx;
use ao_adapters::IssueUpdate;
use ao_core::{keys, Clock, PrpPhase, Session, TriggerEvent};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::OnceLock;

/// Message pasted into the agent session on approval.
const RESUME_MESSAGE: &str =
    "Plan approved. Continue with implementation: run /prp:implement now.";

fn approval_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(approved?|lgtm|proceed|go ahead)\b").ok()).as_ref()
}

/// Whether a comment body approves a plan.
pub fn is_approval(body: &str) -> bool {
    approval_regex().map(|re| re.is_match(body)).unwrap_or(false)
}

/// Handle an `issue.comment` event end to end.
pub async fn handle_issue_comment<C: Clock>(ctx: &Arc<AppCtx<C>>, event: &TriggerEvent) {
    let Some(body) = &event.comment_body else { return };
    if !is_approval(body) {
        return;
    }

    let sessions = match ctx.sm.sessions(None).await {
        Ok(sessions) => sessions,
        Err(e) => {
            tracing::warn!(error = %e, "session scan failed during gate resume");
            return;
        }
    };
    let Some(session) = sessions.into_iter().find(|s| gated_on(ctx, s, event)) else {
        tracing::debug!(issue = event.issue.number, "approval comment but no gated session");
        return;
    };

    tracing::info!(session = %session.id, issue = event.issue.number, "plan approved, resuming");
    if let Err(e) = ctx.sm.send(&session.id, RESUME_MESSAGE).await {
        tracing::warn!(session = %session.id, error = %e, "resume send failed");
        return;
    }

    let mut patch = BTreeMap::new();
    patch.insert(keys::PRP_PHASE.to_string(), PrpPhase::Implementing.as_str().to_string());
    if let Err(e) = ctx.sm.store().update_merge(&session.id, &patch) {
        tracing::warn!(session = %session.id, error = %e, "failed to persist implementing phase");
    }

    if let Some(issue) = &session.issue_id {
        if let Some(project) = ctx.config.project(&session.project_id) {
            let tracker = ctx.registry.tracker(&project.tracker.plugin);
            if let Some(tracker) = tracker {
                let tracker_ctx = ao_adapters::TrackerContext {
                    repo: project.repo.clone(),
                    path: project.path.clone(),
                };
                let comment = format!(
                    "▶️ plan approved — session `{}` is resuming implementation",
                    session.id
                );
                if let Err(e) =
                    tracker.update_issue(issue, IssueUpdate::comment(comment), &tracker_ctx).await
                {
                    tracing::warn!(session = %session.id, error = %e, "resume writeback failed");
                }
            }
        }
    }
}

/// A session is resumable for this event when it belongs to the matching
/// project, refers to the commented issue, is still active, and is parked
/// at the plan gate.
fn gated_on<C: Clock>(ctx: &Arc<AppCtx<C>>, session: &Session, event: &TriggerEvent) -> bool {
    if session.status.is_terminal()
        || session.prp_phase != Some(PrpPhase::PlanGate)
        || !session.issue_matches(event.issue.number)
    {
        return false;
    }
    let Some(project) = ctx.config.project(&session.project_id) else {
        return false;
    };
    match event.provider.as_str() {
        "github" => project.repo.as_deref() == Some(event.repo.as_str()),
        "plane" => project
            .webhooks
            .plane
            .as_ref()
            .map(|plane| event.repo.contains(&plane.workspace_id))
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
#[path = "resume_tests.rs"]
mod tests;
