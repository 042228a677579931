// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker writeback comments.
//!
//! All comment text the orchestrator posts lives here so the "at most once
//! per transition" property is a matter of when the lifecycle calls these,
//! not what they say.

use ao_core::{PrpPhase, Session, SessionStatus};
use std::path::{Path, PathBuf};

/// Default character budget for the plan-gate comment. Some trackers accept
/// much more; the budget is a parameter so a tracker can override it, but
/// the default stays at 4000.
pub const PLAN_COMMENT_LIMIT: usize = 4000;

/// Instructions appended to every plan-gate comment.
pub const APPROVAL_INSTRUCTIONS: &str = "Reply with `approved`, `lgtm`, `proceed`, or `go ahead` \
     to start implementation.";

/// Confirmation comment posted after a webhook-triggered spawn.
pub fn spawned_comment(session: &Session) -> String {
    match &session.branch {
        Some(branch) => format!(
            "🚀 spawned session `{}` on branch `{}`",
            session.id, branch
        ),
        None => format!("🚀 spawned session `{}`", session.id),
    }
}

/// The writeback comment for a status transition, if the transition maps to
/// one.
pub fn comment_for_transition(to: SessionStatus, session: &Session) -> Option<String> {
    let pr = session.pr.as_deref().unwrap_or("(unknown PR)");
    Some(match to {
        SessionStatus::PrOpen => format!("Pull Request: {}", pr),
        SessionStatus::CiFailed => format!("❌ CI is failing on {}", pr),
        SessionStatus::ReviewPending => "👀 Review pending".to_string(),
        SessionStatus::ChangesRequested => "✋ Review requested changes".to_string(),
        SessionStatus::Approved => "✅ Review approved".to_string(),
        SessionStatus::Mergeable => "🟢 Approved and CI green — ready to merge".to_string(),
        SessionStatus::Merged => "🎉 Pull request merged".to_string(),
        SessionStatus::NeedsInput | SessionStatus::Stuck | SessionStatus::Errored => {
            needs_attention(&session.id, to)
        }
        SessionStatus::Killed => format!("session `{}` exited", session.id),
        _ => return None,
    })
}

/// The "needs a human" comment used for stuck/errored/needs-input sessions.
pub fn needs_attention(id: &ao_core::SessionId, status: SessionStatus) -> String {
    format!("❗ session {} needs attention, status: {}", id, status)
}

/// The phase writeback comment for an observed methodology phase change.
pub fn phase_comment(phase: PrpPhase) -> Option<&'static str> {
    Some(match phase {
        PrpPhase::Investigating => "🔎 Investigation started",
        PrpPhase::Planning => "📝 Planning started",
        PrpPhase::PlanningComplete => "📋 Plan complete",
        PrpPhase::Implementing => "🔨 Implementation started",
        PrpPhase::PlanGate => return None,
    })
}

/// First plan artifact under the workspace, by sorted file name.
pub fn find_plan_file(workspace: &Path) -> Option<PathBuf> {
    let plans_dir = workspace.join(".claude/PRPs/plans");
    let mut plans: Vec<PathBuf> = std::fs::read_dir(plans_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(".plan.md"))
                .unwrap_or(false)
        })
        .collect();
    plans.sort();
    plans.into_iter().next()
}

/// Build the plan-gate comment: a fenced include of the plan, truncated to
/// the budget, followed by the approval instructions.
pub fn plan_gate_comment(plan: &str, limit: usize) -> String {
    let (body, truncated) = truncate_chars(plan, limit);
    let mut comment = String::from("📋 **Plan ready for review**\n\n```markdown\n");
    comment.push_str(body);
    if !body.ends_with('\n') {
        comment.push('\n');
    }
    comment.push_str("```\n");
    if truncated {
        comment.push_str("_(plan truncated)_\n");
    }
    comment.push('\n');
    comment.push_str(APPROVAL_INSTRUCTIONS);
    comment
}

/// Truncate at a char boundary at or below `limit` bytes.
fn truncate_chars(s: &str, limit: usize) -> (&str, bool) {
    if s.len() <= limit {
        return (s, false);
    }
    let mut end = limit;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    (&s[..end], true)
}

#[cfg(test)]
#[path = "writeback_tests.rs"]
mod tests;
