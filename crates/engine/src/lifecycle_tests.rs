// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{harness, harness_with, Harness, BASE_YAML};
use ao_adapters::CiSummary;

const CI_REACTION_YAML: &str = r#"
reactions:
  ci-failed:
    action: send-to-agent
    message: "CI failed - please fix"
    retries: 2
    escalateAfter: "30m"
    priority: warning
  approved-and-green:
    action: notify
    priority: action
"#;

fn yaml_with_reactions() -> String {
    format!("{}{}", BASE_YAML, CI_REACTION_YAML)
}

fn seed_working_with_pr(h: &Harness) -> SessionId {
    h.seed_session(
        "app-1",
        &[
            (keys::PROJECT, "app"),
            (keys::ISSUE, "https://github.com/org/app/issues/42"),
            (keys::STATUS, "working"),
            (keys::TMUX_NAME, "ao-app-1"),
            (keys::PR, "https://github.com/org/app/pull/7"),
        ],
    )
}

#[tokio::test]
async fn spawning_promotes_to_working() {
    let h = harness();
    let session = h.sm.spawn(h.spawn_request("42")).await.unwrap();
    let lifecycle = h.lifecycle();

    let report = lifecycle.tick().await;
    assert_eq!(report.checked, 1);
    assert_eq!(report.transitions, 1);
    assert_eq!(h.session_field(&session.id, keys::STATUS).as_deref(), Some("working"));
}

#[tokio::test]
async fn dead_runtime_becomes_killed() {
    let h = harness();
    let session = h.sm.spawn(h.spawn_request("42")).await.unwrap();
    h.runtime.set_dead("ao-app-1");
    let lifecycle = h.lifecycle();

    lifecycle.tick().await;
    assert_eq!(h.session_field(&session.id, keys::STATUS).as_deref(), Some("killed"));
}

#[tokio::test]
async fn waiting_input_detected_from_terminal() {
    let h = harness();
    let session = h.sm.spawn(h.spawn_request("42")).await.unwrap();
    h.runtime.set_output("ao-app-1", "Do you want to proceed?");
    h.agent.set_activity(ao_core::Activity::WaitingInput);
    let lifecycle = h.lifecycle();

    lifecycle.tick().await;
    assert_eq!(h.session_field(&session.id, keys::STATUS).as_deref(), Some("needs_input"));

    // Activity resumes: back-transition to working is allowed.
    h.agent.set_activity(ao_core::Activity::Active);
    lifecycle.tick().await;
    assert_eq!(h.session_field(&session.id, keys::STATUS).as_deref(), Some("working"));
}

#[tokio::test]
async fn pr_milestones_advance_one_step_per_tick() {
    let h = harness_with(&yaml_with_reactions());
    let id = seed_working_with_pr(&h);
    h.scm.set_review(ao_adapters::ReviewDecision::Approved);
    h.scm.set_mergeable(true);
    let lifecycle = h.lifecycle();

    lifecycle.tick().await;
    assert_eq!(h.session_field(&id, keys::STATUS).as_deref(), Some("pr_open"));
    lifecycle.tick().await;
    assert_eq!(h.session_field(&id, keys::STATUS).as_deref(), Some("approved"));
    lifecycle.tick().await;
    assert_eq!(h.session_field(&id, keys::STATUS).as_deref(), Some("mergeable"));

    // writeback posted for the PR transition, once
    let comments = h.tracker.comments();
    let pr_comments: Vec<_> =
        comments.iter().filter(|(_, body)| body.starts_with("Pull Request:")).collect();
    assert_eq!(pr_comments.len(), 1);
    assert!(pr_comments[0].1.contains("pull/7"));

    // approved-and-green reaction (notify) fired exactly once
    let calls = h.notify.calls();
    let merge_ready: Vec<_> =
        calls.iter().filter(|c| c.priority == ao_core::Priority::Action).collect();
    assert_eq!(merge_ready.len(), 1);
}

#[tokio::test]
async fn ci_failure_reaction_retries_then_escalates() {
    let h = harness_with(&yaml_with_reactions());
    let id = seed_working_with_pr(&h);
    h.scm.set_ci(CiSummary { failing: true, pending: false });
    let lifecycle = h.lifecycle();

    // tick 1: working -> pr_open; tick 2: pr_open -> ci_failed + attempt 1
    lifecycle.tick().await;
    lifecycle.tick().await;
    assert_eq!(h.session_field(&id, keys::STATUS).as_deref(), Some("ci_failed"));
    assert_eq!(h.runtime.sent().len(), 1);
    assert_eq!(h.runtime.sent()[0].1, "CI failed - please fix");

    // tick 3: still failing, attempt 2
    lifecycle.tick().await;
    assert_eq!(h.runtime.sent().len(), 2);
    assert!(h.notify.calls().is_empty());

    // tick 4: attempts exhausted, escalation is urgent
    lifecycle.tick().await;
    assert_eq!(h.runtime.sent().len(), 2);
    let calls = h.notify.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].priority, ao_core::Priority::Urgent);
}

#[tokio::test]
async fn recovery_from_ci_failure_clears_reaction_state() {
    let h = harness_with(&yaml_with_reactions());
    let id = seed_working_with_pr(&h);
    h.scm.set_ci(CiSummary { failing: true, pending: false });
    let lifecycle = h.lifecycle();

    lifecycle.tick().await; // pr_open
    lifecycle.tick().await; // ci_failed, attempt 1
    assert_eq!(lifecycle.reactions().attempts(&id, "ci-failed"), 1);

    // CI recovers; transition away clears the tracker.
    h.scm.set_ci(CiSummary::default());
    lifecycle.tick().await; // review_pending
    assert_eq!(h.session_field(&id, keys::STATUS).as_deref(), Some("review_pending"));
    assert_eq!(lifecycle.reactions().attempts(&id, "ci-failed"), 0);

    // CI breaks again: the retry budget starts over.
    h.scm.set_ci(CiSummary { failing: true, pending: false });
    lifecycle.tick().await;
    assert_eq!(lifecycle.reactions().attempts(&id, "ci-failed"), 1);
    assert_eq!(h.runtime.sent().len(), 2);
}

#[tokio::test]
async fn merged_pr_is_terminal_and_written_back() {
    let h = harness();
    let id = seed_working_with_pr(&h);
    h.scm.set_state(ao_adapters::PrState::Merged);
    let lifecycle = h.lifecycle();

    lifecycle.tick().await;
    assert_eq!(h.session_field(&id, keys::STATUS).as_deref(), Some("merged"));
    assert!(h
        .tracker
        .comments()
        .iter()
        .any(|(_, body)| body.contains("merged")));

    // Terminal sessions are no longer probed.
    let report = lifecycle.tick().await;
    assert_eq!(report.checked, 0);
}

#[tokio::test]
async fn pr_probe_failure_preserves_state() {
    let h = harness();
    let id = seed_working_with_pr(&h);
    h.scm.fail_probes("gh is down");
    let lifecycle = h.lifecycle();

    let report = lifecycle.tick().await;
    assert_eq!(report.transitions, 0);
    assert_eq!(h.session_field(&id, keys::STATUS).as_deref(), Some("working"));
}

#[tokio::test]
async fn single_flight_guard_skips_concurrent_tick() {
    let h = harness();
    let lifecycle = h.lifecycle();
    // Simulate a tick in progress.
    lifecycle.tick_running.store(true, Ordering::SeqCst);
    let report = lifecycle.tick().await;
    assert!(report.skipped);

    lifecycle.tick_running.store(false, Ordering::SeqCst);
    let report = lifecycle.tick().await;
    assert!(!report.skipped);
}

#[tokio::test]
async fn all_complete_fires_once_on_edge() {
    let yaml = format!(
        "{}{}",
        BASE_YAML,
        r#"
reactions:
  all-complete:
    action: notify
    message: "fleet drained"
    priority: action
"#
    );
    let h = harness_with(&yaml);
    h.seed_session("app-1", &[(keys::PROJECT, "app"), (keys::STATUS, "merged")]);
    h.seed_session("app-2", &[(keys::PROJECT, "app"), (keys::STATUS, "killed")]);
    let lifecycle = h.lifecycle();

    lifecycle.tick().await;
    let fired: Vec<_> =
        h.notify.calls().into_iter().filter(|c| c.body.contains("fleet drained")).collect();
    assert_eq!(fired.len(), 1);

    // Second tick with everything still terminal: edge already consumed.
    lifecycle.tick().await;
    let fired: Vec<_> =
        h.notify.calls().into_iter().filter(|c| c.body.contains("fleet drained")).collect();
    assert_eq!(fired.len(), 1);
}

#[tokio::test]
async fn empty_session_set_never_fires_all_complete() {
    let yaml = format!(
        "{}{}",
        BASE_YAML,
        "\nreactions:\n  all-complete:\n    action: notify\n    message: \"fleet drained\"\n"
    );
    let h = harness_with(&yaml);
    let lifecycle = h.lifecycle();
    lifecycle.tick().await;
    assert!(h.notify.calls().is_empty());
}

// ── plan gate ─────────────────────────────────────────────────────────

fn prp_yaml() -> String {
    BASE_YAML.replace(
        "    triggers:",
        "    prp:\n      enabled: true\n      gates:\n        plan: true\n    triggers:",
    )
}

fn seed_prp_session(h: &Harness, phase: &str) -> (SessionId, std::path::PathBuf) {
    let workspace = h.state.path().join("ws-app-1");
    let plans = workspace.join(".claude/PRPs/plans");
    std::fs::create_dir_all(&plans).unwrap();
    let plan_body = "## Plan\n".to_string() + &"- step\n".repeat(200);
    std::fs::write(plans.join("P.plan.md"), plan_body).unwrap();
    let id = h.seed_session(
        "app-1",
        &[
            (keys::PROJECT, "app"),
            (keys::ISSUE, "https://github.com/org/app/issues/42"),
            (keys::STATUS, "working"),
            (keys::WORKTREE, &workspace.display().to_string()),
            (keys::PRP_PHASE, phase),
        ],
    );
    (id, workspace)
}

#[tokio::test]
async fn plan_gate_fires_exactly_once() {
    let h = harness_with(&prp_yaml());
    let (id, _ws) = seed_prp_session(&h, "planning_complete");
    let lifecycle = h.lifecycle();

    lifecycle.tick().await;

    // One gate comment with the (truncated) plan and approval words.
    let comments = h.tracker.comments();
    let gates: Vec<_> =
        comments.iter().filter(|(_, body)| body.contains("Plan ready for review")).collect();
    assert_eq!(gates.len(), 1);
    assert!(gates[0].1.contains("```markdown"));
    assert!(gates[0].1.contains("lgtm"));
    // One action-priority notification.
    let actions: Vec<_> = h
        .notify
        .calls()
        .into_iter()
        .filter(|c| c.priority == ao_core::Priority::Action)
        .collect();
    assert_eq!(actions.len(), 1);
    // Phase flipped durably.
    assert_eq!(h.session_field(&id, keys::PRP_PHASE).as_deref(), Some("plan_gate"));

    // Subsequent ticks see plan_gate, not planning_complete: no re-fire.
    lifecycle.tick().await;
    let comments = h.tracker.comments();
    let gates: Vec<_> =
        comments.iter().filter(|(_, body)| body.contains("Plan ready for review")).collect();
    assert_eq!(gates.len(), 1);
}

#[tokio::test]
async fn plan_gate_comment_respects_budget() {
    let h = harness_with(&prp_yaml());
    let (_id, ws) = seed_prp_session(&h, "planning_complete");
    // Blow way past the budget.
    std::fs::write(
        ws.join(".claude/PRPs/plans/P.plan.md"),
        "x".repeat(20_000),
    )
    .unwrap();
    let lifecycle = h.lifecycle();
    lifecycle.tick().await;

    let comments = h.tracker.comments();
    let gate = comments.iter().find(|(_, b)| b.contains("Plan ready")).unwrap();
    assert!(gate.1.contains("_(plan truncated)_"));
    assert!(gate.1.len() < 4700);
}

#[tokio::test]
async fn restart_with_plan_gate_does_not_refire() {
    let h = harness_with(&prp_yaml());
    let (_id, _ws) = seed_prp_session(&h, "plan_gate");
    h.seed_session(
        "app-2",
        &[(keys::PROJECT, "app"), (keys::STATUS, "working"), (keys::TMUX_NAME, "ao-app-2")],
    );

    // Fresh lifecycle = restarted orchestrator: empty in-memory state.
    let lifecycle = h.lifecycle();
    let report = lifecycle.tick().await;

    assert!(h.tracker.comments().is_empty());
    assert!(h.notify.calls().is_empty());
    // Working sessions keep being polled.
    assert_eq!(report.checked, 2);
}

#[tokio::test]
async fn phase_change_posts_phase_writeback() {
    let h = harness_with(&prp_yaml());
    let id = h.seed_session(
        "app-1",
        &[
            (keys::PROJECT, "app"),
            (keys::ISSUE, "https://github.com/org/app/issues/42"),
            (keys::STATUS, "working"),
        ],
    );
    let lifecycle = h.lifecycle();
    lifecycle.tick().await; // baseline: no phase yet
    assert!(h.tracker.comments().is_empty());

    // The hook writes investigating between ticks.
    h.store
        .update_merge(&id, &[(keys::PRP_PHASE.to_string(), "investigating".to_string())].into())
        .unwrap();
    lifecycle.tick().await;
    assert!(h
        .tracker
        .comments()
        .iter()
        .any(|(_, body)| body.contains("Investigation started")));
}

#[tokio::test]
async fn gate_disabled_means_plain_plan_writeback() {
    let yaml = BASE_YAML.replace(
        "    triggers:",
        "    prp:\n      enabled: true\n    triggers:",
    );
    let h = harness_with(&yaml);
    let id = h.seed_session(
        "app-1",
        &[
            (keys::PROJECT, "app"),
            (keys::ISSUE, "https://github.com/org/app/issues/42"),
            (keys::STATUS, "working"),
        ],
    );
    let lifecycle = h.lifecycle();
    lifecycle.tick().await;
    h.store
        .update_merge(
            &id,
            &[(keys::PRP_PHASE.to_string(), "planning_complete".to_string())].into(),
        )
        .unwrap();
    lifecycle.tick().await;

    let comments = h.tracker.comments();
    assert!(comments.iter().any(|(_, body)| body.contains("Plan complete")));
    assert!(!comments.iter().any(|(_, body)| body.contains("Plan ready for review")));
    assert_eq!(h.session_field(&id, keys::PRP_PHASE).as_deref(), Some("planning_complete"));
}
