// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::harness;
use ao_core::IssueRef;

#[yare::parameterized(
    approved    = { "approved", true },
    approve     = { "Approve!", true },
    lgtm_upper  = { "LGTM", true },
    proceed     = { "please proceed", true },
    go_ahead    = { "go ahead with it", true },
    unapproved  = { "unapproved", false },
    disapproved = { "this is not approvedish", false },
    unrelated   = { "looks interesting", false },
    empty       = { "", false },
)]
fn approval_matching(body: &str, expected: bool) {
    assert_eq!(is_approval(body), expected);
}

fn comment_event(body: &str) -> TriggerEvent {
    TriggerEvent {
        provider: "github".to_string(),
        delivery_id: "c-1".to_string(),
        kind: ao_core::TriggerKind::IssueComment,
        action: "created".to_string(),
        issue: IssueRef {
            id: "42".to_string(),
            number: 42,
            title: "Fix the flaky test".to_string(),
            state: "open".to_string(),
            labels: vec![],
            assignees: vec![],
            url: "https://github.com/org/app/issues/42".to_string(),
        },
        repo: "org/app".to_string(),
        label: None,
        assignee: None,
        sender: "alice".to_string(),
        timestamp_ms: 0,
        comment_body: Some(body.to_string()),
        raw: serde_json::Value::Null,
    }
}

fn seed_gated(h: &crate::test_helpers::Harness) -> ao_core::SessionId {
    let id = ao_core::SessionId::new("app-1");
    h.store.reserve(&id).unwrap();
    let patch: std::collections::BTreeMap<String, String> = [
        (keys::PROJECT.to_string(), "app".to_string()),
        (keys::ISSUE.to_string(), "https://github.com/org/app/issues/42".to_string()),
        (keys::STATUS.to_string(), "working".to_string()),
        (keys::TMUX_NAME.to_string(), "ao-app-1".to_string()),
        (keys::PRP_PHASE.to_string(), "plan_gate".to_string()),
    ]
    .into();
    h.store.update_merge(&id, &patch).unwrap();
    id
}

#[tokio::test]
async fn approval_resumes_gated_session() {
    let h = harness();
    let id = seed_gated(&h);

    handle_issue_comment(&h.ctx, &comment_event("approved")).await;

    let sent = h.runtime.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.contains("/prp:implement"));
    let map = h.store.read(&id).unwrap().unwrap();
    assert_eq!(map.get(keys::PRP_PHASE).map(String::as_str), Some("implementing"));
    assert!(h
        .tracker
        .comments()
        .iter()
        .any(|(_, body)| body.contains("resuming implementation")));
}

#[tokio::test]
async fn second_approval_is_a_noop() {
    let h = harness();
    seed_gated(&h);
    handle_issue_comment(&h.ctx, &comment_event("approved")).await;
    let sent_before = h.runtime.sent().len();
    let comments_before = h.tracker.comments().len();

    handle_issue_comment(&h.ctx, &comment_event("lgtm")).await;

    assert_eq!(h.runtime.sent().len(), sent_before);
    assert_eq!(h.tracker.comments().len(), comments_before);
}

#[tokio::test]
async fn non_approval_comment_is_ignored() {
    let h = harness();
    seed_gated(&h);
    handle_issue_comment(&h.ctx, &comment_event("interesting plan, thinking about it")).await;
    assert!(h.runtime.sent().is_empty());
}

#[tokio::test]
async fn session_not_at_gate_is_ignored() {
    let h = harness();
    let id = ao_core::SessionId::new("app-1");
    h.store.reserve(&id).unwrap();
    let patch: std::collections::BTreeMap<String, String> = [
        (keys::PROJECT.to_string(), "app".to_string()),
        (keys::ISSUE.to_string(), "https://github.com/org/app/issues/42".to_string()),
        (keys::STATUS.to_string(), "working".to_string()),
        (keys::PRP_PHASE.to_string(), "implementing".to_string()),
    ]
    .into();
    h.store.update_merge(&id, &patch).unwrap();

    handle_issue_comment(&h.ctx, &comment_event("approved")).await;
    assert!(h.runtime.sent().is_empty());
}

#[tokio::test]
async fn other_repo_comment_does_not_resume() {
    let h = harness();
    seed_gated(&h);
    let mut event = comment_event("approved");
    event.repo = "org/other".to_string();
    handle_issue_comment(&h.ctx, &event).await;
    assert!(h.runtime.sent().is_empty());
}
