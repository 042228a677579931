// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn github_labeled_payload() -> Value {
    json!({
        "action": "labeled",
        "issue": {
            "number": 42,
            "title": "Fix the flaky test",
            "state": "open",
            "labels": [{"name": "agent-work"}, {"name": "bug"}],
            "assignees": [{"login": "alice"}],
            "html_url": "https://github.com/org/app/issues/42"
        },
        "label": {"name": "agent-work"},
        "repository": {"full_name": "org/app"},
        "sender": {"login": "alice"}
    })
}

#[test]
fn github_labeled_normalizes() {
    let event = github("issues", "d-1", &github_labeled_payload(), 123).unwrap();
    assert_eq!(event.kind, TriggerKind::IssueLabeled);
    assert_eq!(event.delivery_id, "d-1");
    assert_eq!(event.issue.number, 42);
    assert_eq!(event.issue.labels, vec!["agent-work", "bug"]);
    assert_eq!(event.issue.url, "https://github.com/org/app/issues/42");
    assert_eq!(event.repo, "org/app");
    assert_eq!(event.label.as_deref(), Some("agent-work"));
    assert_eq!(event.sender, "alice");
    assert_eq!(event.timestamp_ms, 123);
}

#[yare::parameterized(
    assigned = { "assigned", TriggerKind::IssueAssigned },
    opened   = { "opened", TriggerKind::IssueOpened },
    reopened = { "reopened", TriggerKind::IssueReopened },
)]
fn github_issue_actions(action: &str, expected: TriggerKind) {
    let mut payload = github_labeled_payload();
    payload["action"] = json!(action);
    let event = github("issues", "d-1", &payload, 0).unwrap();
    assert_eq!(event.kind, expected);
}

#[test]
fn github_comment_carries_body() {
    let payload = json!({
        "action": "created",
        "issue": {"number": 42, "title": "t", "state": "open",
                  "html_url": "https://github.com/org/app/issues/42"},
        "comment": {"body": "approved"},
        "repository": {"full_name": "org/app"},
        "sender": {"login": "bob"}
    });
    let event = github("issue_comment", "d-2", &payload, 0).unwrap();
    assert_eq!(event.kind, TriggerKind::IssueComment);
    assert_eq!(event.comment_body.as_deref(), Some("approved"));
}

#[yare::parameterized(
    closed_issue   = { "issues", "closed" },
    edited_comment = { "issue_comment", "edited" },
    push_event     = { "push", "created" },
)]
fn unsupported_github_events_are_none(event_name: &str, action: &str) {
    let mut payload = github_labeled_payload();
    payload["action"] = json!(action);
    assert!(github(event_name, "d-1", &payload, 0).is_none());
}

#[test]
fn github_without_issue_is_none() {
    let payload = json!({"action": "labeled"});
    assert!(github("issues", "d-1", &payload, 0).is_none());
}

fn plane_payload(action: &str, updates: Value) -> Value {
    json!({
        "event": "issue",
        "action": action,
        "data": {
            "id": "uuid-1",
            "sequence_id": 42,
            "name": "Fix the flaky test",
            "state": "started",
            "workspace": "ws-123",
            "url": "https://plane.example/ws-123/issues/42"
        },
        "updates": updates,
        "actor": {"display_name": "alice"}
    })
}

#[test]
fn plane_create_is_opened() {
    let event = plane("p-1", &plane_payload("create", json!({})), 0).unwrap();
    assert_eq!(event.kind, TriggerKind::IssueOpened);
    assert_eq!(event.issue.number, 42);
    assert_eq!(event.repo, "ws-123");
}

#[test]
fn plane_label_update_is_labeled() {
    let updates = json!({"labels": {"added": [{"name": "agent-work"}]}});
    let event = plane("p-2", &plane_payload("update", updates), 0).unwrap();
    assert_eq!(event.kind, TriggerKind::IssueLabeled);
    assert_eq!(event.label.as_deref(), Some("agent-work"));
}

#[test]
fn plane_assignee_update_is_assigned() {
    let updates = json!({"assignees": {"added": [{"display_name": "bob"}]}});
    let event = plane("p-3", &plane_payload("update", updates), 0).unwrap();
    assert_eq!(event.kind, TriggerKind::IssueAssigned);
    assert_eq!(event.assignee.as_deref(), Some("bob"));
}

#[test]
fn plane_state_flip_is_reopened() {
    let updates = json!({"state": {"old": "completed", "new": "started"}});
    let event = plane("p-4", &plane_payload("update", updates), 0).unwrap();
    assert_eq!(event.kind, TriggerKind::IssueReopened);
}

#[test]
fn plane_irrelevant_update_is_none() {
    let updates = json!({"description": {"old": "a", "new": "b"}});
    assert!(plane("p-5", &plane_payload("update", updates), 0).is_none());
}

#[test]
fn plane_non_issue_event_is_none() {
    let payload = json!({"event": "cycle", "action": "create"});
    assert!(plane("p-6", &payload, 0).is_none());
}
