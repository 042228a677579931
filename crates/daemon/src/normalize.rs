// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider payload normalization.
//!
//! Each provider's webhook JSON is reduced to a [`TriggerEvent`] here, so
//! everything downstream of the receiver is provider-agnostic. Unsupported
//! events and actions normalize to `None`, never to an error.

use ao_core::{IssueRef, TriggerEvent, TriggerKind};
use serde_json::Value;

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn names_at(value: &Value, pointer: &str, key: &str) -> Vec<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(key).and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Normalize a GitHub webhook delivery.
///
/// Supported: `issues` with action `labeled|assigned|opened|reopened`, and
/// `issue_comment` with action `created`.
pub fn github(
    event_name: &str,
    delivery_id: &str,
    payload: &Value,
    now_ms: u64,
) -> Option<TriggerEvent> {
    let action = str_at(payload, "/action")?;
    let kind = match (event_name, action) {
        ("issues", "labeled") => TriggerKind::IssueLabeled,
        ("issues", "assigned") => TriggerKind::IssueAssigned,
        ("issues", "opened") => TriggerKind::IssueOpened,
        ("issues", "reopened") => TriggerKind::IssueReopened,
        ("issue_comment", "created") => TriggerKind::IssueComment,
        _ => return None,
    };

    let issue = payload.get("issue")?;
    let number = issue.get("number").and_then(Value::as_u64)?;
    let issue_ref = IssueRef {
        id: number.to_string(),
        number,
        title: str_at(payload, "/issue/title").unwrap_or_default().to_string(),
        state: str_at(payload, "/issue/state").unwrap_or_default().to_string(),
        labels: names_at(payload, "/issue/labels", "name"),
        assignees: names_at(payload, "/issue/assignees", "login"),
        url: str_at(payload, "/issue/html_url")
            .or_else(|| str_at(payload, "/issue/url"))
            .unwrap_or_default()
            .to_string(),
    };

    Some(TriggerEvent {
        provider: "github".to_string(),
        delivery_id: delivery_id.to_string(),
        kind,
        action: action.to_string(),
        issue: issue_ref,
        repo: str_at(payload, "/repository/full_name").unwrap_or_default().to_string(),
        label: str_at(payload, "/label/name").map(str::to_string),
        assignee: str_at(payload, "/assignee/login").map(str::to_string),
        sender: str_at(payload, "/sender/login").unwrap_or_default().to_string(),
        timestamp_ms: now_ms,
        comment_body: str_at(payload, "/comment/body").map(str::to_string),
        raw: payload.clone(),
    })
}

/// Normalize a Plane webhook delivery.
///
/// Supported: `issue` events with action `create|update`; label, assignee,
/// and reopen semantics are inferred from the `updates` sub-object.
pub fn plane(delivery_id: &str, payload: &Value, now_ms: u64) -> Option<TriggerEvent> {
    if str_at(payload, "/event") != Some("issue") {
        return None;
    }
    let action = str_at(payload, "/action")?;
    let updates = payload.get("updates");

    let (kind, label, assignee) = match action {
        "create" => (TriggerKind::IssueOpened, None, None),
        "update" => infer_update_kind(updates)?,
        _ => return None,
    };

    let data = payload.get("data")?;
    let number = data
        .get("sequence_id")
        .and_then(Value::as_u64)
        .or_else(|| data.get("number").and_then(Value::as_u64))?;
    let issue_ref = IssueRef {
        id: str_at(payload, "/data/id").unwrap_or_default().to_string(),
        number,
        title: str_at(payload, "/data/name").unwrap_or_default().to_string(),
        state: str_at(payload, "/data/state").unwrap_or_default().to_string(),
        labels: names_at(payload, "/data/labels", "name"),
        assignees: names_at(payload, "/data/assignees", "display_name"),
        url: str_at(payload, "/data/url").unwrap_or_default().to_string(),
    };

    Some(TriggerEvent {
        provider: "plane".to_string(),
        delivery_id: delivery_id.to_string(),
        kind,
        action: action.to_string(),
        issue: issue_ref,
        repo: str_at(payload, "/data/workspace")
            .or_else(|| str_at(payload, "/workspace_id"))
            .unwrap_or_default()
            .to_string(),
        label,
        assignee,
        sender: str_at(payload, "/actor/display_name").unwrap_or_default().to_string(),
        timestamp_ms: now_ms,
        comment_body: str_at(payload, "/data/comment_html").map(str::to_string),
        raw: payload.clone(),
    })
}

/// Classify a Plane `update` by what changed: added label, added assignee,
/// or a closed→open state flip (a reopen).
fn infer_update_kind(
    updates: Option<&Value>,
) -> Option<(TriggerKind, Option<String>, Option<String>)> {
    let updates = updates?;
    if let Some(added) = updates.pointer("/labels/added").and_then(Value::as_array) {
        if let Some(label) = added.first().and_then(|l| {
            l.as_str().map(str::to_string).or_else(|| {
                l.get("name").and_then(Value::as_str).map(str::to_string)
            })
        }) {
            return Some((TriggerKind::IssueLabeled, Some(label), None));
        }
    }
    if let Some(added) = updates.pointer("/assignees/added").and_then(Value::as_array) {
        if let Some(assignee) = added.first().and_then(|a| {
            a.as_str().map(str::to_string).or_else(|| {
                a.get("display_name").and_then(Value::as_str).map(str::to_string)
            })
        }) {
            return Some((TriggerKind::IssueAssigned, None, Some(assignee)));
        }
    }
    let old_state = updates.pointer("/state/old").and_then(Value::as_str);
    let new_state = updates.pointer("/state/new").and_then(Value::as_str);
    if matches!(old_state, Some("completed") | Some("cancelled"))
        && matches!(new_state, Some(s) if s != "completed" && s != "cancelled")
    {
        return Some((TriggerKind::IssueReopened, None, None));
    }
    None
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
