// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::signature::sign_sha256_hex;
use crate::test_helpers::harness;
use axum::body::Body;
use axum::http::Request;
use serde_json::json;
use tower::ServiceExt;

fn labeled_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": "labeled",
        "issue": {
            "number": 42,
            "title": "Fix the flaky test",
            "state": "open",
            "labels": [{"name": "agent-work"}],
            "html_url": "https://github.com/org/app/issues/42"
        },
        "label": {"name": "agent-work"},
        "repository": {"full_name": "org/app"},
        "sender": {"login": "alice"}
    }))
    .unwrap()
}

fn github_request(body: &[u8], secret: &str, delivery: &str, event: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/webhooks/github")
        .header("x-hub-signature-256", format!("sha256={}", sign_sha256_hex(secret, body)))
        .header("x-github-event", event)
        .header("x-github-delivery", delivery)
        .body(Body::from(body.to_vec()))
        .unwrap()
}

#[tokio::test]
async fn bad_signature_is_401_and_spawns_nothing() {
    let h = harness();
    let app = router(h.ctx.clone());
    let body = labeled_body();
    let request = github_request(&body, "wrong-secret", "d-1", "issues");
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(h.store.list().unwrap().is_empty());
}

#[tokio::test]
async fn missing_signature_is_401() {
    let h = harness();
    let app = router(h.ctx.clone());
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/github")
        .header("x-github-event", "issues")
        .body(Body::from(labeled_body()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signed_garbage_is_400() {
    let h = harness();
    let app = router(h.ctx.clone());
    let body = b"not json at all".to_vec();
    let request = github_request(&body, "s3cret", "d-1", "issues");
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn matching_delivery_spawns_and_confirms() {
    let h = harness();
    let app = router(h.ctx.clone());
    let body = labeled_body();
    let response = app.oneshot(github_request(&body, "s3cret", "d-1", "issues")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let ids = h.store.list().unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0], "app-1");
    assert_eq!(h.runtime.starts().len(), 1);
    assert!(h
        .tracker
        .comments()
        .iter()
        .any(|(_, body)| body.contains("spawned session `app-1`")));
}

#[tokio::test]
async fn duplicate_delivery_spawns_once() {
    let h = harness();
    let body = labeled_body();
    for _ in 0..2 {
        let app = router(h.ctx.clone());
        let response =
            app.oneshot(github_request(&body, "s3cret", "same-delivery", "issues")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(h.store.list().unwrap().len(), 1);
}

#[tokio::test]
async fn unmatched_event_is_200_without_spawn() {
    let h = harness();
    let app = router(h.ctx.clone());
    let mut payload: serde_json::Value = serde_json::from_slice(&labeled_body()).unwrap();
    payload["label"] = json!({"name": "unrelated"});
    payload["issue"]["labels"] = json!([{"name": "unrelated"}]);
    let body = serde_json::to_vec(&payload).unwrap();
    let response = app.oneshot(github_request(&body, "s3cret", "d-1", "issues")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.store.list().unwrap().is_empty());
}

#[tokio::test]
async fn spawn_failure_still_answers_200() {
    let h = harness();
    h.workspace.fail_next_create("disk full");
    let app = router(h.ctx.clone());
    let body = labeled_body();
    let response = app.oneshot(github_request(&body, "s3cret", "d-1", "issues")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.store.list().unwrap().is_empty());
}

#[tokio::test]
async fn plane_webhook_verifies_bare_hex() {
    let h = harness();
    let app = router(h.ctx.clone());
    let body = serde_json::to_vec(&json!({
        "event": "issue",
        "action": "create",
        "data": {
            "id": "uuid-7",
            "sequence_id": 7,
            "name": "New issue",
            "workspace": "ws-123"
        },
        "actor": {"display_name": "alice"}
    }))
    .unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/plane")
        .header("x-plane-signature", sign_sha256_hex("plane-secret", &body))
        .header("x-plane-delivery", "p-1")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    // Signature verifies; no trigger rule for issue.opened, so no spawn.
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.store.list().unwrap().is_empty());
}
