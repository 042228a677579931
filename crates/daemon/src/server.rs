// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook endpoints.
//!
//! `POST /api/webhooks/github` and `POST /api/webhooks/plane`. The raw body
//! is verified against every configured project secret before JSON parsing;
//! a delivery that verifies under no project's secret is a 401.

use crate::normalize;
use crate::resume;
use crate::signature;
use ao_adapters::{IssueUpdate, PluginRegistry};
use ao_config::Config;
use ao_core::{Clock, TriggerEvent, TriggerKind};
use ao_engine::{writeback, SessionManager, SpawnRequest, TriggerEngine};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use std::sync::Arc;

/// Shared context for all webhook handlers.
pub struct AppCtx<C: Clock> {
    pub config: Arc<Config>,
    pub registry: Arc<PluginRegistry>,
    pub sm: Arc<SessionManager<C>>,
    pub triggers: TriggerEngine<C>,
    pub clock: C,
}

/// Build the webhook router.
pub fn router<C: Clock>(ctx: Arc<AppCtx<C>>) -> Router {
    Router::new()
        .route("/api/webhooks/github", post(github_webhook::<C>))
        .route("/api/webhooks/plane", post(plane_webhook::<C>))
        .with_state(ctx)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

async fn github_webhook<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let sig = header(&headers, "x-hub-signature-256");
    let verified = ctx.config.projects.values().any(|project| {
        project
            .webhooks
            .github
            .as_ref()
            .map(|hook| signature::verify_github(&hook.secret, &body, sig))
            .unwrap_or(false)
    });
    if !verified {
        tracing::warn!("github webhook rejected: bad signature");
        return StatusCode::UNAUTHORIZED;
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "github webhook: unparsable JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_name = header(&headers, "x-github-event");
    let delivery = header(&headers, "x-github-delivery");
    match normalize::github(event_name, delivery, &payload, ctx.clock.epoch_ms()) {
        Some(event) => dispatch(&ctx, event).await,
        None => tracing::debug!(event = event_name, "github event not normalized, skipping"),
    }
    StatusCode::OK
}

async fn plane_webhook<C: Clock>(
    State(ctx): State<Arc<AppCtx<C>>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let sig = header(&headers, "x-plane-signature");
    let verified = ctx.config.projects.values().any(|project| {
        project
            .webhooks
            .plane
            .as_ref()
            .map(|hook| signature::verify_sha256_hex(&hook.secret, &body, sig))
            .unwrap_or(false)
    });
    if !verified {
        tracing::warn!("plane webhook rejected: bad signature");
        return StatusCode::UNAUTHORIZED;
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "plane webhook: unparsable JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let delivery = header(&headers, "x-plane-delivery");
    match normalize::plane(delivery, &payload, ctx.clock.epoch_ms()) {
        Some(event) => dispatch(&ctx, event).await,
        None => tracing::debug!("plane event not normalized, skipping"),
    }
    StatusCode::OK
}

/// Route a normalized event: comments go to gate resume, everything else
/// through trigger evaluation to spawn. Failures are logged; the delivery
/// still answers 200.
async fn dispatch<C: Clock>(ctx: &Arc<AppCtx<C>>, event: TriggerEvent) {
    if event.kind == TriggerKind::IssueComment {
        resume::handle_issue_comment(ctx, &event).await;
        return;
    }

    let Some(decision) = ctx.triggers.evaluate(&event, &ctx.config, &ctx.sm).await else {
        return;
    };
    let request = SpawnRequest {
        project_id: decision.project_id.clone(),
        issue_id: decision.issue_id.clone(),
        prompt: None,
        branch: None,
    };
    match ctx.sm.spawn(request).await {
        Ok(session) => {
            // Fire-and-forget confirmation; a failed comment never fails
            // the delivery.
            let Some(project) = ctx.config.project(&decision.project_id) else { return };
            let Some(tracker) = ctx.registry.tracker(&project.tracker.plugin) else { return };
            let tracker_ctx = ao_adapters::TrackerContext {
                repo: project.repo.clone(),
                path: project.path.clone(),
            };
            let comment = writeback::spawned_comment(&session);
            if let Err(e) = tracker
                .update_issue(&decision.issue_id, IssueUpdate::comment(comment), &tracker_ctx)
                .await
            {
                tracing::warn!(session = %session.id, error = %e, "spawn confirmation comment failed");
            }
        }
        Err(e) => {
            tracing::warn!(
                project = %decision.project_id,
                issue = %decision.issue_id,
                error = %e,
                "webhook spawn failed"
            );
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
