// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger rule evaluation.
//!
//! Pure decision logic: delivery dedup, project match, ordered rule match,
//! and the duplicate-session guard. Malformed events never error — they
//! produce no decision.

use crate::session::SessionManager;
use ao_config::{Config, ProjectConfig, TriggerAction};
use ao_core::{Clock, ProjectId, TriggerEvent, TriggerKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Minimum dedup window required by the webhook contract.
pub const MIN_DEDUP_TTL: Duration = Duration::from_secs(600);

/// A decision to spawn a session for an issue.
#[derive(Debug, Clone)]
pub struct SpawnDecision {
    pub project_id: ProjectId,
    pub issue_id: String,
    pub kind: TriggerKind,
    /// Index of the matched rule in the project's trigger list.
    pub rule_index: usize,
    pub message: Option<String>,
}

/// Evaluates normalized events against project trigger rules.
pub struct TriggerEngine<C: Clock> {
    dedup: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
    clock: C,
}

impl<C: Clock> TriggerEngine<C> {
    /// `ttl` is clamped up to the contract minimum of ten minutes.
    pub fn new(ttl: Duration, clock: C) -> Self {
        Self { dedup: Mutex::new(HashMap::new()), ttl: ttl.max(MIN_DEDUP_TTL), clock }
    }

    /// Evaluate one event. `None` means skip (dedup hit, no project, no
    /// rule, or an active session already owns the issue).
    pub async fn evaluate(
        &self,
        event: &TriggerEvent,
        config: &Config,
        sm: &SessionManager<C>,
    ) -> Option<SpawnDecision> {
        if self.is_duplicate_delivery(&event.delivery_id) {
            tracing::debug!(delivery = %event.delivery_id, "duplicate delivery, skipping");
            return None;
        }

        let (project_id, project) = match_project(config, event)?;

        let (rule_index, rule) = project.triggers.iter().enumerate().find(|(_, rule)| {
            TriggerKind::parse(&rule.on) == Some(event.kind)
                && rule.label.as_deref().map(|l| Some(l) == event.label.as_deref()).unwrap_or(true)
                && rule
                    .assignee
                    .as_deref()
                    .map(|a| Some(a) == event.assignee.as_deref())
                    .unwrap_or(true)
                && rule.action == TriggerAction::Spawn
        })?;

        // Duplicate-session guard: one active session per (project, issue).
        let sessions = sm.sessions(Some(&project_id)).await.ok()?;
        let active = sessions
            .iter()
            .any(|s| s.issue_matches(event.issue.number) && !s.status.is_terminal());
        if active {
            tracing::info!(
                project = %project_id,
                issue = event.issue.number,
                "active session already exists, skipping spawn"
            );
            return None;
        }

        let issue_id = if event.issue.url.is_empty() {
            event.issue.number.to_string()
        } else {
            event.issue.url.clone()
        };
        tracing::info!(
            project = %project_id,
            issue = %issue_id,
            rule = rule_index,
            kind = %event.kind,
            "trigger matched"
        );
        Some(SpawnDecision {
            project_id,
            issue_id,
            kind: event.kind,
            rule_index,
            message: rule.message.clone(),
        })
    }

    /// Check-and-insert on the delivery id, pruning expired entries on each
    /// access. Events without a delivery id are never deduplicated.
    fn is_duplicate_delivery(&self, delivery_id: &str) -> bool {
        if delivery_id.is_empty() {
            return false;
        }
        let now = self.clock.now();
        let mut dedup = self.dedup.lock();
        dedup.retain(|_, seen| now.duration_since(*seen) < self.ttl);
        if dedup.contains_key(delivery_id) {
            return true;
        }
        dedup.insert(delivery_id.to_string(), now);
        false
    }
}

/// First configured project matching the event's container: repo equality
/// for GitHub, workspace-id containment for Plane.
fn match_project<'a>(
    config: &'a Config,
    event: &TriggerEvent,
) -> Option<(ProjectId, &'a ProjectConfig)> {
    for (key, project) in &config.projects {
        let matched = match event.provider.as_str() {
            "github" => project.repo.as_deref() == Some(event.repo.as_str()),
            "plane" => project
                .webhooks
                .plane
                .as_ref()
                .map(|plane| event.repo.contains(&plane.workspace_id))
                .unwrap_or(false),
            _ => false,
        };
        if matched {
            return Some((ProjectId::new(key.clone()), project));
        }
    }
    None
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
