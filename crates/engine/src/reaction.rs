// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session, per-event retry-with-escalation state machines.
//!
//! One tracker per `(session, reaction key)` counts attempts from the first
//! trigger. The poll loop invokes the reaction on every tick the triggering
//! condition holds; send-to-agent retries on each invocation, notify and
//! auto-merge fire on the first, and escalation promotes the whole thing to
//! an urgent human notification exactly once. Nothing here ever propagates
//! an error out of the poll loop.

use crate::notify::NotificationRouter;
use crate::session::SessionManager;
use crate::writeback;
use ao_config::{ProjectConfig, ReactionAction, ReactionConfig};
use ao_core::{Clock, EventType, Priority, Session, SessionId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Attempt state for one `(session, reaction key)`.
#[derive(Debug, Clone, Copy)]
struct ReactionTracker {
    attempts: u32,
    first_triggered: Instant,
    escalated: bool,
}

/// What one invocation did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionOutcome {
    pub attempts: u32,
    pub action_fired: bool,
    pub escalated: bool,
}

/// Retry/escalation bookkeeping shared across the poll loop.
pub struct ReactionEngine<C: Clock> {
    trackers: Mutex<HashMap<(SessionId, String), ReactionTracker>>,
    clock: C,
}

impl<C: Clock> ReactionEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { trackers: Mutex::new(HashMap::new()), clock }
    }

    /// Current attempt count, mostly for tests and status output.
    pub fn attempts(&self, id: &SessionId, key: &str) -> u32 {
        self.trackers
            .lock()
            .get(&(id.clone(), key.to_string()))
            .map(|t| t.attempts)
            .unwrap_or(0)
    }

    /// Drop the tracker for one `(session, key)`; called when the status
    /// transitions away from the triggering condition so retries restart
    /// cleanly.
    pub fn clear(&self, id: &SessionId, key: &str) {
        self.trackers.lock().remove(&(id.clone(), key.to_string()));
    }

    /// Drop trackers for sessions that no longer exist.
    pub fn prune(&self, live: &HashSet<SessionId>) {
        self.trackers.lock().retain(|(id, _), _| live.contains(id));
    }

    /// Run one reaction invocation.
    pub async fn run(
        &self,
        sm: &SessionManager<C>,
        router: &NotificationRouter,
        project: &ProjectConfig,
        session: &Session,
        key: &str,
        config: &ReactionConfig,
    ) -> ReactionOutcome {
        let now = self.clock.now();
        let (attempts, first_triggered, already_escalated) = {
            let mut trackers = self.trackers.lock();
            let tracker = trackers
                .entry((session.id.clone(), key.to_string()))
                .or_insert(ReactionTracker {
                    attempts: 0,
                    first_triggered: now,
                    escalated: false,
                });
            tracker.attempts += 1;
            (tracker.attempts, tracker.first_triggered, tracker.escalated)
        };

        if self.should_escalate(config, attempts, first_triggered) {
            if already_escalated {
                return ReactionOutcome { attempts, action_fired: false, escalated: false };
            }
            self.trackers
                .lock()
                .entry((session.id.clone(), key.to_string()))
                .and_modify(|t| t.escalated = true);
            tracing::warn!(
                session = %session.id,
                reaction = key,
                attempts,
                event = %EventType::ReactionEscalated,
                "reaction escalated to human"
            );
            router
                .notify(
                    project,
                    Priority::Urgent,
                    &format!("session {} escalated", session.id),
                    &format!(
                        "reaction `{}` exhausted after {} attempts; {}",
                        key,
                        attempts.saturating_sub(1),
                        writeback::needs_attention(&session.id, session.status),
                    ),
                )
                .await;
            return ReactionOutcome { attempts, action_fired: false, escalated: true };
        }

        // auto: false suppresses the automated action but still notifies.
        let effective_action = if config.auto { config.action } else { ReactionAction::Notify };

        let action_fired = match effective_action {
            ReactionAction::SendToAgent => {
                let message = config
                    .message
                    .clone()
                    .unwrap_or_else(|| "orchestrator: please take another look".to_string());
                match sm.send(&session.id, &message).await {
                    Ok(()) => {
                        tracing::info!(
                            session = %session.id,
                            reaction = key,
                            attempt = attempts,
                            "sent reaction message to agent"
                        );
                        true
                    }
                    Err(e) => {
                        // Retriable: the tracker stays advanced by one
                        // attempt and the next tick tries again.
                        tracing::warn!(
                            session = %session.id,
                            reaction = key,
                            error = %e,
                            "reaction send failed, will retry"
                        );
                        false
                    }
                }
            }
            ReactionAction::Notify => {
                if attempts == 1 {
                    tracing::info!(
                        session = %session.id,
                        reaction = key,
                        event = %EventType::ReactionTriggered,
                        "reaction notify"
                    );
                    let priority = config.priority.unwrap_or(Priority::Warning);
                    let body = config
                        .message
                        .clone()
                        .unwrap_or_else(|| format!("reaction `{}` triggered", key));
                    router
                        .notify(project, priority, &format!("session {}", session.id), &body)
                        .await;
                    true
                } else {
                    false
                }
            }
            ReactionAction::AutoMerge => {
                if attempts == 1 {
                    tracing::info!(
                        session = %session.id,
                        reaction = key,
                        event = %EventType::ReactionTriggered,
                        "auto-merge reaction"
                    );
                    // The merge itself is delegated to the SCM as a future
                    // extension; surface readiness to a human meanwhile.
                    router
                        .notify(
                            project,
                            config.priority.unwrap_or(Priority::Action),
                            &format!("session {} ready to merge", session.id),
                            session.pr.as_deref().unwrap_or("pull request approved and green"),
                        )
                        .await;
                    true
                } else {
                    false
                }
            }
        };

        ReactionOutcome { attempts, action_fired, escalated: false }
    }

    fn should_escalate(
        &self,
        config: &ReactionConfig,
        attempts: u32,
        first_triggered: Instant,
    ) -> bool {
        if let Some(retries) = config.retries {
            if attempts > retries {
                return true;
            }
        }
        if let Some(escalate_after) = &config.escalate_after {
            if let Some(count) = escalate_after.count() {
                if attempts > count {
                    return true;
                }
            }
            if let Some(window) = escalate_after.duration() {
                if self.clock.now().duration_since(first_triggered) > window {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
#[path = "reaction_tests.rs"]
mod tests;
