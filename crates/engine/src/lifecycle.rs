// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle manager: the periodic poll that derives session status.
//!
//! Each tick probes every non-terminal session (runtime liveness, agent
//! activity, PR/CI/review state), classifies transitions, persists them,
//! posts writeback comments at most once per transition, and drives the
//! reaction engine. A single-flight guard skips a tick while the previous
//! one is still running; sessions are probed concurrently with bounded
//! parallelism and one sick session can never halt the fleet.

use crate::notify::NotificationRouter;
use crate::reaction::ReactionEngine;
use crate::session::{ProjectPlugins, SessionManager};
use crate::writeback;
use ao_adapters::{IssueUpdate, PluginRegistry, PrState, ReviewDecision, ScmAdapter};
use ao_config::{Config, PrpConfig, ProjectConfig};
use ao_core::{
    keys, Activity, Clock, EventType, Priority, PrpPhase, Session, SessionId, SessionStatus,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Lines of terminal tail fed to activity detection.
const TERMINAL_TAIL_LINES: u32 = 40;

/// Result of one poll tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    /// True when the single-flight guard skipped this tick.
    pub skipped: bool,
    /// Non-terminal sessions probed.
    pub checked: usize,
    /// Status transitions persisted.
    pub transitions: usize,
}

#[derive(Debug, Clone, Copy)]
struct TrackedSession {
    status: SessionStatus,
    phase: Option<PrpPhase>,
}

struct PrProbe {
    state: PrState,
    ci_failing: bool,
    review: ReviewDecision,
    mergeable: bool,
}

/// The poll engine. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct LifecycleManager<C: Clock> {
    sm: Arc<SessionManager<C>>,
    config: Arc<Config>,
    router: NotificationRouter,
    reactions: Arc<ReactionEngine<C>>,
    tracked: Arc<Mutex<HashMap<SessionId, TrackedSession>>>,
    tick_running: Arc<AtomicBool>,
    all_complete_fired: Arc<AtomicBool>,
    clock: C,
}

impl<C: Clock> LifecycleManager<C> {
    pub fn new(
        sm: Arc<SessionManager<C>>,
        config: Arc<Config>,
        registry: Arc<PluginRegistry>,
        clock: C,
    ) -> Self {
        Self {
            sm,
            config: config.clone(),
            router: NotificationRouter::new(config, registry),
            reactions: Arc::new(ReactionEngine::new(clock.clone())),
            tracked: Arc::new(Mutex::new(HashMap::new())),
            tick_running: Arc::new(AtomicBool::new(false)),
            all_complete_fired: Arc::new(AtomicBool::new(false)),
            clock,
        }
    }

    /// The reaction engine, shared with anything that needs to clear state.
    pub fn reactions(&self) -> &Arc<ReactionEngine<C>> {
        &self.reactions
    }

    /// Poll forever at the configured period.
    pub async fn run(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let report = self.tick().await;
            if report.skipped {
                tracing::debug!("tick skipped: previous tick still running");
            }
        }
    }

    /// One poll pass. Re-entrancy is excluded by a single-flight guard.
    pub async fn tick(&self) -> TickReport {
        if self.tick_running.swap(true, Ordering::SeqCst) {
            return TickReport { skipped: true, ..TickReport::default() };
        }
        let report = self.tick_inner().await;
        self.tick_running.store(false, Ordering::SeqCst);
        report
    }

    async fn tick_inner(&self) -> TickReport {
        let sessions = match self.sm.sessions(None).await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(error = %e, "session list failed, skipping tick");
                return TickReport::default();
            }
        };
        let live: HashSet<SessionId> = sessions.iter().map(|s| s.id.clone()).collect();

        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        let limit = sessions.len().clamp(1, cores * 4);
        let semaphore = Arc::new(Semaphore::new(limit));

        let mut statuses = Vec::with_capacity(sessions.len());
        let mut set = JoinSet::new();
        let mut checked = 0;
        for session in sessions {
            if session.status.is_terminal() {
                statuses.push(session.status);
                continue;
            }
            checked += 1;
            let this = self.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                this.check_session(session).await
            });
        }

        let mut transitions = 0;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((status, transitioned)) => {
                    statuses.push(status);
                    if transitioned {
                        transitions += 1;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "session check task failed"),
            }
        }

        if !statuses.is_empty()
            && statuses.iter().all(|s| s.is_terminal())
            && !self.all_complete_fired.swap(true, Ordering::SeqCst)
        {
            self.fire_all_complete().await;
        }

        self.tracked.lock().retain(|id, _| live.contains(id));
        self.reactions.prune(&live);

        TickReport { skipped: false, checked, transitions }
    }

    /// Check one session. Every failure inside is logged and contained.
    async fn check_session(&self, session: Session) -> (SessionStatus, bool) {
        let Some(project) = self.config.project(&session.project_id) else {
            tracing::warn!(session = %session.id, project = %session.project_id, "unknown project");
            return (session.status, false);
        };
        let plugins = match self.sm.resolve_plugins(session.project_id.as_str(), project) {
            Ok(plugins) => plugins,
            Err(e) => {
                tracing::warn!(session = %session.id, error = %e, "plugins unresolved");
                return (session.status, false);
            }
        };

        // Old status: the further-along of what this process remembers and
        // what is persisted (the agent-side hook also writes status).
        let persisted = session.status;
        let remembered = self.tracked.lock().get(&session.id).map(|t| t.status);
        let old = remembered
            .map(|r| SessionStatus::max_by_rank(r, persisted))
            .unwrap_or(persisted);

        let new = self.derive_status(&session, &plugins, old).await;
        let transitioned = new != old;
        if transitioned {
            self.handle_transition(&session, project, &plugins, old, new).await;
        } else {
            self.tracked
                .lock()
                .entry(session.id.clone())
                .or_insert(TrackedSession { status: old, phase: session.prp_phase });
        }

        // Reactions run every tick the condition holds: that is what gives
        // send-to-agent its retry cadence.
        let event = EventType::for_transition(new);
        let mut reaction_handled = false;
        if let Some(key) = event.and_then(|e| e.reaction_key()) {
            if let Some(reaction) = self.config.reaction_for(project, key) {
                let mut current = session.clone();
                current.status = new;
                self.reactions
                    .run(&self.sm, &self.router, project, &current, key, reaction)
                    .await;
                reaction_handled = true;
            }
        }

        // Unhandled transitions above info priority go to humans directly.
        if transitioned && !reaction_handled {
            if let Some(event) = event {
                if event.priority() != Priority::Info {
                    let mut current = session.clone();
                    current.status = new;
                    let body = writeback::comment_for_transition(new, &current)
                        .unwrap_or_else(|| event.as_str().to_string());
                    self.router
                        .notify(
                            project,
                            event.priority(),
                            &format!("session {}", session.id),
                            &body,
                        )
                        .await;
                }
            }
        }

        self.check_phase(&session, project, &plugins).await;

        (new, transitioned)
    }

    /// Probe order: runtime liveness, agent activity, PR state, default
    /// promotion. Probe failures preserve attention-needing states.
    async fn derive_status(
        &self,
        session: &Session,
        plugins: &ProjectPlugins,
        old: SessionStatus,
    ) -> SessionStatus {
        if let Some(handle) = &session.runtime_handle {
            if !plugins.runtime.is_alive(handle).await {
                return SessionStatus::Killed;
            }
            match plugins.runtime.output(handle, TERMINAL_TAIL_LINES).await {
                Ok(output) if !output.trim().is_empty() => {
                    match plugins.agent.detect_activity(&output) {
                        Activity::WaitingInput => return SessionStatus::NeedsInput,
                        Activity::Blocked => return SessionStatus::Stuck,
                        Activity::Active | Activity::Idle => {
                            if !plugins.agent.is_process_running(handle).await {
                                return SessionStatus::Killed;
                            }
                        }
                        Activity::Ready => {}
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(session = %session.id, error = %e, "output probe failed");
                    if old.can_reenter_working() {
                        // Do not coerce stuck/needs_input to working on a
                        // failed probe.
                        return old;
                    }
                }
            }
        }

        if let (Some(pr), Some(scm)) = (&session.pr, plugins.scm.as_ref()) {
            match probe_pr(scm.as_ref(), pr).await {
                Ok(probe) => return next_pr_status(old, &probe),
                Err(e) => {
                    tracing::warn!(session = %session.id, error = %e, "pr probe failed, keeping state");
                    return old;
                }
            }
        }

        if matches!(
            old,
            SessionStatus::Spawning | SessionStatus::Stuck | SessionStatus::NeedsInput
        ) {
            return SessionStatus::Working;
        }
        old
    }

    async fn handle_transition(
        &self,
        session: &Session,
        project: &ProjectConfig,
        plugins: &ProjectPlugins,
        old: SessionStatus,
        new: SessionStatus,
    ) {
        tracing::info!(session = %session.id, %old, %new, "status transition");

        let mut patch = BTreeMap::new();
        patch.insert(keys::STATUS.to_string(), new.as_str().to_string());
        patch.insert(keys::LAST_ACTIVITY.to_string(), self.clock.epoch_ms().to_string());
        if let Err(e) = self.sm.store().update_merge(&session.id, &patch) {
            tracing::warn!(session = %session.id, error = %e, "failed to persist transition");
        }

        if !new.is_terminal() {
            self.all_complete_fired.store(false, Ordering::SeqCst);
        }

        // Retries restart cleanly once the triggering condition goes away.
        if let Some(key) = EventType::for_transition(old).and_then(|e| e.reaction_key()) {
            self.reactions.clear(&session.id, key);
        }

        {
            let mut tracked = self.tracked.lock();
            let entry = tracked
                .entry(session.id.clone())
                .or_insert(TrackedSession { status: new, phase: session.prp_phase });
            entry.status = new;
        }

        let mut current = session.clone();
        current.status = new;
        if let Some(comment) = writeback::comment_for_transition(new, &current) {
            self.post_writeback(session, project, plugins, comment).await;
        }
    }

    /// Fire-and-forget tracker comment; failures never block the state
    /// machine.
    async fn post_writeback(
        &self,
        session: &Session,
        project: &ProjectConfig,
        plugins: &ProjectPlugins,
        comment: String,
    ) {
        let Some(issue) = &session.issue_id else { return };
        let ctx = SessionManager::<C>::tracker_ctx(project);
        if let Err(e) =
            plugins.tracker.update_issue(issue, IssueUpdate::comment(comment), &ctx).await
        {
            tracing::warn!(session = %session.id, error = %e, "writeback failed");
        }
    }

    /// Examine the methodology phase, post phase writebacks, and enforce
    /// the plan gate. Runs on every tick regardless of status transitions.
    async fn check_phase(
        &self,
        session: &Session,
        project: &ProjectConfig,
        plugins: &ProjectPlugins,
    ) {
        let Some(prp) = project.prp.as_ref().filter(|p| p.enabled) else { return };
        let observed = session.prp_phase;

        let (previous, entry_existed) = {
            let mut tracked = self.tracked.lock();
            match tracked.get_mut(&session.id) {
                Some(entry) => (entry.phase, true),
                None => {
                    tracked.insert(
                        session.id.clone(),
                        TrackedSession { status: session.status, phase: observed },
                    );
                    (observed, false)
                }
            }
        };

        // The plan gate fires on observing planning_complete, whether or
        // not this process saw the phase change happen. Flipping the phase
        // to plan_gate is what makes it fire exactly once.
        if observed == Some(PrpPhase::PlanningComplete) && prp.gates.plan {
            self.fire_plan_gate(session, project, plugins, prp).await;
            self.set_tracked_phase(&session.id, Some(PrpPhase::PlanGate));
            return;
        }

        if entry_existed && previous != observed {
            if let Some(phase) = observed {
                let enabled = match phase {
                    PrpPhase::Investigating => prp.writeback.investigation,
                    PrpPhase::Planning | PrpPhase::PlanningComplete => prp.writeback.plan,
                    PrpPhase::Implementing => prp.writeback.implementation,
                    PrpPhase::PlanGate => false,
                };
                if enabled {
                    if let Some(comment) = writeback::phase_comment(phase) {
                        self.post_writeback(session, project, plugins, comment.to_string()).await;
                    }
                }
            }
            self.set_tracked_phase(&session.id, observed);
        }
    }

    async fn fire_plan_gate(
        &self,
        session: &Session,
        project: &ProjectConfig,
        plugins: &ProjectPlugins,
        _prp: &PrpConfig,
    ) {
        tracing::info!(session = %session.id, event = %EventType::PrpPlanGate, "plan gate");

        let plan_text = session
            .workspace_path
            .as_deref()
            .and_then(writeback::find_plan_file)
            .and_then(|path| std::fs::read_to_string(path).ok())
            .unwrap_or_else(|| "(no plan artifact found)".to_string());
        let comment = writeback::plan_gate_comment(&plan_text, writeback::PLAN_COMMENT_LIMIT);
        self.post_writeback(session, project, plugins, comment).await;

        self.router
            .notify(
                project,
                Priority::Action,
                &format!("session {} plan ready", session.id),
                "plan awaiting approval on the issue",
            )
            .await;

        let mut patch = BTreeMap::new();
        patch.insert(keys::PRP_PHASE.to_string(), PrpPhase::PlanGate.as_str().to_string());
        if let Err(e) = self.sm.store().update_merge(&session.id, &patch) {
            tracing::warn!(session = %session.id, error = %e, "failed to persist plan gate");
        }
    }

    fn set_tracked_phase(&self, id: &SessionId, phase: Option<PrpPhase>) {
        let mut tracked = self.tracked.lock();
        if let Some(entry) = tracked.get_mut(id) {
            entry.phase = phase;
        }
    }

    async fn fire_all_complete(&self) {
        tracing::info!(event = %EventType::SessionAllComplete, "all sessions complete");
        let Some(reaction) = self.config.reactions.get("all-complete") else { return };
        let priority = reaction.priority.unwrap_or(Priority::Action);
        let body = reaction
            .message
            .clone()
            .unwrap_or_else(|| "all sessions reached a terminal state".to_string());
        self.router.notify_global(priority, "all sessions complete", &body).await;
    }
}

async fn probe_pr(scm: &dyn ScmAdapter, pr: &str) -> Result<PrProbe, ao_adapters::ScmError> {
    let state = scm.pr_state(pr).await?;
    let ci = scm.ci_summary(pr).await?;
    let review = scm.review_decision(pr).await?;
    let mergeable = scm.mergeability(pr).await?;
    Ok(PrProbe { state, ci_failing: ci.failing, review, mergeable })
}

/// Advance one step along the PR milestone chain toward what the probes
/// report, honoring the status DAG: a session never jumps from `working`
/// straight to `mergeable` — it lands on `pr_open` first, then the review
/// milestones, so each writeback tells the story in order.
fn next_pr_status(current: SessionStatus, probe: &PrProbe) -> SessionStatus {
    match probe.state {
        PrState::Merged => return SessionStatus::Merged,
        PrState::Closed => return SessionStatus::Terminated,
        PrState::Open => {}
    }
    if current.rank() < SessionStatus::PrOpen.rank() {
        return SessionStatus::PrOpen;
    }
    if probe.ci_failing {
        return SessionStatus::CiFailed;
    }
    match probe.review {
        ReviewDecision::ChangesRequested => SessionStatus::ChangesRequested,
        ReviewDecision::Approved => {
            if probe.mergeable
                && matches!(current, SessionStatus::Approved | SessionStatus::Mergeable)
            {
                SessionStatus::Mergeable
            } else {
                SessionStatus::Approved
            }
        }
        ReviewDecision::Pending => SessionStatus::ReviewPending,
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
