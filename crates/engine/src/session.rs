// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session manager: spawn, list, send, kill, cleanup, restore.
//!
//! Spawn validates the issue before reserving anything, reserves the id by
//! exclusive file creation, then builds the workspace, prompts, and runtime
//! session. Any failure after reservation tears down what was created and
//! archives the metadata file, so a failed spawn leaves nothing behind.

use crate::error::{SessionError, SpawnError};
use crate::prompt;
use ao_adapters::{
    AgentAdapter, CreateSpec, LaunchSpec, PluginRegistry, RuntimeAdapter, ScmAdapter, StartSpec,
    TrackerAdapter, TrackerContext, WorkspaceAdapter,
};
use ao_config::{Config, ConfigError, ProjectConfig};
use ao_core::{keys, Clock, ProjectId, RuntimeHandle, Session, SessionId, SessionStatus};
use ao_storage::{MetadataStore, StoreError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Maximum exclusive-create attempts before giving up on id reservation.
const RESERVE_ATTEMPTS: u64 = 10;

/// Request to spawn a session for one issue.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub project_id: ProjectId,
    pub issue_id: String,
    pub prompt: Option<String>,
    pub branch: Option<String>,
}

/// Result of a best-effort kill: every step ran; failed steps are reported.
#[derive(Debug, Default)]
pub struct KillReport {
    pub errors: Vec<String>,
}

/// Plugins resolved for one project.
pub(crate) struct ProjectPlugins {
    pub runtime: Arc<dyn RuntimeAdapter>,
    pub agent: Arc<dyn AgentAdapter>,
    pub workspace: Arc<dyn WorkspaceAdapter>,
    pub tracker: Arc<dyn TrackerAdapter>,
    pub scm: Option<Arc<dyn ScmAdapter>>,
}

#[derive(Default)]
struct SpawnProgress {
    workspace: Option<(PathBuf, String)>,
    handle: Option<RuntimeHandle>,
}

/// End-to-end session operations over the metadata store and plugins.
pub struct SessionManager<C: Clock> {
    config: Arc<Config>,
    registry: Arc<PluginRegistry>,
    store: Arc<MetadataStore>,
    state_root: PathBuf,
    clock: C,
}

impl<C: Clock> SessionManager<C> {
    pub fn new(
        config: Arc<Config>,
        registry: Arc<PluginRegistry>,
        store: Arc<MetadataStore>,
        state_root: PathBuf,
        clock: C,
    ) -> Self {
        Self { config, registry, store, state_root, clock }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn store(&self) -> &Arc<MetadataStore> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn tracker_ctx(project: &ProjectConfig) -> TrackerContext {
        TrackerContext { repo: project.repo.clone(), path: project.path.clone() }
    }

    /// Resolve every plugin a project needs. SCM is optional; the rest are
    /// spawn prerequisites.
    pub(crate) fn resolve_plugins(
        &self,
        project_key: &str,
        project: &ProjectConfig,
    ) -> Result<ProjectPlugins, ConfigError> {
        let missing = |slot: &'static str| ConfigError::MissingPlugin {
            project: project_key.to_string(),
            slot,
        };
        let runtime_name = self.config.runtime_name(project).ok_or_else(|| missing("runtime"))?;
        let runtime = self.registry.runtime(runtime_name).ok_or_else(|| {
            ConfigError::UnresolvedPlugin { slot: "runtime", name: runtime_name.to_string() }
        })?;

        let agent_name = self.config.agent_name(project).ok_or_else(|| missing("agent"))?;
        let agent = self.registry.agent(agent_name).ok_or_else(|| {
            ConfigError::UnresolvedPlugin { slot: "agent", name: agent_name.to_string() }
        })?;

        let workspace_name =
            self.config.workspace_name(project).ok_or_else(|| missing("workspace"))?;
        let workspace = self.registry.workspace(workspace_name).ok_or_else(|| {
            ConfigError::UnresolvedPlugin { slot: "workspace", name: workspace_name.to_string() }
        })?;

        let tracker = self.registry.tracker(&project.tracker.plugin).ok_or_else(|| {
            ConfigError::UnresolvedPlugin {
                slot: "tracker",
                name: project.tracker.plugin.clone(),
            }
        })?;

        let scm = match project.scm.as_deref() {
            Some(name) => Some(self.registry.scm(name).ok_or_else(|| {
                ConfigError::UnresolvedPlugin { slot: "scm", name: name.to_string() }
            })?),
            None => None,
        };

        Ok(ProjectPlugins { runtime, agent, workspace, tracker, scm })
    }

    /// Spawn a session: validate issue, reserve id, create workspace,
    /// compose prompts, launch the agent, persist metadata, run the
    /// post-launch hook. Rolls back on any failure after reservation.
    pub async fn spawn(&self, req: SpawnRequest) -> Result<Session, SpawnError> {
        let project = self
            .config
            .project(&req.project_id)
            .ok_or_else(|| ConfigError::UnknownProject(req.project_id.clone()))?;
        let plugins = self.resolve_plugins(req.project_id.as_str(), project)?;
        let ctx = Self::tracker_ctx(project);

        // Validate the issue exists BEFORE reserving any resource.
        let _issue = plugins.tracker.get_issue(&req.issue_id, &ctx).await?;

        let prefix = self.config.session_prefix(&req.project_id, project).to_string();
        let id = self.reserve_next_id(&prefix)?;
        tracing::info!(session = %id, project = %req.project_id, issue = %req.issue_id, "spawning session");

        let mut progress = SpawnProgress::default();
        match self.spawn_inner(&id, &req, project, &plugins, &ctx, &mut progress).await {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "spawn failed, rolling back");
                self.rollback(&id, &plugins, progress).await;
                Err(e)
            }
        }
    }

    async fn spawn_inner(
        &self,
        id: &SessionId,
        req: &SpawnRequest,
        project: &ProjectConfig,
        plugins: &ProjectPlugins,
        ctx: &TrackerContext,
        progress: &mut SpawnProgress,
    ) -> Result<Session, SpawnError> {
        let resource = |e: &dyn std::fmt::Display| SpawnError::Resource(e.to_string());

        // Branch: explicit > tracker-derived > feat/{issue} > session/{id}.
        let branch = compose_branch(
            req.branch.as_deref(),
            plugins.tracker.branch_name(&req.issue_id, ctx).as_deref(),
            &req.issue_id,
            id,
        );

        let workspace = plugins
            .workspace
            .create(CreateSpec {
                repo_root: project.path.clone(),
                path: self.state_root.join("workspaces").join(id.as_str()),
                branch: branch.clone(),
                start_point: project.default_branch.clone(),
                create_branch: true,
            })
            .await
            .map_err(|e| resource(&e))?;
        progress.workspace = Some((workspace.path.clone(), branch.clone()));

        let prompt_text = match &req.prompt {
            Some(prompt) => prompt.clone(),
            None => {
                let issue_context =
                    plugins.tracker.generate_prompt(&req.issue_id, ctx).await.unwrap_or_else(|e| {
                        tracing::warn!(issue = %req.issue_id, error = %e, "issue prompt failed, using bare reference");
                        format!("## Issue: {}\n", req.issue_id)
                    });
                prompt::compose_prompt(&issue_context, &project.prompts)
            }
        };

        let mut system_prompt_file = None;
        if let Some(prp) = project.prp.as_ref().filter(|prp| prp.enabled) {
            let content = prompt::compose_system_prompt(&prp.gates);
            let path = prompt::write_system_prompt_file(
                &self.state_root.join("prompts"),
                req.project_id.as_str(),
                id,
                &content,
            )
            .map_err(|e| resource(&e))?;
            system_prompt_file = Some(path);
            if let Some(plugin_root) = &prp.plugin_path {
                prompt::link_methodology(plugin_root, &workspace.path).map_err(|e| resource(&e))?;
            }
        }
        for extra in &project.symlinks {
            prompt::link_extra(extra, &workspace.path).map_err(|e| resource(&e))?;
        }

        let argv = plugins.agent.build_launch_command(&LaunchSpec {
            prompt: prompt_text,
            system_prompt_file,
            model: None,
            skip_permissions: true,
            resume: false,
        });
        let handle = plugins
            .runtime
            .start(StartSpec {
                handle_hint: format!("ao-{}", id),
                argv,
                env: vec![("AO_SESSION".to_string(), id.to_string())],
                cwd: workspace.path.clone(),
            })
            .await
            .map_err(|e| resource(&e))?;
        progress.handle = Some(handle.clone());

        let now = self.clock.epoch_ms();
        let mut map = BTreeMap::new();
        map.insert(keys::PROJECT.to_string(), req.project_id.to_string());
        map.insert(keys::ISSUE.to_string(), plugins.tracker.issue_url(&req.issue_id, ctx));
        map.insert(keys::STATUS.to_string(), SessionStatus::Spawning.as_str().to_string());
        map.insert(keys::BRANCH.to_string(), branch);
        map.insert(keys::WORKTREE.to_string(), workspace.path.display().to_string());
        map.insert(keys::TMUX_NAME.to_string(), handle.to_string());
        if let Some(agent_name) = self.config.agent_name(project) {
            map.insert(keys::AGENT.to_string(), agent_name.to_string());
        }
        map.insert(keys::CREATED.to_string(), now.to_string());
        map.insert(keys::LAST_ACTIVITY.to_string(), now.to_string());
        self.store.update_merge(id, &map).map_err(|e| resource(&e))?;

        plugins
            .agent
            .post_launch_setup(&workspace.path, id, &self.store.path_for(id))
            .await
            .map_err(|e| resource(&e))?;

        Ok(Session::from_map(id.clone(), &map))
    }

    async fn rollback(&self, id: &SessionId, plugins: &ProjectPlugins, progress: SpawnProgress) {
        if let Some(handle) = progress.handle {
            if let Err(e) = plugins.runtime.stop(&handle).await {
                tracing::warn!(session = %id, error = %e, "rollback: runtime stop failed");
            }
        }
        if let Some((path, branch)) = progress.workspace {
            if let Err(e) = plugins.workspace.destroy(&path, Some(&branch)).await {
                tracing::warn!(session = %id, error = %e, "rollback: workspace destroy failed");
            }
        }
        if let Err(e) = self.store.archive(id, self.clock.epoch_ms()) {
            tracing::warn!(session = %id, error = %e, "rollback: metadata archive failed");
        }
    }

    fn reserve_next_id(&self, prefix: &str) -> Result<SessionId, SpawnError> {
        let ids = self.store.list().map_err(|e| SpawnError::Resource(e.to_string()))?;
        let start = ids.iter().filter_map(|i| i.sequence(prefix)).max().unwrap_or(0) + 1;
        for offset in 0..RESERVE_ATTEMPTS {
            let id = SessionId::new(format!("{}-{}", prefix, start + offset));
            match self.store.reserve(&id) {
                Ok(()) => return Ok(id),
                Err(StoreError::AlreadyExists(_)) => continue,
                Err(e) => return Err(SpawnError::Resource(e.to_string())),
            }
        }
        Err(SpawnError::Resource(format!(
            "id reservation exhausted after {} attempts (prefix {})",
            RESERVE_ATTEMPTS, prefix
        )))
    }

    /// Raw session records from metadata, no liveness probing. Used by the
    /// lifecycle poller (which probes itself) and the trigger guard.
    pub async fn sessions(
        &self,
        project: Option<&ProjectId>,
    ) -> Result<Vec<Session>, SessionError> {
        let mut sessions = Vec::new();
        for id in self.store.list()? {
            let Some(map) = self.store.read(&id)? else { continue };
            let session = Session::from_map(id, &map);
            if let Some(project) = project {
                if &session.project_id != project {
                    continue;
                }
            }
            sessions.push(session);
        }
        Ok(sessions)
    }

    /// Sessions with dead runtimes reconciled: a non-terminal session whose
    /// runtime handle no longer answers is marked killed, persistently.
    pub async fn list(&self, project: Option<&ProjectId>) -> Result<Vec<Session>, SessionError> {
        let mut sessions = self.sessions(project).await?;
        for session in &mut sessions {
            self.reconcile_liveness(session).await;
        }
        Ok(sessions)
    }

    /// A single session, reconciled like [`SessionManager::list`].
    pub async fn get(&self, id: &SessionId) -> Result<Option<Session>, SessionError> {
        let Some(map) = self.store.read(id)? else {
            return Ok(None);
        };
        let mut session = Session::from_map(id.clone(), &map);
        self.reconcile_liveness(&mut session).await;
        Ok(Some(session))
    }

    async fn reconcile_liveness(&self, session: &mut Session) {
        if session.status.is_terminal() {
            return;
        }
        let Some(handle) = &session.runtime_handle else { return };
        let Some(project) = self.config.project(&session.project_id) else { return };
        let Ok(plugins) = self.resolve_plugins(session.project_id.as_str(), project) else {
            return;
        };
        if plugins.runtime.is_alive(handle).await {
            return;
        }
        tracing::info!(session = %session.id, "runtime dead, marking killed");
        let mut patch = BTreeMap::new();
        patch.insert(keys::STATUS.to_string(), SessionStatus::Killed.as_str().to_string());
        patch.insert(keys::LAST_ACTIVITY.to_string(), self.clock.epoch_ms().to_string());
        if let Err(e) = self.store.update_merge(&session.id, &patch) {
            tracing::warn!(session = %session.id, error = %e, "failed to persist killed status");
        }
        session.status = SessionStatus::Killed;
    }

    /// Deliver a message to a session's agent, bounded by the agent's send
    /// timeout.
    pub async fn send(&self, id: &SessionId, message: &str) -> Result<(), SessionError> {
        let map = self.store.read(id)?.ok_or_else(|| SessionError::NotFound(id.clone()))?;
        let session = Session::from_map(id.clone(), &map);
        let project = self
            .config
            .project(&session.project_id)
            .ok_or_else(|| ConfigError::UnknownProject(session.project_id.clone()))?;
        let plugins = self.resolve_plugins(session.project_id.as_str(), project)?;
        let handle = session
            .runtime_handle
            .ok_or_else(|| SessionError::Send("session has no runtime handle".to_string()))?;

        tokio::time::timeout(
            plugins.agent.send_timeout(),
            plugins.agent.deliver(plugins.runtime.as_ref(), &handle, message),
        )
        .await
        .map_err(|_| SessionError::Send("delivery timed out".to_string()))?
        .map_err(|e| SessionError::Send(e.to_string()))?;

        let mut patch = BTreeMap::new();
        patch.insert(keys::LAST_ACTIVITY.to_string(), self.clock.epoch_ms().to_string());
        self.store.update_merge(id, &patch)?;
        Ok(())
    }

    /// Best-effort teardown: stop the runtime, destroy the workspace,
    /// archive the metadata. Failures are reported, never short-circuit.
    pub async fn kill(&self, id: &SessionId) -> Result<KillReport, SessionError> {
        let map = self.store.read(id)?.ok_or_else(|| SessionError::NotFound(id.clone()))?;
        let session = Session::from_map(id.clone(), &map);
        let mut report = KillReport::default();

        let plugins = self
            .config
            .project(&session.project_id)
            .and_then(|project| self.resolve_plugins(session.project_id.as_str(), project).ok());

        match &plugins {
            Some(plugins) => {
                if let Some(handle) = &session.runtime_handle {
                    if let Err(e) = plugins.runtime.stop(handle).await {
                        report.errors.push(format!("runtime stop: {}", e));
                    }
                }
                if let Some(path) = &session.workspace_path {
                    if let Err(e) =
                        plugins.workspace.destroy(path, session.branch.as_deref()).await
                    {
                        report.errors.push(format!("workspace destroy: {}", e));
                    }
                }
            }
            None => report.errors.push("project or plugins unresolved".to_string()),
        }

        if let Err(e) = self.store.archive(id, self.clock.epoch_ms()) {
            report.errors.push(format!("metadata archive: {}", e));
        }
        for error in &report.errors {
            tracing::warn!(session = %id, error = %error, "kill step failed");
        }
        Ok(report)
    }

    /// Bulk kill of terminal sessions older than the threshold. Returns the
    /// ids that were cleaned up.
    pub async fn cleanup(&self, older_than: Duration) -> Result<Vec<SessionId>, SessionError> {
        let cutoff = self.clock.epoch_ms().saturating_sub(older_than.as_millis() as u64);
        let mut cleaned = Vec::new();
        for session in self.sessions(None).await? {
            if session.status.is_terminal() && session.last_activity_at_ms <= cutoff {
                let id = session.id.clone();
                if let Err(e) = self.kill(&id).await {
                    tracing::warn!(session = %id, error = %e, "cleanup kill failed");
                    continue;
                }
                cleaned.push(id);
            }
        }
        Ok(cleaned)
    }

    /// Recreate the workspace and runtime for a session whose runtime died.
    pub async fn restore(&self, id: &SessionId) -> Result<Session, SessionError> {
        let map = self.store.read(id)?.ok_or_else(|| SessionError::NotFound(id.clone()))?;
        let session = Session::from_map(id.clone(), &map);
        let project = self
            .config
            .project(&session.project_id)
            .ok_or_else(|| ConfigError::UnknownProject(session.project_id.clone()))?;
        let plugins = self.resolve_plugins(session.project_id.as_str(), project)?;

        if let Some(handle) = &session.runtime_handle {
            if plugins.runtime.is_alive(handle).await {
                return Err(SessionError::Restore("runtime is still alive".to_string()));
            }
        }

        let branch = session
            .branch
            .clone()
            .ok_or_else(|| SessionError::Restore("session has no branch".to_string()))?;
        let workspace_path = session
            .workspace_path
            .clone()
            .unwrap_or_else(|| self.state_root.join("workspaces").join(id.as_str()));
        if !workspace_path.exists() {
            plugins
                .workspace
                .create(CreateSpec {
                    repo_root: project.path.clone(),
                    path: workspace_path.clone(),
                    branch: branch.clone(),
                    start_point: project.default_branch.clone(),
                    create_branch: false,
                })
                .await
                .map_err(|e| SessionError::Restore(e.to_string()))?;
        }

        let argv = plugins.agent.build_launch_command(&LaunchSpec {
            resume: true,
            skip_permissions: true,
            ..Default::default()
        });
        let handle = plugins
            .runtime
            .start(StartSpec {
                handle_hint: format!("ao-{}", id),
                argv,
                env: vec![("AO_SESSION".to_string(), id.to_string())],
                cwd: workspace_path.clone(),
            })
            .await
            .map_err(|e| SessionError::Restore(e.to_string()))?;

        let now = self.clock.epoch_ms();
        let mut patch = BTreeMap::new();
        patch.insert(keys::STATUS.to_string(), SessionStatus::Working.as_str().to_string());
        patch.insert(keys::TMUX_NAME.to_string(), handle.to_string());
        patch.insert(keys::WORKTREE.to_string(), workspace_path.display().to_string());
        patch.insert(keys::LAST_ACTIVITY.to_string(), now.to_string());
        self.store.update_merge(id, &patch)?;

        let map = self.store.read(id)?.ok_or_else(|| SessionError::NotFound(id.clone()))?;
        Ok(Session::from_map(id.clone(), &map))
    }
}

/// Branch name composition: explicit > tracker-derived > `feat/{issue}` >
/// `session/{id}`.
pub(crate) fn compose_branch(
    explicit: Option<&str>,
    tracker_derived: Option<&str>,
    issue_id: &str,
    session_id: &SessionId,
) -> String {
    if let Some(branch) = explicit.filter(|b| !b.is_empty()) {
        return branch.to_string();
    }
    if let Some(branch) = tracker_derived.filter(|b| !b.is_empty()) {
        return branch.to_string();
    }
    let sanitized = sanitize_ref(issue_id);
    if !sanitized.is_empty() {
        return format!("feat/{}", sanitized);
    }
    format!("session/{}", session_id)
}

/// Reduce an arbitrary string to a git-ref-safe segment.
fn sanitize_ref(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = true; // suppress leading dashes
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
