// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapters for tests.
//!
//! Each fake records its calls and exposes setters for the states the engine
//! probes. Clones share state, so tests keep a handle while the registry
//! owns another.

use crate::agent::{AgentAdapter, AgentAdapterError, LaunchSpec};
use crate::notify::{Notification, NotifyAdapter, NotifyError};
use crate::runtime::{RuntimeAdapter, RuntimeError, StartSpec};
use crate::scm::{CiSummary, PrState, ReviewDecision, ScmAdapter, ScmError};
use crate::tracker::{issue_number, Issue, IssueUpdate, TrackerAdapter, TrackerContext, TrackerError};
use crate::workspace::{CreateSpec, Workspace, WorkspaceAdapter, WorkspaceError};
use ao_core::{Activity, RuntimeHandle, SessionId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---- runtime ----

#[derive(Default)]
struct FakeRuntimeState {
    starts: Vec<StartSpec>,
    dead: HashMap<String, bool>,
    outputs: HashMap<String, String>,
    sent: Vec<(String, String)>,
    stopped: Vec<String>,
    fail_start: Option<String>,
}

/// Scriptable in-memory runtime.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    inner: Arc<Mutex<FakeRuntimeState>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> Vec<StartSpec> {
        self.inner.lock().starts.clone()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.inner.lock().sent.clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.inner.lock().stopped.clone()
    }

    pub fn set_dead(&self, handle: &str) {
        self.inner.lock().dead.insert(handle.to_string(), true);
    }

    pub fn set_output(&self, handle: &str, output: &str) {
        self.inner.lock().outputs.insert(handle.to_string(), output.to_string());
    }

    pub fn fail_next_start(&self, reason: &str) {
        self.inner.lock().fail_start = Some(reason.to_string());
    }
}

#[async_trait]
impl RuntimeAdapter for FakeRuntime {
    async fn start(&self, spec: StartSpec) -> Result<RuntimeHandle, RuntimeError> {
        let mut state = self.inner.lock();
        if let Some(reason) = state.fail_start.take() {
            return Err(RuntimeError::StartFailed(reason));
        }
        let handle = RuntimeHandle::new(spec.handle_hint.clone());
        state.dead.remove(&spec.handle_hint);
        state.starts.push(spec);
        Ok(handle)
    }

    async fn is_alive(&self, handle: &RuntimeHandle) -> bool {
        !self.inner.lock().dead.get(handle.as_str()).copied().unwrap_or(false)
    }

    async fn output(&self, handle: &RuntimeHandle, _lines: u32) -> Result<String, RuntimeError> {
        Ok(self.inner.lock().outputs.get(handle.as_str()).cloned().unwrap_or_default())
    }

    async fn send(&self, handle: &RuntimeHandle, text: &str) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        if state.dead.get(handle.as_str()).copied().unwrap_or(false) {
            return Err(RuntimeError::NotFound(handle.clone()));
        }
        state.sent.push((handle.as_str().to_string(), text.to_string()));
        Ok(())
    }

    async fn stop(&self, handle: &RuntimeHandle) -> Result<(), RuntimeError> {
        let mut state = self.inner.lock();
        state.stopped.push(handle.as_str().to_string());
        state.dead.insert(handle.as_str().to_string(), true);
        Ok(())
    }
}

// ---- agent ----

struct FakeAgentState {
    activity: Activity,
    process_running: bool,
    delivered: Vec<(String, String)>,
    setups: Vec<PathBuf>,
}

/// Scriptable agent with recorded deliveries.
#[derive(Clone)]
pub struct FakeAgent {
    inner: Arc<Mutex<FakeAgentState>>,
}

impl Default for FakeAgent {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeAgentState {
                activity: Activity::Idle,
                process_running: true,
                delivered: Vec::new(),
                setups: Vec::new(),
            })),
        }
    }
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_activity(&self, activity: Activity) {
        self.inner.lock().activity = activity;
    }

    pub fn set_process_running(&self, running: bool) {
        self.inner.lock().process_running = running;
    }

    /// Messages delivered through this agent, as (handle, message).
    pub fn delivered(&self) -> Vec<(String, String)> {
        self.inner.lock().delivered.clone()
    }

    pub fn setups(&self) -> Vec<PathBuf> {
        self.inner.lock().setups.clone()
    }
}

#[async_trait]
impl AgentAdapter for FakeAgent {
    fn build_launch_command(&self, spec: &LaunchSpec) -> Vec<String> {
        let mut argv = vec!["fake-agent".to_string()];
        if let Some(file) = &spec.system_prompt_file {
            argv.push("--system-prompt-file".to_string());
            argv.push(file.display().to_string());
        }
        if !spec.prompt.is_empty() {
            argv.push(spec.prompt.clone());
        }
        argv
    }

    fn detect_activity(&self, _terminal_tail: &str) -> Activity {
        self.inner.lock().activity
    }

    async fn is_process_running(&self, _handle: &RuntimeHandle) -> bool {
        self.inner.lock().process_running
    }

    async fn post_launch_setup(
        &self,
        workspace: &Path,
        _session_id: &SessionId,
        _metadata_path: &Path,
    ) -> Result<(), AgentAdapterError> {
        self.inner.lock().setups.push(workspace.to_path_buf());
        Ok(())
    }

    async fn deliver(
        &self,
        runtime: &dyn RuntimeAdapter,
        handle: &RuntimeHandle,
        message: &str,
    ) -> Result<(), AgentAdapterError> {
        runtime
            .send(handle, message)
            .await
            .map_err(|e| AgentAdapterError::SendFailed(e.to_string()))?;
        self.inner.lock().delivered.push((handle.as_str().to_string(), message.to_string()));
        Ok(())
    }
}

// ---- workspace ----

#[derive(Default)]
struct FakeWorkspaceState {
    created: Vec<CreateSpec>,
    destroyed: Vec<PathBuf>,
    fail_create: Option<String>,
}

/// Workspace fake that creates real (empty) directories so downstream code
/// can read and write files in them.
#[derive(Clone, Default)]
pub struct FakeWorkspace {
    inner: Arc<Mutex<FakeWorkspaceState>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<CreateSpec> {
        self.inner.lock().created.clone()
    }

    pub fn destroyed(&self) -> Vec<PathBuf> {
        self.inner.lock().destroyed.clone()
    }

    pub fn fail_next_create(&self, reason: &str) {
        self.inner.lock().fail_create = Some(reason.to_string());
    }
}

#[async_trait]
impl WorkspaceAdapter for FakeWorkspace {
    async fn create(&self, spec: CreateSpec) -> Result<Workspace, WorkspaceError> {
        {
            let mut state = self.inner.lock();
            if let Some(reason) = state.fail_create.take() {
                return Err(WorkspaceError::CreateFailed(reason));
            }
            state.created.push(spec.clone());
        }
        tokio::fs::create_dir_all(&spec.path)
            .await
            .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        Ok(Workspace { path: spec.path })
    }

    async fn destroy(&self, path: &Path, _branch: Option<&str>) -> Result<(), WorkspaceError> {
        self.inner.lock().destroyed.push(path.to_path_buf());
        if path.exists() {
            tokio::fs::remove_dir_all(path)
                .await
                .map_err(|e| WorkspaceError::Io(e.to_string()))?;
        }
        Ok(())
    }
}

// ---- tracker ----

#[derive(Default)]
struct FakeTrackerState {
    issues: HashMap<u64, Issue>,
    comments: Vec<(String, String)>,
    fail_get: Option<String>,
}

/// Scriptable issue tracker with recorded writebacks.
#[derive(Clone, Default)]
pub struct FakeTracker {
    inner: Arc<Mutex<FakeTrackerState>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an issue under its number.
    pub fn add_issue(&self, number: u64, title: &str, url: &str) {
        self.inner.lock().issues.insert(
            number,
            Issue {
                id: number.to_string(),
                number: Some(number),
                title: title.to_string(),
                body: String::new(),
                state: "open".to_string(),
                labels: Vec::new(),
                url: url.to_string(),
            },
        );
    }

    /// Posted comments as (issue id, body).
    pub fn comments(&self) -> Vec<(String, String)> {
        self.inner.lock().comments.clone()
    }

    pub fn fail_next_get(&self, reason: &str) {
        self.inner.lock().fail_get = Some(reason.to_string());
    }
}

#[async_trait]
impl TrackerAdapter for FakeTracker {
    async fn get_issue(&self, id: &str, _ctx: &TrackerContext) -> Result<Issue, TrackerError> {
        let mut state = self.inner.lock();
        if let Some(reason) = state.fail_get.take() {
            return Err(TrackerError::CallFailed(reason));
        }
        issue_number(id)
            .and_then(|n| state.issues.get(&n).cloned())
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    async fn is_completed(&self, id: &str, ctx: &TrackerContext) -> Result<bool, TrackerError> {
        Ok(self.get_issue(id, ctx).await?.state == "closed")
    }

    fn issue_url(&self, id: &str, _ctx: &TrackerContext) -> String {
        issue_number(id)
            .and_then(|n| self.inner.lock().issues.get(&n).map(|i| i.url.clone()))
            .unwrap_or_else(|| id.to_string())
    }

    fn branch_name(&self, _id: &str, _ctx: &TrackerContext) -> Option<String> {
        None
    }

    async fn generate_prompt(
        &self,
        id: &str,
        ctx: &TrackerContext,
    ) -> Result<String, TrackerError> {
        let issue = self.get_issue(id, ctx).await?;
        Ok(format!("## Issue: {}\n\n{}\n", issue.title, issue.url))
    }

    async fn update_issue(
        &self,
        id: &str,
        update: IssueUpdate,
        _ctx: &TrackerContext,
    ) -> Result<(), TrackerError> {
        if let Some(comment) = update.comment {
            self.inner.lock().comments.push((id.to_string(), comment));
        }
        Ok(())
    }
}

// ---- scm ----

struct FakeScmState {
    state: PrState,
    ci: CiSummary,
    review: ReviewDecision,
    mergeable: bool,
    fail: Option<String>,
}

/// Scriptable SCM probe results.
#[derive(Clone)]
pub struct FakeScm {
    inner: Arc<Mutex<FakeScmState>>,
}

impl Default for FakeScm {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeScmState {
                state: PrState::Open,
                ci: CiSummary::default(),
                review: ReviewDecision::Pending,
                mergeable: false,
                fail: None,
            })),
        }
    }
}

impl FakeScm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, state: PrState) {
        self.inner.lock().state = state;
    }

    pub fn set_ci(&self, ci: CiSummary) {
        self.inner.lock().ci = ci;
    }

    pub fn set_review(&self, review: ReviewDecision) {
        self.inner.lock().review = review;
    }

    pub fn set_mergeable(&self, mergeable: bool) {
        self.inner.lock().mergeable = mergeable;
    }

    /// Make every probe fail until cleared.
    pub fn fail_probes(&self, reason: &str) {
        self.inner.lock().fail = Some(reason.to_string());
    }

    pub fn clear_failure(&self) {
        self.inner.lock().fail = None;
    }

    fn check(&self) -> Result<(), ScmError> {
        match &self.inner.lock().fail {
            Some(reason) => Err(ScmError::CallFailed(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ScmAdapter for FakeScm {
    async fn pr_state(&self, _pr: &str) -> Result<PrState, ScmError> {
        self.check()?;
        Ok(self.inner.lock().state)
    }

    async fn ci_summary(&self, _pr: &str) -> Result<CiSummary, ScmError> {
        self.check()?;
        Ok(self.inner.lock().ci)
    }

    async fn review_decision(&self, _pr: &str) -> Result<ReviewDecision, ScmError> {
        self.check()?;
        Ok(self.inner.lock().review)
    }

    async fn mergeability(&self, _pr: &str) -> Result<bool, ScmError> {
        self.check()?;
        Ok(self.inner.lock().mergeable)
    }
}

// ---- notify ----

/// Recording notifier.
#[derive(Clone, Default)]
pub struct FakeNotify {
    calls: Arc<Mutex<Vec<Notification>>>,
}

impl FakeNotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Notification> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotify {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.calls.lock().push(notification.clone());
        Ok(())
    }
}
