// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed plugin registry.
//!
//! One map per slot, populated once at startup and read-only afterwards.
//! A name within a slot resolves to an implementation of that slot's
//! capability set; unknown names resolve to nothing and the caller decides
//! whether that is fatal (spawn) or skippable (notifier fan-out).

use crate::agent::{AgentAdapter, ClaudeAgent};
use crate::notify::{DesktopNotify, NotifyAdapter};
use crate::runtime::{RuntimeAdapter, TmuxRuntime};
use crate::scm::{GithubScm, ScmAdapter};
use crate::tracker::{GithubTracker, TrackerAdapter};
use crate::workspace::{WorkspaceAdapter, WorktreeWorkspace};
use std::collections::HashMap;
use std::sync::Arc;

/// Closed-world registry of named plugin instances.
pub struct PluginRegistry {
    runtimes: HashMap<String, Arc<dyn RuntimeAdapter>>,
    agents: HashMap<String, Arc<dyn AgentAdapter>>,
    workspaces: HashMap<String, Arc<dyn WorkspaceAdapter>>,
    trackers: HashMap<String, Arc<dyn TrackerAdapter>>,
    scms: HashMap<String, Arc<dyn ScmAdapter>>,
    notifiers: HashMap<String, Arc<dyn NotifyAdapter>>,
}

impl PluginRegistry {
    /// The stock wiring: tmux runtime, claude agent, worktree workspaces,
    /// GitHub tracker and SCM, desktop notifications.
    pub fn standard() -> Self {
        RegistryBuilder::new()
            .runtime("tmux", TmuxRuntime::new())
            .agent("claude", ClaudeAgent::new())
            .workspace("worktree", WorktreeWorkspace::new())
            .tracker("github", GithubTracker::new())
            .scm("github", GithubScm::new())
            .notifier("desktop", DesktopNotify::new())
            .build()
    }

    pub fn runtime(&self, name: &str) -> Option<Arc<dyn RuntimeAdapter>> {
        self.runtimes.get(name).cloned()
    }

    pub fn agent(&self, name: &str) -> Option<Arc<dyn AgentAdapter>> {
        self.agents.get(name).cloned()
    }

    pub fn workspace(&self, name: &str) -> Option<Arc<dyn WorkspaceAdapter>> {
        self.workspaces.get(name).cloned()
    }

    pub fn tracker(&self, name: &str) -> Option<Arc<dyn TrackerAdapter>> {
        self.trackers.get(name).cloned()
    }

    pub fn scm(&self, name: &str) -> Option<Arc<dyn ScmAdapter>> {
        self.scms.get(name).cloned()
    }

    pub fn notifier(&self, name: &str) -> Option<Arc<dyn NotifyAdapter>> {
        self.notifiers.get(name).cloned()
    }
}

/// Builder used at startup; after [`RegistryBuilder::build`] the registry
/// never changes.
#[derive(Default)]
pub struct RegistryBuilder {
    runtimes: HashMap<String, Arc<dyn RuntimeAdapter>>,
    agents: HashMap<String, Arc<dyn AgentAdapter>>,
    workspaces: HashMap<String, Arc<dyn WorkspaceAdapter>>,
    trackers: HashMap<String, Arc<dyn TrackerAdapter>>,
    scms: HashMap<String, Arc<dyn ScmAdapter>>,
    notifiers: HashMap<String, Arc<dyn NotifyAdapter>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runtime(mut self, name: &str, adapter: impl RuntimeAdapter) -> Self {
        self.runtimes.insert(name.to_string(), Arc::new(adapter));
        self
    }

    pub fn agent(mut self, name: &str, adapter: impl AgentAdapter) -> Self {
        self.agents.insert(name.to_string(), Arc::new(adapter));
        self
    }

    pub fn workspace(mut self, name: &str, adapter: impl WorkspaceAdapter) -> Self {
        self.workspaces.insert(name.to_string(), Arc::new(adapter));
        self
    }

    pub fn tracker(mut self, name: &str, adapter: impl TrackerAdapter) -> Self {
        self.trackers.insert(name.to_string(), Arc::new(adapter));
        self
    }

    pub fn scm(mut self, name: &str, adapter: impl ScmAdapter) -> Self {
        self.scms.insert(name.to_string(), Arc::new(adapter));
        self
    }

    pub fn notifier(mut self, name: &str, adapter: impl NotifyAdapter) -> Self {
        self.notifiers.insert(name.to_string(), Arc::new(adapter));
        self
    }

    pub fn build(self) -> PluginRegistry {
        PluginRegistry {
            runtimes: self.runtimes,
            agents: self.agents,
            workspaces: self.workspaces,
            trackers: self.trackers,
            scms: self.scms,
            notifiers: self.notifiers,
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
