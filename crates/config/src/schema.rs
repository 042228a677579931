// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration schema.
//!
//! Field names follow the YAML contract (camelCase on the wire). Project and
//! reaction maps keep declaration order, which matters for first-match-wins
//! rule evaluation.

use crate::duration::EscalateAfter;
use ao_core::Priority;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub notification_routing: NotificationRouting,
    #[serde(default)]
    pub reactions: IndexMap<String, ReactionConfig>,
    #[serde(default)]
    pub projects: IndexMap<String, ProjectConfig>,
    /// Bind address for the webhook listener.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Poll period for the lifecycle manager, seconds.
    #[serde(default = "default_poll_secs")]
    pub poll_interval_secs: u64,
    /// Path this config was loaded from. Not part of the YAML.
    #[serde(skip)]
    pub path: PathBuf,
}

fn default_listen() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_poll_secs() -> u64 {
    30
}

/// Plugin names used when a project does not override them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Defaults {
    pub runtime: Option<String>,
    pub agent: Option<String>,
    pub workspace: Option<String>,
    #[serde(default)]
    pub notifiers: Vec<String>,
}

/// Notifier names per priority band.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationRouting {
    #[serde(default)]
    pub urgent: Vec<String>,
    #[serde(default)]
    pub action: Vec<String>,
    #[serde(default)]
    pub warning: Vec<String>,
    #[serde(default)]
    pub info: Vec<String>,
}

impl NotificationRouting {
    pub fn for_priority(&self, priority: Priority) -> &[String] {
        match priority {
            Priority::Urgent => &self.urgent,
            Priority::Action => &self.action,
            Priority::Warning => &self.warning,
            Priority::Info => &self.info,
        }
    }
}

/// One configured project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Provider-side repo identity, e.g. `org/app` for GitHub.
    pub repo: Option<String>,
    /// Local checkout the worktrees branch off.
    pub path: PathBuf,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    /// Session id prefix; the project key when absent.
    pub session_prefix: Option<String>,
    pub agent: Option<String>,
    pub runtime: Option<String>,
    pub workspace: Option<String>,
    pub scm: Option<String>,
    pub tracker: TrackerConfig,
    /// Additional prompt snippets appended after the issue context.
    #[serde(default)]
    pub prompts: Vec<String>,
    /// Extra directories symlinked into each workspace.
    #[serde(default)]
    pub symlinks: Vec<PathBuf>,
    /// Per-project reaction overrides; fall back to the global table.
    #[serde(default)]
    pub reactions: IndexMap<String, ReactionConfig>,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
    #[serde(default)]
    pub triggers: Vec<TriggerRule>,
    pub prp: Option<PrpConfig>,
    pub notifiers: Option<Vec<String>>,
}

fn default_branch() -> String {
    "main".to_string()
}

/// Tracker plugin selection plus plugin-specific extras, kept opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub plugin: String,
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Webhook secrets per provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WebhooksConfig {
    pub github: Option<GithubHook>,
    pub plane: Option<PlaneHook>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GithubHook {
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlaneHook {
    pub secret: String,
    pub workspace_id: String,
}

/// A project-level rule mapping normalized events to spawn decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TriggerRule {
    /// Normalized event name, e.g. `issue.labeled`.
    pub on: String,
    pub label: Option<String>,
    pub assignee: Option<String>,
    #[serde(default)]
    pub action: TriggerAction,
    pub comment_pattern: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerAction {
    #[default]
    Spawn,
    ResumeSession,
}

/// Automated response to a recognized event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReactionConfig {
    /// When false, the automated action is suppressed but notifications
    /// still go out.
    #[serde(default = "default_true")]
    pub auto: bool,
    pub action: ReactionAction,
    pub message: Option<String>,
    pub priority: Option<Priority>,
    pub retries: Option<u32>,
    pub escalate_after: Option<EscalateAfter>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReactionAction {
    SendToAgent,
    Notify,
    AutoMerge,
}

/// Structured-methodology settings for a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrpConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Root of the methodology plugin whose skill/rule dirs are symlinked.
    pub plugin_path: Option<PathBuf>,
    #[serde(default)]
    pub gates: PrpGates,
    #[serde(default)]
    pub writeback: PrpWriteback,
    pub prompt_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrpGates {
    #[serde(default)]
    pub plan: bool,
    #[serde(default)]
    pub pr: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PrpWriteback {
    #[serde(default = "default_true")]
    pub investigation: bool,
    #[serde(default = "default_true")]
    pub plan: bool,
    #[serde(default = "default_true")]
    pub implementation: bool,
    #[serde(default = "default_true")]
    pub pr: bool,
}

impl Default for PrpWriteback {
    fn default() -> Self {
        Self { investigation: true, plan: true, implementation: true, pr: true }
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
