// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config loading, validation, and lookup helpers.

use crate::schema::{Config, ProjectConfig, ReactionConfig};
use ao_core::{Priority, ProjectId, TriggerKind};
use std::path::Path;
use thiserror::Error;

/// Errors surfaced to callers; configuration problems are never suppressed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("project {project}: {reason}")]
    Invalid { project: String, reason: String },

    #[error("unknown project: {0}")]
    UnknownProject(ProjectId),

    #[error("project {project}: no {slot} plugin configured")]
    MissingPlugin { project: String, slot: &'static str },

    #[error("unresolved {slot} plugin: {name}")]
    UnresolvedPlugin { slot: &'static str, name: String },
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Config =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, project) in &self.projects {
            if project.tracker.plugin.is_empty() {
                return Err(ConfigError::Invalid {
                    project: key.clone(),
                    reason: "tracker.plugin must be set".to_string(),
                });
            }
            for rule in &project.triggers {
                if TriggerKind::parse(&rule.on).is_none() {
                    return Err(ConfigError::Invalid {
                        project: key.clone(),
                        reason: format!("unknown trigger event: {}", rule.on),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up a project by id.
    pub fn project(&self, id: &ProjectId) -> Option<&ProjectConfig> {
        self.projects.get(id.as_str())
    }

    /// A project's reaction for a key, falling back to the global table.
    pub fn reaction_for<'a>(&'a self, project: &'a ProjectConfig, key: &str) -> Option<&'a ReactionConfig> {
        project.reactions.get(key).or_else(|| self.reactions.get(key))
    }

    /// Session id prefix for a project.
    pub fn session_prefix<'a>(&self, id: &'a ProjectId, project: &'a ProjectConfig) -> &'a str {
        project.session_prefix.as_deref().unwrap_or(id.as_str())
    }

    /// Effective plugin name for a slot: project override, then defaults.
    pub fn runtime_name<'a>(&'a self, project: &'a ProjectConfig) -> Option<&'a str> {
        project.runtime.as_deref().or(self.defaults.runtime.as_deref())
    }

    pub fn agent_name<'a>(&'a self, project: &'a ProjectConfig) -> Option<&'a str> {
        project.agent.as_deref().or(self.defaults.agent.as_deref())
    }

    pub fn workspace_name<'a>(&'a self, project: &'a ProjectConfig) -> Option<&'a str> {
        project.workspace.as_deref().or(self.defaults.workspace.as_deref())
    }

    /// Notifier names for a priority band, falling back to the project's
    /// own notifiers, then the defaults.
    pub fn notifiers_for<'a>(
        &'a self,
        project: &'a ProjectConfig,
        priority: Priority,
    ) -> &'a [String] {
        let routed = self.notification_routing.for_priority(priority);
        if !routed.is_empty() {
            return routed;
        }
        if let Some(own) = project.notifiers.as_deref() {
            if !own.is_empty() {
                return own;
            }
        }
        &self.defaults.notifiers
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
