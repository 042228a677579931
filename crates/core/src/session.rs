// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session record and its flat-map round-trip.
//!
//! A session is one attempt by one agent at one issue. The durable form is a
//! flat `key=value` map in the metadata store; [`Session::from_map`] and
//! [`Session::to_map`] convert between that map and the typed record.
//! Unknown keys survive the round-trip untouched.

use crate::id::{ProjectId, RuntimeHandle, SessionId};
use crate::phase::PrpPhase;
use crate::status::SessionStatus;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Canonical metadata keys. The agent-side post-tool hook writes the same
/// keys, so these names are part of the on-disk contract.
pub mod keys {
    pub const PROJECT: &str = "project";
    pub const ISSUE: &str = "issue";
    pub const STATUS: &str = "status";
    pub const BRANCH: &str = "branch";
    pub const WORKTREE: &str = "worktree";
    pub const TMUX_NAME: &str = "tmuxName";
    pub const AGENT: &str = "agent";
    pub const PR: &str = "pr";
    pub const PRP_PHASE: &str = "prpPhase";
    pub const CREATED: &str = "created";
    pub const LAST_ACTIVITY: &str = "lastActivity";
}

/// One long-lived attempt by one agent on one issue.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub project_id: ProjectId,
    pub status: SessionStatus,
    pub branch: Option<String>,
    pub workspace_path: Option<PathBuf>,
    pub runtime_handle: Option<RuntimeHandle>,
    pub agent_info: Option<String>,
    pub issue_id: Option<String>,
    pub pr: Option<String>,
    pub prp_phase: Option<PrpPhase>,
    pub created_at_ms: u64,
    pub last_activity_at_ms: u64,
    /// Keys not covered by the typed fields, preserved opaquely.
    pub extra: BTreeMap<String, String>,
}

impl Session {
    /// Build a session record from a persisted metadata map.
    ///
    /// Missing or unparsable fields degrade gracefully: an absent status
    /// reads as `spawning` (the state a freshly reserved file is in).
    pub fn from_map(id: SessionId, map: &BTreeMap<String, String>) -> Self {
        let get = |k: &str| map.get(k).filter(|v| !v.is_empty()).cloned();
        let known = [
            keys::PROJECT,
            keys::ISSUE,
            keys::STATUS,
            keys::BRANCH,
            keys::WORKTREE,
            keys::TMUX_NAME,
            keys::AGENT,
            keys::PR,
            keys::PRP_PHASE,
            keys::CREATED,
            keys::LAST_ACTIVITY,
        ];
        let extra = map
            .iter()
            .filter(|(k, _)| !known.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Session {
            id,
            project_id: ProjectId::new(get(keys::PROJECT).unwrap_or_default()),
            status: get(keys::STATUS)
                .and_then(|s| SessionStatus::parse(&s))
                .unwrap_or(SessionStatus::Spawning),
            branch: get(keys::BRANCH),
            workspace_path: get(keys::WORKTREE).map(PathBuf::from),
            runtime_handle: get(keys::TMUX_NAME).map(RuntimeHandle::new),
            agent_info: get(keys::AGENT),
            issue_id: get(keys::ISSUE),
            pr: get(keys::PR),
            prp_phase: get(keys::PRP_PHASE).and_then(|p| PrpPhase::parse(&p)),
            created_at_ms: get(keys::CREATED).and_then(|v| v.parse().ok()).unwrap_or(0),
            last_activity_at_ms: get(keys::LAST_ACTIVITY)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            extra,
        }
    }

    /// Serialize the record back to its flat form, extras included.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.extra.clone();
        map.insert(keys::PROJECT.into(), self.project_id.as_str().into());
        map.insert(keys::STATUS.into(), self.status.as_str().into());
        map.insert(keys::CREATED.into(), self.created_at_ms.to_string());
        map.insert(keys::LAST_ACTIVITY.into(), self.last_activity_at_ms.to_string());
        if let Some(v) = &self.branch {
            map.insert(keys::BRANCH.into(), v.clone());
        }
        if let Some(v) = &self.workspace_path {
            map.insert(keys::WORKTREE.into(), v.display().to_string());
        }
        if let Some(v) = &self.runtime_handle {
            map.insert(keys::TMUX_NAME.into(), v.as_str().into());
        }
        if let Some(v) = &self.agent_info {
            map.insert(keys::AGENT.into(), v.clone());
        }
        if let Some(v) = &self.issue_id {
            map.insert(keys::ISSUE.into(), v.clone());
        }
        if let Some(v) = &self.pr {
            map.insert(keys::PR.into(), v.clone());
        }
        if let Some(v) = &self.prp_phase {
            map.insert(keys::PRP_PHASE.into(), v.as_str().into());
        }
        map
    }

    /// Whether this session's issue refers to the given issue number.
    ///
    /// The issue id may be a raw number or a full URL; the number must appear
    /// as a complete digit run (so issue 4 does not match `.../42`).
    pub fn issue_matches(&self, number: u64) -> bool {
        let Some(issue) = &self.issue_id else {
            return false;
        };
        let needle = number.to_string();
        issue
            .split(|c: char| !c.is_ascii_digit())
            .any(|run| run == needle)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
