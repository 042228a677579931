// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ao-adapters: plugin capability sets and their stock implementations.
//!
//! Each external concern — runtime, agent, workspace, tracker, SCM,
//! notifications — is a trait; implementations register by name in the
//! [`PluginRegistry`] at startup. Unit tests substitute fakes through the
//! same registry.

pub mod agent;
pub mod notify;
pub mod registry;
pub mod runtime;
pub mod scm;
pub mod subprocess;
pub mod tracker;
pub mod workspace;

pub use agent::{AgentAdapter, AgentAdapterError, ClaudeAgent, LaunchSpec};
pub use notify::{DesktopNotify, Notification, NotifyAdapter, NotifyError};
pub use registry::{PluginRegistry, RegistryBuilder};
pub use runtime::{RuntimeAdapter, RuntimeError, StartSpec, TmuxRuntime};
pub use scm::{CiSummary, GithubScm, PrState, ReviewDecision, ScmAdapter, ScmError};
pub use tracker::{
    GithubTracker, Issue, IssueUpdate, TrackerAdapter, TrackerContext, TrackerError,
};
pub use workspace::{CreateSpec, Workspace, WorkspaceAdapter, WorkspaceError, WorktreeWorkspace};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgent, FakeNotify, FakeRuntime, FakeScm, FakeTracker, FakeWorkspace};
