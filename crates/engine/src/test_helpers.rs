// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for engine tests: fake adapters wired into a registry,
//! a real metadata store in a tempdir, and a controllable clock.

use crate::lifecycle::LifecycleManager;
use crate::session::SessionManager;
use crate::trigger::TriggerEngine;
use ao_adapters::{
    FakeAgent, FakeNotify, FakeRuntime, FakeScm, FakeTracker, FakeWorkspace, PluginRegistry,
    RegistryBuilder,
};
use ao_config::Config;
use ao_core::{FakeClock, ProjectId, SessionId};
use ao_storage::MetadataStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub(crate) const BASE_YAML: &str = r#"
defaults:
  runtime: fake
  agent: fake
  workspace: fake
  notifiers: [fake]
notificationRouting:
  urgent: [fake]
  action: [fake]
  warning: [fake]
projects:
  app:
    repo: org/app
    path: __REPO__
    tracker:
      plugin: fake
    scm: fake
    webhooks:
      github:
        secret: s3cret
    triggers:
      - on: issue.labeled
        label: agent-work
"#;

pub(crate) struct Harness {
    pub state: TempDir,
    pub config: Arc<Config>,
    pub registry: Arc<PluginRegistry>,
    pub store: Arc<MetadataStore>,
    pub sm: Arc<SessionManager<FakeClock>>,
    pub clock: FakeClock,
    pub runtime: FakeRuntime,
    pub agent: FakeAgent,
    pub workspace: FakeWorkspace,
    pub tracker: FakeTracker,
    pub scm: FakeScm,
    pub notify: FakeNotify,
}

pub(crate) fn harness() -> Harness {
    harness_with(BASE_YAML)
}

pub(crate) fn harness_with(yaml: &str) -> Harness {
    let state = TempDir::new().unwrap();
    let repo = state.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    let config_path = state.path().join("ao.yaml");
    std::fs::write(&config_path, yaml.replace("__REPO__", &repo.display().to_string())).unwrap();
    let config = Arc::new(Config::load(&config_path).unwrap());

    let runtime = FakeRuntime::new();
    let agent = FakeAgent::new();
    let workspace = FakeWorkspace::new();
    let tracker = FakeTracker::new();
    let scm = FakeScm::new();
    let notify = FakeNotify::new();
    tracker.add_issue(42, "Fix the flaky test", "https://github.com/org/app/issues/42");

    let registry = Arc::new(
        RegistryBuilder::new()
            .runtime("fake", runtime.clone())
            .agent("fake", agent.clone())
            .workspace("fake", workspace.clone())
            .tracker("fake", tracker.clone())
            .scm("fake", scm.clone())
            .notifier("fake", notify.clone())
            .build(),
    );
    let store = Arc::new(MetadataStore::open(&state.path().join("store")).unwrap());
    let clock = FakeClock::new();
    let sm = Arc::new(SessionManager::new(
        config.clone(),
        registry.clone(),
        store.clone(),
        state.path().join("state"),
        clock.clone(),
    ));

    Harness {
        state,
        config,
        registry,
        store,
        sm,
        clock,
        runtime,
        agent,
        workspace,
        tracker,
        scm,
        notify,
    }
}

impl Harness {
    pub fn lifecycle(&self) -> LifecycleManager<FakeClock> {
        LifecycleManager::new(
            self.sm.clone(),
            self.config.clone(),
            self.registry.clone(),
            self.clock.clone(),
        )
    }

    pub fn triggers(&self) -> TriggerEngine<FakeClock> {
        TriggerEngine::new(Duration::from_secs(600), self.clock.clone())
    }

    pub fn spawn_request(&self, issue: &str) -> crate::session::SpawnRequest {
        crate::session::SpawnRequest {
            project_id: ProjectId::new("app"),
            issue_id: issue.to_string(),
            prompt: None,
            branch: None,
        }
    }

    /// Seed a session record directly in the store, bypassing spawn.
    pub fn seed_session(&self, id: &str, fields: &[(&str, &str)]) -> SessionId {
        let id = SessionId::new(id);
        self.store.reserve(&id).unwrap();
        let patch: BTreeMap<String, String> =
            fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.store.update_merge(&id, &patch).unwrap();
        id
    }

    pub fn session_field(&self, id: &SessionId, key: &str) -> Option<String> {
        self.store.read(id).unwrap().and_then(|map| map.get(key).cloned())
    }
}
