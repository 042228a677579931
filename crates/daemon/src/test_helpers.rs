// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for daemon tests: fake adapters behind a real router.

use crate::server::AppCtx;
use ao_adapters::{
    FakeAgent, FakeNotify, FakeRuntime, FakeScm, FakeTracker, FakeWorkspace, RegistryBuilder,
};
use ao_config::Config;
use ao_core::FakeClock;
use ao_engine::{SessionManager, TriggerEngine};
use ao_storage::MetadataStore;
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
      plane:
        secret: plane-secret
        workspaceId: ws-123
    triggers:
      - on: issue.labeled
        label: agent-work
    prp:
      enabled: true
      gates:
        plan: true
"#;

pub(crate) struct Harness {
    pub state: TempDir,
    pub ctx: Arc<AppCtx<FakeClock>>,
    pub clock: FakeClock,
    pub runtime: FakeRuntime,
    pub agent: FakeAgent,
    pub workspace: FakeWorkspace,
    pub tracker: FakeTracker,
    pub scm: FakeScm,
    pub notify: FakeNotify,
    pub store: Arc<MetadataStore>,
}

pub(crate) fn harness() -> Harness {
    let state = TempDir::new().unwrap();
    let repo = state.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();
    let config_path = state.path().join("ao.yaml");
    std::fs::write(&config_path, BASE_YAML.replace("__REPO__", &repo.display().to_string()))
        .unwrap();
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
    let triggers = TriggerEngine::new(Duration::from_secs(600), clock.clone());
    let ctx = Arc::new(AppCtx { config, registry, sm, triggers, clock: clock.clone() });

    Harness { state, ctx, clock, runtime, agent, workspace, tracker, scm, notify, store }
}
