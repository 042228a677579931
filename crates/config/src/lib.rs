// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ao-config: the orchestrator's YAML configuration contract.
//!
//! Projects, trigger rules, reactions, notification routing, and methodology
//! settings. Parsing is strict where it matters (trigger kinds, reaction
//! actions) and opaque where trackers need room (`tracker` extras).

mod duration;
mod loader;
mod schema;

pub use duration::{parse_duration, EscalateAfter};
pub use loader::ConfigError;
pub use schema::{
    Config, Defaults, GithubHook, NotificationRouting, PlaneHook, PrpConfig, PrpGates,
    PrpWriteback, ProjectConfig, ReactionAction, ReactionConfig, TrackerConfig, TriggerAction,
    TriggerRule, WebhooksConfig,
};
