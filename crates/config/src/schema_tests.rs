// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn minimal_project_parses_with_defaults() {
    let yaml = r#"
repo: org/app
path: /srv/app
tracker:
  plugin: github
"#;
    let project: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(project.default_branch, "main");
    assert!(project.triggers.is_empty());
    assert!(project.prp.is_none());
    assert!(project.webhooks.github.is_none());
}

#[test]
fn tracker_extras_are_opaque() {
    let yaml = r#"
plugin: plane
apiKey: abc
endpoint: https://plane.example
"#;
    let tracker: TrackerConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(tracker.plugin, "plane");
    assert_eq!(tracker.extra.len(), 2);
}

#[test]
fn trigger_action_defaults_to_spawn() {
    let rule: TriggerRule = serde_yaml::from_str("on: issue.labeled\nlabel: x").unwrap();
    assert_eq!(rule.action, TriggerAction::Spawn);
}

#[test]
fn trigger_action_kebab_case() {
    let rule: TriggerRule =
        serde_yaml::from_str("on: issue.comment\naction: resume-session").unwrap();
    assert_eq!(rule.action, TriggerAction::ResumeSession);
}

#[yare::parameterized(
    send  = { "send-to-agent", ReactionAction::SendToAgent },
    notif = { "notify", ReactionAction::Notify },
    merge = { "auto-merge", ReactionAction::AutoMerge },
)]
fn reaction_action_names(name: &str, expected: ReactionAction) {
    let yaml = format!("action: {}", name);
    let reaction: ReactionConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(reaction.action, expected);
    assert!(reaction.auto);
}

#[test]
fn reaction_auto_false_parses() {
    let reaction: ReactionConfig =
        serde_yaml::from_str("action: auto-merge\nauto: false").unwrap();
    assert!(!reaction.auto);
}

#[test]
fn prp_writeback_defaults_all_on() {
    let prp: PrpConfig = serde_yaml::from_str("enabled: true").unwrap();
    assert!(prp.writeback.investigation);
    assert!(prp.writeback.plan);
    assert!(prp.writeback.implementation);
    assert!(prp.writeback.pr);
    assert!(!prp.gates.plan);
}

#[test]
fn unknown_project_field_is_rejected() {
    let yaml = r#"
path: /srv/app
tracker:
  plugin: github
bogus: true
"#;
    assert!(serde_yaml::from_str::<ProjectConfig>(yaml).is_err());
}
