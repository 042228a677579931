// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    pr_open     = { SessionStatus::PrOpen, EventType::PrCreated },
    ci_failed   = { SessionStatus::CiFailed, EventType::CiFailing },
    pending     = { SessionStatus::ReviewPending, EventType::ReviewPending },
    changes     = { SessionStatus::ChangesRequested, EventType::ReviewChangesRequested },
    approved    = { SessionStatus::Approved, EventType::ReviewApproved },
    mergeable   = { SessionStatus::Mergeable, EventType::MergeReady },
    merged      = { SessionStatus::Merged, EventType::MergeCompleted },
    needs_input = { SessionStatus::NeedsInput, EventType::SessionNeedsInput },
    stuck       = { SessionStatus::Stuck, EventType::SessionStuck },
    errored     = { SessionStatus::Errored, EventType::SessionErrored },
    killed      = { SessionStatus::Killed, EventType::SessionKilled },
)]
fn transition_classification(to: SessionStatus, expected: EventType) {
    assert_eq!(EventType::for_transition(to), Some(expected));
}

#[yare::parameterized(
    spawning = { SessionStatus::Spawning },
    working  = { SessionStatus::Working },
    done     = { SessionStatus::Done },
)]
fn unclassified_transitions(to: SessionStatus) {
    assert_eq!(EventType::for_transition(to), None);
}

#[yare::parameterized(
    ci_failed   = { EventType::CiFailing, "ci-failed" },
    changes     = { EventType::ReviewChangesRequested, "changes-requested" },
    mergeable   = { EventType::MergeReady, "approved-and-green" },
    needs_input = { EventType::SessionNeedsInput, "agent-needs-input" },
    stuck       = { EventType::SessionStuck, "agent-stuck" },
    killed      = { EventType::SessionKilled, "agent-exited" },
)]
fn reaction_keys(event: EventType, key: &str) {
    assert_eq!(event.reaction_key(), Some(key));
}

#[yare::parameterized(
    pr_created = { EventType::PrCreated },
    pending    = { EventType::ReviewPending },
    approved   = { EventType::ReviewApproved },
    merged     = { EventType::MergeCompleted },
)]
fn writeback_only_events_have_no_reaction_key(event: EventType) {
    assert_eq!(event.reaction_key(), None);
}

#[test]
fn escalation_is_urgent() {
    assert_eq!(EventType::ReactionEscalated.priority(), Priority::Urgent);
}

#[test]
fn priority_parse_roundtrips() {
    for p in [Priority::Urgent, Priority::Action, Priority::Warning, Priority::Info] {
        assert_eq!(Priority::parse(p.as_str()), Some(p));
    }
    assert_eq!(Priority::parse("critical"), None);
}
