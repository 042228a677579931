// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const ALL: [SessionStatus; 15] = [
    SessionStatus::Spawning,
    SessionStatus::Working,
    SessionStatus::NeedsInput,
    SessionStatus::Stuck,
    SessionStatus::PrOpen,
    SessionStatus::CiFailed,
    SessionStatus::ReviewPending,
    SessionStatus::ChangesRequested,
    SessionStatus::Approved,
    SessionStatus::Mergeable,
    SessionStatus::Merged,
    SessionStatus::Errored,
    SessionStatus::Killed,
    SessionStatus::Terminated,
    SessionStatus::Done,
];

#[test]
fn parse_roundtrips_every_status() {
    for status in ALL {
        assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(SessionStatus::parse("bogus"), None);
}

#[test]
fn ranks_are_distinct() {
    let mut ranks: Vec<u8> = ALL.iter().map(|s| s.rank()).collect();
    ranks.sort_unstable();
    ranks.dedup();
    assert_eq!(ranks.len(), ALL.len());
}

#[yare::parameterized(
    merged     = { SessionStatus::Merged },
    killed     = { SessionStatus::Killed },
    terminated = { SessionStatus::Terminated },
    errored    = { SessionStatus::Errored },
    done       = { SessionStatus::Done },
)]
fn terminal_statuses(status: SessionStatus) {
    assert!(status.is_terminal());
}

#[yare::parameterized(
    spawning    = { SessionStatus::Spawning },
    working     = { SessionStatus::Working },
    needs_input = { SessionStatus::NeedsInput },
    stuck       = { SessionStatus::Stuck },
    pr_open     = { SessionStatus::PrOpen },
    mergeable   = { SessionStatus::Mergeable },
)]
fn non_terminal_statuses(status: SessionStatus) {
    assert!(!status.is_terminal());
}

#[test]
fn only_needs_input_and_stuck_reenter_working() {
    for status in ALL {
        let expected =
            matches!(status, SessionStatus::NeedsInput | SessionStatus::Stuck);
        assert_eq!(status.can_reenter_working(), expected, "{status}");
    }
}

#[test]
fn max_by_rank_prefers_further_along() {
    assert_eq!(
        SessionStatus::max_by_rank(SessionStatus::Working, SessionStatus::PrOpen),
        SessionStatus::PrOpen
    );
    assert_eq!(
        SessionStatus::max_by_rank(SessionStatus::Merged, SessionStatus::Working),
        SessionStatus::Merged
    );
    assert_eq!(
        SessionStatus::max_by_rank(SessionStatus::Working, SessionStatus::Working),
        SessionStatus::Working
    );
}

#[test]
fn serde_uses_snake_case() {
    let json = serde_json::to_string(&SessionStatus::ChangesRequested).unwrap();
    assert_eq!(json, "\"changes_requested\"");
}
