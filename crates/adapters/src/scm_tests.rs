// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn all_checks_green_is_neither_failing_nor_pending() {
    let json = json!({"statusCheckRollup": [
        {"conclusion": "SUCCESS"},
        {"conclusion": "SKIPPED"},
    ]});
    assert_eq!(summarize_checks(&json), CiSummary { failing: false, pending: false });
}

#[test]
fn one_failure_marks_failing() {
    let json = json!({"statusCheckRollup": [
        {"conclusion": "SUCCESS"},
        {"conclusion": "FAILURE"},
    ]});
    assert!(summarize_checks(&json).failing);
}

#[test]
fn missing_conclusion_is_pending() {
    let json = json!({"statusCheckRollup": [
        {"status": "IN_PROGRESS"},
    ]});
    let summary = summarize_checks(&json);
    assert!(summary.pending);
    assert!(!summary.failing);
}

#[test]
fn no_checks_at_all_is_clean() {
    assert_eq!(summarize_checks(&json!({})), CiSummary::default());
}

#[yare::parameterized(
    approved = { "APPROVED", ReviewDecision::Approved },
    changes  = { "CHANGES_REQUESTED", ReviewDecision::ChangesRequested },
    required = { "REVIEW_REQUIRED", ReviewDecision::Pending },
)]
fn review_decisions(raw: &str, expected: ReviewDecision) {
    let json = json!({ "reviewDecision": raw });
    assert_eq!(parse_review_decision(&json), expected);
}

#[test]
fn null_review_decision_is_pending() {
    let json = json!({ "reviewDecision": null });
    assert_eq!(parse_review_decision(&json), ReviewDecision::Pending);
}
