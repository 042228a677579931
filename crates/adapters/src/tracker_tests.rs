// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn ctx() -> TrackerContext {
    TrackerContext { repo: Some("org/app".to_string()), path: "/tmp".into() }
}

#[yare::parameterized(
    raw        = { "42", Some(42) },
    url        = { "https://github.com/org/app/issues/42", Some(42) },
    hash       = { "#7", Some(7) },
    no_digits  = { "not-an-issue", None },
    empty      = { "", None },
    multi_runs = { "v2-issue-91", Some(91) },
)]
fn issue_number_extraction(id: &str, expected: Option<u64>) {
    assert_eq!(issue_number(id), expected);
}

#[test]
fn issue_url_passes_through_urls() {
    let tracker = GithubTracker::new();
    let url = "https://github.com/org/app/issues/42";
    assert_eq!(tracker.issue_url(url, &ctx()), url);
}

#[test]
fn issue_url_builds_from_repo_and_number() {
    let tracker = GithubTracker::new();
    assert_eq!(
        tracker.issue_url("42", &ctx()),
        "https://github.com/org/app/issues/42"
    );
}

#[test]
fn issue_url_without_repo_echoes_id() {
    let tracker = GithubTracker::new();
    let no_repo = TrackerContext { repo: None, path: "/tmp".into() };
    assert_eq!(tracker.issue_url("42", &no_repo), "42");
}

#[test]
fn branch_name_uses_issue_number() {
    let tracker = GithubTracker::new();
    assert_eq!(
        tracker.branch_name("https://github.com/org/app/issues/42", &ctx()),
        Some("issue-42".to_string())
    );
    assert_eq!(tracker.branch_name("nope", &ctx()), None);
}
