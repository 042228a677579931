// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    simple     = { "app-1" },
    underscore = { "my_proj-12" },
    bare       = { "x" },
    mixed_case = { "App-3" },
)]
fn valid_ids(id: &str) {
    assert!(SessionId::new(id).is_valid());
}

#[yare::parameterized(
    empty     = { "" },
    slash     = { "app/1" },
    dot       = { "app.1" },
    space     = { "app 1" },
    traversal = { "../app-1" },
)]
fn invalid_ids(id: &str) {
    assert!(!SessionId::new(id).is_valid());
}

#[yare::parameterized(
    first     = { "app-1", "app", Some(1) },
    double    = { "app-10", "app", Some(10) },
    wrong     = { "web-3", "app", None },
    no_seq    = { "app-x", "app", None },
    prefix_in = { "app-1-2", "app-1", Some(2) },
)]
fn sequence_parsing(id: &str, prefix: &str, expected: Option<u64>) {
    assert_eq!(SessionId::new(id).sequence(prefix), expected);
}

#[test]
fn sort_key_orders_numerically() {
    let mut ids = vec![
        SessionId::new("app-10"),
        SessionId::new("app-2"),
        SessionId::new("app-1"),
    ];
    ids.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    let strs: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
    assert_eq!(strs, vec!["app-1", "app-2", "app-10"]);
}

#[test]
fn display_and_borrow() {
    let id = SessionId::new("app-7");
    assert_eq!(format!("{}", id), "app-7");
    assert_eq!(id, "app-7");
    let p: ProjectId = "app".into();
    assert_eq!(p.as_str(), "app");
}
