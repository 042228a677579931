// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    secs_30      = { "30s", Duration::from_secs(30) },
    mins_5       = { "5m",  Duration::from_secs(300) },
    hours_1      = { "1h",  Duration::from_secs(3600) },
    days_1       = { "1d",  Duration::from_secs(86400) },
    bare_number  = { "30",  Duration::from_secs(30) },
    ws_leading   = { " 30s ", Duration::from_secs(30) },
    long_suffix  = { "2mins", Duration::from_secs(120) },
)]
fn parse_duration_valid(input: &str, expected: Duration) {
    assert_eq!(parse_duration(input).unwrap(), expected);
}

#[yare::parameterized(
    invalid_suffix = { "30x" },
    empty_string   = { "" },
    invalid_number = { "abcs" },
    negative       = { "-3s" },
)]
fn parse_duration_invalid(input: &str) {
    assert!(parse_duration(input).is_err());
}

#[test]
fn escalate_after_count() {
    let e = EscalateAfter::Count(3);
    assert_eq!(e.count(), Some(3));
    assert_eq!(e.duration(), None);
}

#[test]
fn escalate_after_numeric_string_is_count() {
    let e = EscalateAfter::Expr("3".to_string());
    assert_eq!(e.count(), Some(3));
    assert_eq!(e.duration(), None);
}

#[test]
fn escalate_after_duration_expr() {
    let e = EscalateAfter::Expr("30m".to_string());
    assert_eq!(e.count(), None);
    assert_eq!(e.duration(), Some(Duration::from_secs(1800)));
}

#[test]
fn escalate_after_garbage_is_neither() {
    let e = EscalateAfter::Expr("soon".to_string());
    assert_eq!(e.count(), None);
    assert_eq!(e.duration(), None);
}

#[test]
fn escalate_after_yaml_forms() {
    let count: EscalateAfter = serde_yaml::from_str("3").unwrap();
    assert_eq!(count, EscalateAfter::Count(3));
    let expr: EscalateAfter = serde_yaml::from_str("\"30m\"").unwrap();
    assert_eq!(expr, EscalateAfter::Expr("30m".to_string()));
}
