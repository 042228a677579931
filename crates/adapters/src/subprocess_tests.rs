// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn captures_stdout_of_successful_command() {
    let mut cmd = Command::new("echo");
    cmd.arg("hello");
    let out = run_capture(cmd, Duration::from_secs(5), "echo").await.unwrap();
    assert_eq!(out, "hello");
}

#[tokio::test]
async fn nonzero_exit_is_an_error_with_stderr() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "echo boom >&2; exit 3"]);
    let err = run_capture(cmd, Duration::from_secs(5), "sh").await.unwrap_err();
    assert!(err.contains("boom"), "{err}");
}

#[tokio::test]
async fn missing_binary_is_spawn_error() {
    let cmd = Command::new("definitely-not-a-real-binary-ao");
    let err = run_with_timeout(cmd, Duration::from_secs(5), "missing").await;
    assert!(matches!(err, Err(SubprocessError::Spawn { .. })));
}

#[tokio::test]
async fn slow_command_times_out() {
    let mut cmd = Command::new("sleep");
    cmd.arg("5");
    let err = run_with_timeout(cmd, Duration::from_millis(50), "sleep").await;
    assert!(matches!(err, Err(SubprocessError::TimedOut { .. })));
}
