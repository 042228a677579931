// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration expressions and the `escalateAfter` count-or-duration field.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parse a duration string like "30s", "5m", "1h" into a Duration.
///
/// A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "" | "s" | "sec" | "secs" => 1,
        "m" | "min" | "mins" => 60,
        "h" | "hr" | "hrs" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    Ok(Duration::from_secs(num * multiplier))
}

/// The `escalateAfter` field of a reaction: either an attempt count or a
/// duration expression like `"30m"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EscalateAfter {
    Count(u32),
    Expr(String),
}

impl EscalateAfter {
    /// The attempt-count threshold, if this is a count (`3` or `"3"`).
    pub fn count(&self) -> Option<u32> {
        match self {
            EscalateAfter::Count(n) => Some(*n),
            EscalateAfter::Expr(s) => {
                let s = s.trim();
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                    s.parse().ok()
                } else {
                    None
                }
            }
        }
    }

    /// The elapsed-time threshold, if this is a duration expression.
    ///
    /// A bare number is a count, never a duration.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            EscalateAfter::Count(_) => None,
            EscalateAfter::Expr(s) => {
                if self.count().is_some() {
                    None
                } else {
                    parse_duration(s).ok()
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
