// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes for sessions, projects, and runtime handles.
//!
//! SessionId identifies one attempt at one issue and doubles as the metadata
//! file name, so it is restricted to `[A-Za-z0-9_-]+`. RuntimeHandle is the
//! opaque token returned by a runtime plugin (typically a terminal-multiplexer
//! session name) and carries no validity rules of its own.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Unique identifier for a session, shaped `{prefix}-{n}`.
    ///
    /// Used as the metadata file name, so the character set is restricted
    /// (see [`SessionId::is_valid`]).
    pub struct SessionId;
}

string_id! {
    /// Configured project key.
    pub struct ProjectId;
}

string_id! {
    /// Opaque handle identifying a running agent inside a runtime plugin.
    pub struct RuntimeHandle;
}

impl SessionId {
    /// Whether the id is safe to use as a file name: `^[A-Za-z0-9_-]+$`.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// Parse the numeric suffix of an id shaped `{prefix}-{n}`.
    ///
    /// Returns `None` when the prefix does not match or the suffix is not a
    /// bare integer.
    pub fn sequence(&self, prefix: &str) -> Option<u64> {
        let rest = self.0.strip_prefix(prefix)?.strip_prefix('-')?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    }

    /// Sort key splitting the id at its final `-{n}` suffix so `app-10`
    /// orders after `app-2`.
    pub fn sort_key(&self) -> (&str, u64) {
        if let Some(pos) = self.0.rfind('-') {
            let (head, tail) = self.0.split_at(pos);
            if let Ok(n) = tail[1..].parse() {
                return (head, n);
            }
        }
        (self.0.as_str(), 0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
