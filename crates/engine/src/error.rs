// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.
//!
//! Spawn distinguishes the three failure classes callers care about:
//! configuration problems (surfaced verbatim), tracker failures (abort
//! before any resource exists), and resource failures (rolled back).
//! Probe and writeback failures never become errors — the poll loop logs
//! them and keeps the last known state.

use ao_config::ConfigError;
use ao_core::SessionId;
use ao_storage::StoreError;
use thiserror::Error;

/// Errors from [`crate::SessionManager::spawn`].
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("tracker: {0}")]
    Tracker(#[from] ao_adapters::TrackerError),

    #[error("resource: {0}")]
    Resource(String),
}

/// Errors from the remaining session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("send failed: {0}")]
    Send(String),

    #[error("restore failed: {0}")]
    Restore(String),
}
