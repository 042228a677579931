// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage root derivation.
//!
//! Each orchestrator instance owns a storage root keyed by a short content
//! hash of its configuration file path, so independent orchestrators on one
//! host never collide.

use crate::store::StoreError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Environment override for the state directory (used by tests and CI).
pub const STATE_DIR_ENV: &str = "AO_STATE_DIR";

/// The per-user state directory: `$AO_STATE_DIR`, else the platform state
/// dir (`~/.local/state/ao` on Linux), else `~/.ao`.
pub fn state_root() -> Result<PathBuf, StoreError> {
    if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    if let Some(dir) = dirs::state_dir() {
        return Ok(dir.join("ao"));
    }
    dirs::home_dir()
        .map(|home| home.join(".ao"))
        .ok_or(StoreError::NoStateDir)
}

/// Short content hash of a configuration path: first 8 hex chars of
/// sha256 over the absolute path string.
pub fn config_hash(config_path: &Path) -> String {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    let digest = Sha256::digest(canonical.display().to_string().as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in &digest[..4] {
        use std::fmt::Write;
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

/// Storage root for one orchestrator: `<state_root>/<hash8(config_path)>`.
pub fn storage_root_for_config(config_path: &Path) -> Result<PathBuf, StoreError> {
    Ok(state_root()?.join(config_hash(config_path)))
}

#[cfg(test)]
#[path = "root_tests.rs"]
mod tests;
