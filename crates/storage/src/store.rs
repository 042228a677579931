// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session metadata files with atomic reserve / read / merge / archive.
//!
//! Reservation is the only way ids are claimed: `create_new` either wins the
//! file or fails, which is what makes concurrent spawns safe (no id is ever
//! handed out twice per storage root). Updates are read-merge-write under a
//! per-file in-process lock, landing via rename so no partial file is ever
//! observable. The agent-side hook is the only other writer and uses the
//! same rename discipline.

use crate::codec;
use ao_core::SessionId;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors from metadata store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session id already reserved: {0}")]
    AlreadyExists(SessionId),

    #[error("invalid session id: {0:?}")]
    InvalidId(String),

    #[error("could not determine state directory")]
    NoStateDir,

    #[error("metadata io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat-file metadata store for one storage root.
pub struct MetadataStore {
    sessions_dir: PathBuf,
    archive_dir: PathBuf,
    // Serializes read-merge-write cycles per file within this process.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MetadataStore {
    /// Open (creating if needed) the store under the given storage root.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let sessions_dir = root.join("sessions");
        let archive_dir = sessions_dir.join("archive");
        fs::create_dir_all(&archive_dir)?;
        Ok(Self {
            sessions_dir,
            archive_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Path of the metadata file for a session id.
    pub fn path_for(&self, id: &SessionId) -> PathBuf {
        self.sessions_dir.join(id.as_str())
    }

    /// Claim an id by exclusively creating its (empty) metadata file.
    ///
    /// This is the ONLY way ids are claimed; callers retry with the next
    /// integer suffix on [`StoreError::AlreadyExists`].
    pub fn reserve(&self, id: &SessionId) -> Result<(), StoreError> {
        if !id.is_valid() {
            return Err(StoreError::InvalidId(id.as_str().to_string()));
        }
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_for(id))
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a session's metadata, or `None` if the file does not exist.
    pub fn read(&self, id: &SessionId) -> Result<Option<BTreeMap<String, String>>, StoreError> {
        if !id.is_valid() {
            return Err(StoreError::InvalidId(id.as_str().to_string()));
        }
        match fs::read_to_string(self.path_for(id)) {
            Ok(content) => Ok(Some(codec::decode(&content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge a patch into a session's metadata.
    ///
    /// Keys absent from the patch are untouched; keys with an empty-string
    /// value are removed. Last writer wins, but the write is file-atomic:
    /// read, merge in memory, write temp, rename.
    pub fn update_merge(
        &self,
        id: &SessionId,
        patch: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let lock = self.file_lock(id);
        let _guard = lock.lock();

        let path = self.path_for(id);
        let mut map = match fs::read_to_string(&path) {
            Ok(content) => codec::decode(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        for (key, value) in patch {
            if value.is_empty() {
                map.remove(key);
            } else {
                map.insert(key.clone(), value.clone());
            }
        }

        let tmp = self.sessions_dir.join(format!(".{}.tmp", id.as_str()));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(codec::encode(&map).as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Move a session's metadata into the archive directory with a
    /// timestamp suffix. Missing files archive as a no-op.
    pub fn archive(&self, id: &SessionId, epoch_ms: u64) -> Result<(), StoreError> {
        let src = self.path_for(id);
        if !src.exists() {
            return Ok(());
        }
        let dst = self
            .archive_dir
            .join(format!("{}-{}", id.as_str(), epoch_ms));
        fs::rename(&src, &dst)?;
        self.locks.lock().remove(id.as_str());
        tracing::debug!(id = %id, dst = %dst.display(), "archived session metadata");
        Ok(())
    }

    /// All reserved ids whose file name validates as a session id, sorted
    /// naturally (`app-2` before `app-10`).
    pub fn list(&self) -> Result<Vec<SessionId>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.sessions_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let id = SessionId::new(name);
            if id.is_valid() {
                ids.push(id);
            }
        }
        ids.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(ids)
    }

    fn file_lock(&self, id: &SessionId) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(id.as_str().to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
