// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! The whole [`State`] is written as one JSON document. Saves rotate a small
//! set of `.bak` files so a torn write never destroys the only copy.

use crate::error::StorageError;
use crate::state::State;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for migrations
    #[serde(rename = "v")]
    pub version: u32,
    /// Epoch seconds at save time
    pub saved_at: u64,
    pub state: State,
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

/// Load the snapshot at `path`, or an empty state if none exists yet.
pub fn load(path: &Path) -> Result<State, StorageError> {
    if !path.exists() {
        return Ok(State::default());
    }
    let bytes = fs::read(path)?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    Ok(snapshot.state)
}

/// Write the snapshot, keeping the previous file as a backup.
pub fn save(path: &Path, state: &State, saved_at: u64) -> Result<(), StorageError> {
    let snapshot = Snapshot { version: CURRENT_SNAPSHOT_VERSION, saved_at, state: state.clone() };
    let bytes = serde_json::to_vec(&snapshot)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        let _ = fs::rename(path, rotate_bak_path(path));
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "snapshot saved");
    Ok(())
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
