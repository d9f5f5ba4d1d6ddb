// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The [`Store`]: typed repositories over the shared [`State`].
//!
//! One `RwLock` guards the whole state, which is what makes compound
//! operations (node-success accounting, default-model flips, LoRA
//! transitions) atomic without a second locking layer.

mod deploy;
mod documents;
mod finetune;
mod jobs;
mod machines;
mod releases;

pub use finetune::NodeSuccess;
pub use jobs::JobFilter;

use crate::error::StorageError;
use crate::snapshot;
use crate::state::State;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tf_core::{Actor, Clock, Record};

#[derive(Clone)]
pub struct Store<C: Clock> {
    state: Arc<RwLock<State>>,
    path: Option<PathBuf>,
    clock: C,
}

impl<C: Clock> Store<C> {
    /// Open (or create) the snapshot at `path`.
    pub fn open(path: impl Into<PathBuf>, clock: C) -> Result<Self, StorageError> {
        let path = path.into();
        let state = snapshot::load(&path)?;
        Ok(Self { state: Arc::new(RwLock::new(state)), path: Some(path), clock })
    }

    /// A store that never touches disk. For tests.
    pub fn in_memory(clock: C) -> Self {
        Self { state: Arc::new(RwLock::new(State::default())), path: None, clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.state.read())
    }

    /// Run a mutation and, on success, rewrite the snapshot while still
    /// holding the write lock so saves are serialized.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut State, u64) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let mut state = self.state.write();
        let now = self.clock.epoch_secs();
        let result = f(&mut state, now)?;
        if let Some(path) = &self.path {
            snapshot::save(path, &state, now)?;
        }
        Ok(result)
    }
}

/// Stamp a freshly inserted row.
fn stamp_new<T: Record>(row: &mut T, now: u64) {
    let meta = row.meta_mut();
    meta.created_at = now;
    meta.updated_at = now;
    meta.is_deleted = 0;
}

fn get_row<'a, T: Record>(
    map: &'a HashMap<String, T>,
    actor: &Actor,
    kind: &'static str,
    id: &str,
) -> Result<&'a T, StorageError> {
    map.get(id).filter(|r| r.visible_to(actor)).ok_or_else(|| StorageError::not_found(kind, id))
}

fn get_row_mut<'a, T: Record>(
    map: &'a mut HashMap<String, T>,
    actor: &Actor,
    kind: &'static str,
    id: &str,
) -> Result<&'a mut T, StorageError> {
    match map.get_mut(id) {
        Some(r) if r.visible_to(actor) => Ok(r),
        _ => Err(StorageError::not_found(kind, id)),
    }
}

fn visible<'a, T: Record>(
    map: &'a HashMap<String, T>,
    actor: &'a Actor,
) -> impl Iterator<Item = &'a T> {
    map.values().filter(move |r| r.visible_to(actor))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
