// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Release rows.

use super::{get_row, visible, Store};
use crate::error::StorageError;
use tf_core::{Actor, Clock, FinetuneJobId, Release, ReleaseId};

impl<C: Clock> Store<C> {
    pub fn get_release(&self, actor: &Actor, id: &ReleaseId) -> Result<Release, StorageError> {
        self.read(|state| get_row(&state.releases, actor, "Release", id).cloned())
    }

    pub fn list_releases(&self, actor: &Actor) -> Vec<Release> {
        self.read(|state| {
            let mut releases: Vec<Release> = visible(&state.releases, actor).cloned().collect();
            releases.sort_by_key(|r| r.meta.created_at);
            releases
        })
    }

    /// Number of live releases published from one fine-tune job.
    pub fn releases_for_job(&self, job_id: &FinetuneJobId) -> usize {
        self.read(|state| {
            state
                .releases
                .values()
                .filter(|r| r.meta.is_live() && &r.job_id == job_id)
                .count()
        })
    }
}
