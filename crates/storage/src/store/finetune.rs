// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fine-tune config and job rows, including the node-success accounting
//! that decides which watcher publishes the release.

use super::{get_row, get_row_mut, stamp_new, visible, Store};
use crate::error::StorageError;
use tf_core::{
    Actor, Clock, FinetuneConfig, FinetuneConfigId, FinetuneJob, FinetuneJobId, FinetuneJobStatus,
    Release,
};

/// Outcome of one node's success report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSuccess {
    pub done_node_num: u32,
    pub node_count: u32,
    /// True exactly once per job: for the increment that completed the last
    /// node while the job was still `Starting`.
    pub finished: bool,
}

impl<C: Clock> Store<C> {
    pub fn add_finetune_config(
        &self,
        config: FinetuneConfig,
    ) -> Result<FinetuneConfig, StorageError> {
        self.mutate(|state, now| {
            let mut config = config;
            stamp_new(&mut config, now);
            state.finetune_configs.insert(config.id.to_string(), config.clone());
            Ok(config)
        })
    }

    /// Fetch configs in the order of `ids`, erroring on the first missing one.
    pub fn finetune_configs_by_ids(
        &self,
        actor: &Actor,
        ids: &[FinetuneConfigId],
    ) -> Result<Vec<FinetuneConfig>, StorageError> {
        self.read(|state| {
            ids.iter()
                .map(|id| get_row(&state.finetune_configs, actor, "FinetuneConfig", id).cloned())
                .collect()
        })
    }

    pub fn create_finetune_job(&self, job: FinetuneJob) -> Result<FinetuneJob, StorageError> {
        self.mutate(|state, now| {
            let mut job = job;
            stamp_new(&mut job, now);
            state.finetune_jobs.insert(job.id.to_string(), job.clone());
            Ok(job)
        })
    }

    pub fn get_finetune_job(
        &self,
        actor: &Actor,
        id: &FinetuneJobId,
    ) -> Result<FinetuneJob, StorageError> {
        self.read(|state| get_row(&state.finetune_jobs, actor, "Finetune job", id).cloned())
    }

    pub fn list_finetune_jobs(&self, actor: &Actor) -> Vec<FinetuneJob> {
        self.read(|state| {
            let mut jobs: Vec<FinetuneJob> =
                visible(&state.finetune_jobs, actor).cloned().collect();
            jobs.sort_by_key(|j| j.meta.created_at);
            jobs
        })
    }

    /// All live `Starting` jobs across groups, for watcher recovery.
    pub fn starting_finetune_jobs(&self) -> Vec<FinetuneJob> {
        self.read(|state| {
            state
                .finetune_jobs
                .values()
                .filter(|j| j.meta.is_live() && j.status == FinetuneJobStatus::Starting)
                .cloned()
                .collect()
        })
    }

    /// Apply `f` and persist. Terminal jobs are sticky: `f` is not invoked
    /// and the stored row is returned unchanged.
    pub fn update_finetune_job(
        &self,
        actor: &Actor,
        id: &FinetuneJobId,
        f: impl FnOnce(&mut FinetuneJob),
    ) -> Result<FinetuneJob, StorageError> {
        self.mutate(|state, now| {
            let job = get_row_mut(&mut state.finetune_jobs, actor, "Finetune job", id)?;
            if job.status.is_terminal() {
                return Ok(job.clone());
            }
            f(job);
            job.meta.touch(now);
            Ok(job.clone())
        })
    }

    /// Atomically record one node's successful completion.
    ///
    /// The read-modify-write runs under the state write lock, so two
    /// watchers can never both observe the increment that reaches the node
    /// count — `finished` fires for exactly one caller, which is the one
    /// that packages the artifact and publishes the release.
    pub fn record_node_success(
        &self,
        actor: &Actor,
        id: &FinetuneJobId,
    ) -> Result<NodeSuccess, StorageError> {
        self.mutate(|state, now| {
            let job = get_row_mut(&mut state.finetune_jobs, actor, "Finetune job", id)?;
            let node_count = job.node_machine_list.len() as u32;
            job.done_node_num = (job.done_node_num + 1).min(node_count);
            job.meta.touch(now);

            let finished =
                job.done_node_num == node_count && job.status == FinetuneJobStatus::Starting;
            if finished {
                job.status = FinetuneJobStatus::Success;
                job.error_info.clear();
                job.end_at = now;
            }
            Ok(NodeSuccess { done_node_num: job.done_node_num, node_count, finished })
        })
    }

    /// Insert the release and point the job at it, as one write.
    pub fn publish_release(
        &self,
        actor: &Actor,
        job_id: &FinetuneJobId,
        release: Release,
    ) -> Result<Release, StorageError> {
        self.mutate(|state, now| {
            let mut release = release;
            stamp_new(&mut release, now);
            let job = get_row_mut(&mut state.finetune_jobs, actor, "Finetune job", job_id)?;
            job.release_id = Some(release.id.clone());
            job.meta.touch(now);
            state.releases.insert(release.id.to_string(), release.clone());
            Ok(release)
        })
    }
}

#[cfg(test)]
#[path = "finetune_tests.rs"]
mod tests;
