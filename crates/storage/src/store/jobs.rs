// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background job rows.

use super::{get_row, get_row_mut, visible, Store};
use crate::error::StorageError;
use tf_core::{
    Actor, Clock, Job, JobId, JobRequest, JobResult, JobStatus, JobType, Locale, ProjectId,
};

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub project_id: Option<ProjectId>,
    pub job_type: Option<JobType>,
}

impl<C: Clock> Store<C> {
    pub fn create_job(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        request: JobRequest,
        locale: Locale,
    ) -> Result<Job, StorageError> {
        self.mutate(|state, now| {
            let job = Job::new(actor, project_id, request, locale, now);
            state.jobs.insert(job.id.to_string(), job.clone());
            Ok(job)
        })
    }

    pub fn get_job(&self, actor: &Actor, id: &JobId) -> Result<Job, StorageError> {
        self.read(|state| get_row(&state.jobs, actor, "Job", id).cloned())
    }

    pub fn list_jobs(&self, actor: &Actor, filter: &JobFilter) -> Vec<Job> {
        self.read(|state| {
            let mut jobs: Vec<Job> = visible(&state.jobs, actor)
                .filter(|j| filter.status.is_none_or(|s| j.status == s))
                .filter(|j| filter.project_id.as_ref().is_none_or(|p| &j.project_id == p))
                .filter(|j| filter.job_type.is_none_or(|t| j.job_type() == t))
                .cloned()
                .collect();
            jobs.sort_by_key(|j| j.meta.created_at);
            jobs
        })
    }

    /// All live `Running` jobs across groups. Startup recovery re-adds these
    /// to the manager.
    pub fn running_jobs(&self) -> Vec<Job> {
        self.read(|state| {
            let mut jobs: Vec<Job> = state
                .jobs
                .values()
                .filter(|j| j.meta.is_live() && j.status == JobStatus::Running)
                .cloned()
                .collect();
            jobs.sort_by_key(|j| j.meta.created_at);
            jobs
        })
    }

    /// Persist a status/result update, merging buffered logs into the stored
    /// append-only log and draining them from `result`.
    ///
    /// Terminal states are sticky: updates against a finished job are
    /// ignored and the stored row is returned unchanged.
    pub fn update_job_status(
        &self,
        actor: &Actor,
        id: &JobId,
        status: JobStatus,
        result: &mut JobResult,
    ) -> Result<Job, StorageError> {
        self.mutate(|state, now| {
            let job = get_row_mut(&mut state.jobs, actor, "Job", id)?;
            if job.status.is_terminal() {
                result.take_logs();
                return Ok(job.clone());
            }

            let incoming = result.take_logs();
            if !incoming.is_empty() {
                if job.result.logs.is_empty() {
                    job.result.logs = incoming;
                } else {
                    job.result.logs.push('\n');
                    job.result.logs.push_str(&incoming);
                }
            }
            if let Some(progress) = result.progress {
                job.result.progress = Some(progress);
            }
            if !result.error.is_empty() {
                job.result.error = result.error.clone();
            }
            job.status = status;
            job.meta.touch(now);
            Ok(job.clone())
        })
    }

    pub fn delete_job(&self, actor: &Actor, id: &JobId) -> Result<Job, StorageError> {
        self.mutate(|state, now| {
            let job = get_row_mut(&mut state.jobs, actor, "Job", id)?;
            job.meta.soft_delete(now);
            Ok(job.clone())
        })
    }
}
