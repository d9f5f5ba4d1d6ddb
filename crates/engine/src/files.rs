// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File lifecycle, including the per-relation deletion cascade.

use crate::error::EngineError;
use crate::manager::JobManager;
use std::sync::Arc;
use tf_core::{
    Actor, Clock, FileDeleteRequest, FileId, FileSnapshot, Job, JobRequest, Locale, ProjectId,
    SourceFile, TocBuildAction,
};
use tf_storage::Store;
use tracing::info;

pub struct FileService<C: Clock> {
    store: Store<C>,
    manager: Arc<JobManager<C>>,
}

impl<C: Clock> FileService<C> {
    pub fn new(store: Store<C>, manager: Arc<JobManager<C>>) -> Self {
        Self { store, manager }
    }

    pub fn create_file(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        file_name: &str,
        content: &str,
        now: u64,
    ) -> Result<SourceFile, EngineError> {
        Ok(self.store.create_file(SourceFile::new(actor, project_id, file_name, content, now))?)
    }

    /// Delete a file and everything hanging off it, one relation at a time,
    /// then queue the tag-revision job with the file's content snapshot.
    /// The catalog rows survive until that job consumes them.
    pub fn delete_file(
        &self,
        actor: &Actor,
        file_id: &FileId,
        locale: Locale,
    ) -> Result<Job, EngineError> {
        let file = self.store.get_file(actor, file_id)?;

        self.store.delete_file(actor, file_id)?;
        let ids = [file_id.clone()];
        self.store.bulk_delete_file_pairs(actor, &ids)?;
        self.store.bulk_delete_questions_by_files(actor, &ids)?;
        self.store.bulk_delete_datasets_by_files(actor, &ids)?;
        self.store.bulk_delete_ga_pairs(actor, &ids)?;

        let job = self.store.create_job(
            actor,
            file.project_id.clone(),
            JobRequest::FileDeleteGenerator(FileDeleteRequest {
                file: FileSnapshot {
                    id: file.id.clone(),
                    file_name: file.file_name.clone(),
                    content: file.content,
                },
                toc_build_action: TocBuildAction::Revise,
            }),
            locale,
        )?;
        self.manager.add_job(job.clone());
        info!(file = %file_id, job = %job.id, "file deleted, tag revision queued");
        Ok(job)
    }
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
