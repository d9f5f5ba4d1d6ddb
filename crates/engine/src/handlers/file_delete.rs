// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tag revision after a file is deleted.
//!
//! The job payload carries a snapshot of the already-deleted file. Catalog
//! rows are dropped only after the LLM call: the revise prompt still needs
//! the pre-deletion project TOC.

use super::tag::run_tag_flow;
use super::{HandlerError, JobHandler};
use crate::context::JobContext;
use crate::messages;
use async_trait::async_trait;
use tf_core::{Clock, Job, JobRequest, JobResult};

pub struct FileDeleteGenerator;

#[async_trait]
impl<C: Clock> JobHandler<C> for FileDeleteGenerator {
    async fn execute(&self, ctx: &JobContext<C>, job: &Job) -> Result<JobResult, HandlerError> {
        let JobRequest::FileDeleteGenerator(req) = &job.request else {
            return Err(HandlerError::Other("mismatched request payload".to_string()));
        };

        let mut result = JobResult::new(1);
        result.bump_done();
        result.append_log(
            ctx.now(),
            &messages::process_file_delete_config(job.locale, &req.file.file_name),
        );

        let toc = tf_split::extract_table_of_contents(&req.file.content);
        let deleted_toc =
            serde_json::to_string(&toc).map_err(|e| HandlerError::Other(e.to_string()))?;
        run_tag_flow(ctx, job, req.toc_build_action, &mut result, &deleted_toc, "").await?;

        ctx.store.bulk_delete_catalogs(&job.actor(), &[req.file.id.clone()])?;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "file_delete_tests.rs"]
mod tests;
