// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File splitting: chunk each file, rebuild its catalog, revise the tags.

use super::tag::run_tag_flow;
use super::{absorb_item_error, HandlerError, JobHandler};
use crate::context::JobContext;
use crate::messages;
use async_trait::async_trait;
use tf_core::{
    Catalog, CatalogId, Clock, FileId, FilePair, FilePairId, FilePairRequest, Job, JobRequest,
    JobResult, Meta, SourceFile,
};

pub struct FilePairGenerator;

#[async_trait]
impl<C: Clock> JobHandler<C> for FilePairGenerator {
    async fn execute(&self, ctx: &JobContext<C>, job: &Job) -> Result<JobResult, HandlerError> {
        let JobRequest::FilePairGenerator(req) = &job.request else {
            return Err(HandlerError::Other("mismatched request payload".to_string()));
        };

        let mut result = JobResult::new(req.file_ids.len() as u32);
        let config = serde_json::to_string(&req.chunk).unwrap_or_default();
        result.append_log(ctx.now(), &messages::process_files_config(job.locale, &config));
        ctx.persist(job, &mut result)?;

        for file_id in &req.file_ids {
            ctx.ensure_active()?;
            let outcome = process_file(ctx, job, req, file_id, &mut result).await;
            if absorb_item_error(outcome, |e| {
                result.append_log(
                    ctx.now(),
                    &messages::process_file_failed(job.locale, file_id, &e),
                );
            })? {
                result.bump_done();
            }
            ctx.persist(job, &mut result)?;
        }

        Ok(result)
    }
}

async fn process_file<C: Clock>(
    ctx: &JobContext<C>,
    job: &Job,
    req: &FilePairRequest,
    file_id: &FileId,
    result: &mut JobResult,
) -> Result<(), HandlerError> {
    let actor = job.actor();
    let locale = job.locale;

    let Ok(file) = ctx.store.get_file(&actor, file_id) else {
        result.append_log(ctx.now(), &messages::file_not_found(locale, file_id));
        return Ok(());
    };
    result.append_log(ctx.now(), &messages::start_processing_file(locale, &file.file_name));

    split_file(ctx, job, req, &file, result)?;
    let new_toc = rebuild_catalog(ctx, job, &file, result)?;
    run_tag_flow(ctx, job, req.toc_build_action, result, "", &new_toc).await?;

    result.append_log(ctx.now(), &messages::end_processing_file(locale, &file.file_name));
    Ok(())
}

/// Drop the file's previous chunks and insert the new split. Deleting first
/// is what makes a re-run after a crash idempotent.
fn split_file<C: Clock>(
    ctx: &JobContext<C>,
    job: &Job,
    req: &FilePairRequest,
    file: &SourceFile,
    result: &mut JobResult,
) -> Result<(), HandlerError> {
    let actor = job.actor();
    result.append_log(ctx.now(), &messages::start_splitting(job.locale));
    ctx.store.bulk_delete_file_pairs(&actor, &[file.id.clone()])?;
    ctx.persist(job, result)?;

    let items = tf_split::split_file(&file.file_name, &file.content, &req.chunk);
    let pairs: Vec<FilePair> = items
        .into_iter()
        .map(|item| FilePair {
            id: FilePairId::new(),
            meta: Meta::new(&actor, ctx.now()),
            project_id: file.project_id.clone(),
            file_id: file.id.clone(),
            name: item.name,
            content: item.content,
            summary: item.summary,
            size: item.size,
            chunk_index: item.chunk_index,
            question_id_list: Vec::new(),
        })
        .collect();
    ctx.store.bulk_create_file_pairs(pairs)?;

    result.append_log(ctx.now(), &messages::end_splitting(job.locale));
    ctx.persist(job, result)?;
    Ok(())
}

/// Re-extract the file's TOC into its catalog row; returns the TOC JSON.
fn rebuild_catalog<C: Clock>(
    ctx: &JobContext<C>,
    job: &Job,
    file: &SourceFile,
    result: &mut JobResult,
) -> Result<String, HandlerError> {
    let actor = job.actor();
    result.append_log(ctx.now(), &messages::start_catalog(job.locale));

    let toc = tf_split::extract_table_of_contents(&file.content);
    let toc_json = serde_json::to_string(&toc).map_err(|e| HandlerError::Other(e.to_string()))?;

    ctx.store.bulk_delete_catalogs(&actor, &[file.id.clone()])?;
    ctx.store.create_catalog(Catalog {
        id: CatalogId::new(),
        meta: Meta::new(&actor, ctx.now()),
        project_id: file.project_id.clone(),
        file_id: file.id.clone(),
        file_name: file.file_name.clone(),
        toc: toc_json.clone(),
    })?;

    result.append_log(ctx.now(), &messages::end_catalog(job.locale));
    ctx.persist(job, result)?;
    Ok(toc_json)
}

#[cfg(test)]
#[path = "file_pair_tests.rs"]
mod tests;
