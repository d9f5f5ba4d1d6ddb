// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Genre/audience pair generation per file.

use super::{absorb_item_error, HandlerError, JobHandler};
use crate::context::JobContext;
use crate::{messages, prompts};
use async_trait::async_trait;
use serde::Deserialize;
use tf_core::{Clock, GaPair, GaPairId, GaPairRequest, Job, JobRequest, JobResult, Meta, SourceFile};

pub struct GaPairGenerator;

#[derive(Deserialize)]
struct GaChatItem {
    genre: GaChatPart,
    audience: GaChatPart,
}

#[derive(Deserialize)]
struct GaChatPart {
    title: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl<C: Clock> JobHandler<C> for GaPairGenerator {
    async fn execute(&self, ctx: &JobContext<C>, job: &Job) -> Result<JobResult, HandlerError> {
        let JobRequest::GaPairGenerator(req) = &job.request else {
            return Err(HandlerError::Other("mismatched request payload".to_string()));
        };
        let actor = job.actor();
        let locale = job.locale;

        let mut result = JobResult::new(req.file_ids.len() as u32);
        let config = serde_json::to_string(req).unwrap_or_default();
        result.append_log(ctx.now(), &messages::ga_config(locale, &config));
        ctx.persist(job, &mut result)?;

        let mut files = Vec::new();
        for file_id in &req.file_ids {
            match ctx.store.get_file(&actor, file_id) {
                Ok(file) => files.push(file),
                Err(_) => result.append_log(ctx.now(), &messages::file_not_found(locale, file_id)),
            }
        }
        ctx.persist(job, &mut result)?;

        for file in &files {
            ctx.ensure_active()?;
            let outcome = process_file(ctx, job, req, file, &mut result).await;
            absorb_item_error(outcome, |e| {
                result.append_log(ctx.now(), &messages::process_file_failed(locale, &file.id, &e));
            })?;
            ctx.persist(job, &mut result)?;
        }

        Ok(result)
    }
}

async fn process_file<C: Clock>(
    ctx: &JobContext<C>,
    job: &Job,
    req: &GaPairRequest,
    file: &SourceFile,
    result: &mut JobResult,
) -> Result<(), HandlerError> {
    let actor = job.actor();
    let locale = job.locale;
    result.append_log(ctx.now(), &messages::start_processing_file(locale, &file.file_name));

    let prompt = prompts::ga_generation(locale, &file.content);
    result.append_log(ctx.now(), &messages::start_llm(locale, &prompt));
    ctx.persist(job, result)?;

    let output = match ctx.llm.chat(&prompt).await {
        Ok(output) => output,
        Err(e) => {
            result.append_log(ctx.now(), &e.to_string());
            return Ok(());
        }
    };
    result.append_log(ctx.now(), &messages::end_llm(locale, &output));

    let items: Vec<GaChatItem> = match tf_llm::extract::json_from_output(&output)
        .map_err(|e| e.to_string())
        .and_then(|v| serde_json::from_value(v).map_err(|e| e.to_string()))
    {
        Ok(items) => items,
        Err(message) => {
            result.append_log(ctx.now(), &message);
            return Ok(());
        }
    };
    if items.is_empty() {
        result.append_log(ctx.now(), &messages::llm_empty_result(locale));
        return Ok(());
    }

    let generated: Vec<GaPair> = items
        .into_iter()
        .map(|item| GaPair {
            id: GaPairId::new(),
            meta: Meta::new(&actor, ctx.now()),
            project_id: file.project_id.clone(),
            file_id: file.id.clone(),
            text_style: item.genre.title,
            text_desc: item.genre.description,
            audience: item.audience.title,
            audience_desc: item.audience.description,
            enable: true,
        })
        .collect();

    if req.append_mode {
        let existing = ctx.store.list_ga_pairs(&actor, &file.id, false);
        let existing_keys: std::collections::HashSet<_> =
            existing.iter().map(|p| p.quadruple()).collect();
        let fresh: Vec<GaPair> = generated
            .iter()
            .filter(|p| !existing_keys.contains(&p.quadruple()))
            .cloned()
            .collect();
        if !fresh.is_empty() {
            ctx.store.bulk_create_ga_pairs(fresh)?;
        }
    } else {
        ctx.store.bulk_delete_ga_pairs(&actor, &[file.id.clone()])?;
        ctx.store.bulk_create_ga_pairs(generated)?;
    }

    result.append_log(ctx.now(), &messages::end_processing_file(locale, &file.file_name));
    result.bump_done();
    Ok(())
}

#[cfg(test)]
#[path = "ga_pair_tests.rs"]
mod tests;
