// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tag tree generation and revision.
//!
//! Shared by the standalone `TagGenerator` job and the file-pair /
//! file-delete flows, which feed it the TOC diff of the change that
//! triggered it.

use super::{tag_forest, HandlerError, JobHandler};
use crate::context::JobContext;
use crate::{messages, prompts};
use async_trait::async_trait;
use tf_core::{
    Actor, Catalog, Clock, Job, JobRequest, JobResult, ProjectId, TagId, TagNode, TocBuildAction,
};
use tf_split::TocEntry;

pub struct TagGenerator;

#[async_trait]
impl<C: Clock> JobHandler<C> for TagGenerator {
    async fn execute(&self, ctx: &JobContext<C>, job: &Job) -> Result<JobResult, HandlerError> {
        let JobRequest::TagGenerator(req) = &job.request else {
            return Err(HandlerError::Other("mismatched request payload".to_string()));
        };
        let mut result = JobResult::new(1);
        run_tag_flow(ctx, job, req.toc_build_action, &mut result, "", "").await?;
        result.bump_done();
        Ok(result)
    }
}

/// Regenerate or revise the project tag forest via the LLM.
///
/// A `Revise` against a project with no tags falls back to `Rebuild`. LLM
/// failures are logged, never fatal: the tag tree just stays stale.
pub(crate) async fn run_tag_flow<C: Clock>(
    ctx: &JobContext<C>,
    job: &Job,
    action: TocBuildAction,
    result: &mut JobResult,
    deleted_toc: &str,
    new_toc: &str,
) -> Result<(), HandlerError> {
    let actor = job.actor();
    let locale = job.locale;
    result.append_log(ctx.now(), &messages::start_tag(locale));

    let catalogs = ctx.store.list_catalogs(&actor, &job.project_id);
    let tags = ctx.store.list_tags(&actor, &job.project_id);
    let action = match action {
        TocBuildAction::Revise if tags.is_empty() => TocBuildAction::Rebuild,
        other => other,
    };

    let prompt = match action {
        TocBuildAction::Keep => None,
        TocBuildAction::Rebuild => Some(prompts::label_rebuild(locale, &project_toc(&catalogs))),
        TocBuildAction::Revise => Some(prompts::label_revise(
            locale,
            &project_toc(&catalogs),
            &tag_forest(&tags),
            deleted_toc,
            new_toc,
        )),
    };

    if let Some(prompt) = prompt {
        result.append_log(ctx.now(), &messages::start_llm(locale, &prompt));
        match ctx.llm.chat(&prompt).await {
            Err(e) => result.append_log(ctx.now(), &e.to_string()),
            Ok(output) => {
                result.append_log(ctx.now(), &messages::end_llm(locale, &output));
                match parse_tag_nodes(&output) {
                    Err(message) => result.append_log(ctx.now(), &message),
                    Ok(nodes) if nodes.is_empty() => {
                        result.append_log(ctx.now(), &messages::llm_empty_result(locale));
                    }
                    Ok(nodes) => batch_save_tags(ctx, &actor, &job.project_id, &nodes)?,
                }
            }
        }
    }

    result.append_log(ctx.now(), &messages::end_tag(locale));
    ctx.persist(job, result)?;
    Ok(())
}

fn parse_tag_nodes(output: &str) -> Result<Vec<TagNode>, String> {
    let value = tf_llm::extract::json_from_output(output).map_err(|e| e.to_string())?;
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// Combined TOC of every catalog in the project, file name first.
pub(crate) fn project_toc(catalogs: &[Catalog]) -> String {
    catalogs
        .iter()
        .map(|c| {
            let entries: Vec<TocEntry> = serde_json::from_str(&c.toc).unwrap_or_default();
            format!("{}\n{}", c.file_name, tf_split::render_toc(&entries))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace the project's tag forest with freshly generated nodes.
fn batch_save_tags<C: Clock>(
    ctx: &JobContext<C>,
    actor: &Actor,
    project_id: &ProjectId,
    nodes: &[TagNode],
) -> Result<(), HandlerError> {
    ctx.store.bulk_delete_tags(actor, project_id)?;
    insert_nodes(ctx, actor, project_id, nodes, None)
}

fn insert_nodes<C: Clock>(
    ctx: &JobContext<C>,
    actor: &Actor,
    project_id: &ProjectId,
    nodes: &[TagNode],
    parent: Option<&TagId>,
) -> Result<(), HandlerError> {
    for node in nodes {
        let tag = ctx.store.create_tag(actor, project_id, &node.label, parent)?;
        if !node.child.is_empty() {
            insert_nodes(ctx, actor, project_id, &node.child, Some(&tag.id))?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;
