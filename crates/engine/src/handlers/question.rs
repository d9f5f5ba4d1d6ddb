// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Question generation per chunk, with optional genre/audience adaptation
//! and a second labeling pass against the project tag forest.

use super::{absorb_item_error, tag_forest, HandlerError, JobHandler};
use crate::context::JobContext;
use crate::{messages, prompts};
use async_trait::async_trait;
use serde::Deserialize;
use tf_core::{
    Clock, FilePair, FilePairId, GaPair, Job, JobRequest, JobResult, Meta, Question, QuestionId,
    QuestionRequest, Tag,
};

pub struct QuestionGenerator;

#[derive(Deserialize)]
struct LabeledQuestion {
    #[serde(default)]
    question: String,
    #[serde(default)]
    label: String,
}

#[async_trait]
impl<C: Clock> JobHandler<C> for QuestionGenerator {
    async fn execute(&self, ctx: &JobContext<C>, job: &Job) -> Result<JobResult, HandlerError> {
        let JobRequest::QuestionGenerator(req) = &job.request else {
            return Err(HandlerError::Other("mismatched request payload".to_string()));
        };
        let locale = job.locale;

        let mut result = JobResult::new(req.file_pair_ids.len() as u32);
        let config = serde_json::to_string(req).unwrap_or_default();
        result.append_log(ctx.now(), &messages::process_file_pair_config(locale, &config));
        ctx.persist(job, &mut result)?;

        for file_pair_id in &req.file_pair_ids {
            ctx.ensure_active()?;
            result.append_log(ctx.now(), &messages::start_file_pair(locale, file_pair_id));

            let outcome = process_file_pair(ctx, job, req, file_pair_id, &mut result).await;
            absorb_item_error(outcome, |e| {
                result.append_log(
                    ctx.now(),
                    &messages::process_file_pair_failed(locale, file_pair_id, &e),
                );
            })?;
            ctx.persist(job, &mut result)?;
        }

        Ok(result)
    }
}

async fn process_file_pair<C: Clock>(
    ctx: &JobContext<C>,
    job: &Job,
    req: &QuestionRequest,
    file_pair_id: &FilePairId,
    result: &mut JobResult,
) -> Result<(), HandlerError> {
    let actor = job.actor();
    let locale = job.locale;

    let pair = ctx.store.get_file_pair(&actor, file_pair_id)?;
    let ga_pairs = ctx.store.list_ga_pairs(&actor, &pair.file_id, true);
    let tags = ctx.store.list_tags(&actor, &job.project_id);

    let number = if req.number == 0 {
        (pair.content.len() as u32 / req.question_generation_length.max(1)).max(1)
    } else {
        req.number
    };

    if req.use_ga_generator && !ga_pairs.is_empty() {
        for ga in &ga_pairs {
            generate_questions(ctx, job, &pair, number, Some(ga), &tags, result).await?;
        }
    } else {
        generate_questions(ctx, job, &pair, number, None, &tags, result).await?;
    }

    result.bump_done();
    result.append_log(ctx.now(), &messages::end_file_pair(locale, file_pair_id));
    Ok(())
}

/// One generation round: questions, then tag labeling, then persistence.
/// LLM failures log and return without writing rows.
async fn generate_questions<C: Clock>(
    ctx: &JobContext<C>,
    job: &Job,
    pair: &FilePair,
    number: u32,
    ga: Option<&GaPair>,
    tags: &[Tag],
    result: &mut JobResult,
) -> Result<(), HandlerError> {
    let actor = job.actor();
    let locale = job.locale;

    let prompt = prompts::question(locale, &pair.content, number, ga);
    match ga {
        Some(ga) => {
            let ga_info = serde_json::to_string(ga).unwrap_or_default();
            result.append_log(ctx.now(), &messages::start_question_by_ga(locale, &ga_info, &prompt));
        }
        None => result.append_log(ctx.now(), &messages::start_question(locale, &prompt)),
    }
    ctx.persist(job, result)?;

    let output = match ctx.llm.chat(&prompt).await {
        Ok(output) => output,
        Err(e) => {
            result.append_log(ctx.now(), &e.to_string());
            return Ok(());
        }
    };
    result.append_log(ctx.now(), &messages::end_question(locale, &output));

    let questions = match tf_llm::extract::json_from_output(&output) {
        Ok(value) => value,
        Err(e) => {
            result.append_log(ctx.now(), &e.to_string());
            return Ok(());
        }
    };
    if !questions.as_array().is_some_and(|a| !a.is_empty()) {
        result.append_log(ctx.now(), &messages::llm_empty_result(locale));
        return Ok(());
    }

    // Second pass: annotate each question with a tag from the forest.
    let label_prompt = prompts::add_label(locale, &tag_forest(tags), &questions.to_string());
    result.append_log(ctx.now(), &messages::start_label_question(locale, &label_prompt));
    ctx.persist(job, result)?;

    let labeled_output = match ctx.llm.chat(&label_prompt).await {
        Ok(output) => output,
        Err(e) => {
            result.append_log(ctx.now(), &e.to_string());
            return Ok(());
        }
    };
    result.append_log(ctx.now(), &messages::end_label_question(locale, &labeled_output));

    let labeled: Vec<LabeledQuestion> = match tf_llm::extract::json_from_output(&labeled_output)
        .map_err(|e| e.to_string())
        .and_then(|v| serde_json::from_value(v).map_err(|e| e.to_string()))
    {
        Ok(labeled) => labeled,
        Err(message) => {
            result.append_log(ctx.now(), &message);
            return Ok(());
        }
    };

    let rows: Vec<Question> = labeled
        .into_iter()
        .filter(|lq| !lq.question.is_empty())
        .map(|lq| Question {
            id: QuestionId::new(),
            meta: Meta::new(&actor, ctx.now()),
            project_id: pair.project_id.clone(),
            file_id: pair.file_id.clone(),
            file_pair_id: pair.id.clone(),
            question: lq.question,
            tag_name: lq.label,
            ga_pair: ga.cloned(),
            has_dataset: false,
        })
        .collect();
    if !rows.is_empty() {
        ctx.store.bulk_create_questions(rows)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "question_tests.rs"]
mod tests;
