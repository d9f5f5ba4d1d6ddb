// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Answer generation: one Q/A/CoT dataset row per question.

use super::{absorb_item_error, HandlerError, JobHandler};
use crate::context::JobContext;
use crate::{messages, prompts};
use async_trait::async_trait;
use tf_core::{
    Clock, Dataset, DatasetId, DatasetRequest, Job, JobRequest, JobResult, Meta, QuestionId,
};

pub struct DatasetGenerator;

#[async_trait]
impl<C: Clock> JobHandler<C> for DatasetGenerator {
    async fn execute(&self, ctx: &JobContext<C>, job: &Job) -> Result<JobResult, HandlerError> {
        let JobRequest::DatasetGenerator(req) = &job.request else {
            return Err(HandlerError::Other("mismatched request payload".to_string()));
        };
        let locale = job.locale;

        let mut result = JobResult::new(req.question_ids.len() as u32);
        let config = serde_json::to_string(req).unwrap_or_default();
        result.append_log(ctx.now(), &messages::process_dataset_config(locale, &config));
        ctx.persist(job, &mut result)?;

        for question_id in &req.question_ids {
            ctx.ensure_active()?;
            let outcome = process_question(ctx, job, question_id, &mut result).await;
            absorb_item_error(outcome, |e| {
                result.append_log(
                    ctx.now(),
                    &messages::process_question_failed(locale, question_id, &e),
                );
            })?;
            ctx.persist(job, &mut result)?;
        }

        Ok(result)
    }
}

async fn process_question<C: Clock>(
    ctx: &JobContext<C>,
    job: &Job,
    question_id: &QuestionId,
    result: &mut JobResult,
) -> Result<(), HandlerError> {
    let actor = job.actor();
    let locale = job.locale;
    result.append_log(ctx.now(), &messages::start_process_question(locale, question_id));

    let question = ctx.store.get_question(&actor, question_id)?;
    let pair = ctx.store.get_file_pair(&actor, &question.file_pair_id)?;
    let ga_pairs = ctx.store.list_ga_pairs(&actor, &pair.file_id, true);
    let ga_snapshot = question.ga_pair.clone();

    // GA context present — at generation time or on the file now — selects
    // the enhanced answer prompt.
    let prompt = if ga_snapshot.is_some() || !ga_pairs.is_empty() {
        result.append_log(ctx.now(), &messages::use_mga_prompt(locale));
        let active = ga_snapshot.as_ref().or_else(|| ga_pairs.first());
        prompts::enhanced_answer(locale, &pair.content, &question.question, active)
    } else {
        result.append_log(ctx.now(), &messages::use_standard_prompt(locale));
        prompts::answer(locale, &pair.content, &question.question)
    };

    result.append_log(ctx.now(), &messages::start_generate_dataset(locale, &prompt));
    ctx.persist(job, result)?;

    let chat = match ctx.llm.chat_cot(&prompt).await {
        Ok(chat) => chat,
        Err(e) => {
            result.append_log(ctx.now(), &e.to_string());
            return Ok(());
        }
    };
    result.append_log(ctx.now(), &messages::end_generate_dataset(locale, &chat.answer));

    let Some(model) = ctx.store.default_model() else {
        result.append_log(ctx.now(), &messages::model_not_configured(locale));
        return Ok(());
    };

    let mut dataset = Dataset {
        id: DatasetId::new(),
        meta: Meta::new(&actor, ctx.now()),
        project_id: question.project_id.clone(),
        file_id: question.file_id.clone(),
        file_pair_id: question.file_pair_id.clone(),
        question_id: question.id.clone(),
        question: question.question.clone(),
        answer: chat.answer.clone(),
        cot: String::new(),
        tag_name: question.tag_name.clone(),
        model: model.model_name,
        confirmed: false,
        ga_pair: ga_snapshot,
    };

    // A nonempty chain gets a second pass that rewrites it into a
    // self-contained derivation.
    if !chat.cot.is_empty() {
        let cot_prompt = prompts::optimize_cot(locale, &question.question, &chat.answer, &chat.cot);
        match ctx.llm.chat_cot(&cot_prompt).await {
            Err(e) => result.append_log(ctx.now(), &e.to_string()),
            Ok(optimized) => {
                dataset.cot = if optimized.answer.is_empty() {
                    optimized.cot
                } else {
                    optimized.answer
                };
            }
        }
    }

    ctx.store.create_dataset(dataset)?;
    ctx.store.set_question_has_dataset(&actor, &question.id, true)?;

    result.bump_done();
    result.append_log(ctx.now(), &messages::end_process_question(locale, question_id));
    Ok(())
}

#[cfg(test)]
#[path = "dataset_tests.rs"]
mod tests;
