// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline job handlers.
//!
//! Every handler follows the same shape: read the typed request off the
//! job, size a [`tf_core::JobResult`], loop over items appending logs and
//! bumping `done_count`, and persist after each item. Per-item failures are
//! logged and skipped; only cancellation and escaping errors end the job
//! early.

pub mod dataset;
pub mod file_delete;
pub mod file_pair;
pub mod ga_pair;
pub mod question;
pub mod tag;

use crate::context::JobContext;
use crate::manager::JobManager;
use async_trait::async_trait;
use std::sync::Arc;
use tf_core::{Clock, Job, JobResult, JobType, Tag, TagNode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// The user cancelled; observed between items.
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Storage(#[from] tf_storage::StorageError),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait JobHandler<C: Clock>: Send + Sync + 'static {
    async fn execute(&self, ctx: &JobContext<C>, job: &Job) -> Result<JobResult, HandlerError>;
}

/// Install the six built-in handlers.
pub fn register_default_handlers<C: Clock>(manager: &JobManager<C>) {
    manager.register_handler(JobType::FilePairGenerator, Arc::new(file_pair::FilePairGenerator));
    manager
        .register_handler(JobType::FileDeleteGenerator, Arc::new(file_delete::FileDeleteGenerator));
    manager.register_handler(JobType::GaPairGenerator, Arc::new(ga_pair::GaPairGenerator));
    manager.register_handler(JobType::TagGenerator, Arc::new(tag::TagGenerator));
    manager.register_handler(JobType::QuestionGenerator, Arc::new(question::QuestionGenerator));
    manager.register_handler(JobType::DatasetGenerator, Arc::new(dataset::DatasetGenerator));
}

/// Build the label forest handed to the LLM from flat tag rows.
pub(crate) fn tag_forest(tags: &[Tag]) -> Vec<TagNode> {
    fn children(tags: &[Tag], parent: Option<&tf_core::TagId>) -> Vec<TagNode> {
        tags.iter()
            .filter(|t| t.parent_id.as_ref() == parent)
            .map(|t| TagNode { label: t.label.clone(), child: children(tags, Some(&t.id)) })
            .collect()
    }
    children(tags, None)
}

/// Run a fallible per-item step: cancellation propagates, anything else is
/// reported through `on_error` and skipped. Returns whether the item
/// actually succeeded.
pub(crate) fn absorb_item_error(
    outcome: Result<(), HandlerError>,
    on_error: impl FnOnce(String),
) -> Result<bool, HandlerError> {
    match outcome {
        Ok(()) => Ok(true),
        Err(HandlerError::Cancelled) => Err(HandlerError::Cancelled),
        Err(e) => {
            on_error(e.to_string());
            Ok(false)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;
