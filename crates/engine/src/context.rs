// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit dependencies handed to handlers and services.

use crate::handlers::HandlerError;
use std::path::PathBuf;
use std::sync::Arc;
use tf_core::{Clock, Job, JobResult, JobStatus};
use tf_llm::ChatClient;
use tf_storage::Store;
use tokio_util::sync::CancellationToken;

/// Filesystem locations the engine writes to on this host.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Where dataset version `.jsonl` files are materialized.
    pub dataset_version_dir: PathBuf,
    /// Local artifact store for fine-tune logs and lora tarballs.
    pub finetune_local_dir: PathBuf,
}

/// Per-job execution context.
///
/// Handlers observe cancellation through [`JobContext::ensure_active`] at
/// persistence boundaries; an in-flight LLM call is never interrupted.
pub struct JobContext<C: Clock> {
    pub store: Store<C>,
    pub llm: Arc<dyn ChatClient>,
    pub clock: C,
    pub cancel: CancellationToken,
}

impl<C: Clock> JobContext<C> {
    pub fn now(&self) -> u64 {
        self.clock.epoch_secs()
    }

    /// Error out with [`HandlerError::Cancelled`] once the user cancelled.
    pub fn ensure_active(&self) -> Result<(), HandlerError> {
        if self.cancel.is_cancelled() {
            Err(HandlerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Persist progress and buffered logs, keeping the job `Running`.
    /// Partial work survives a crash because every item ends here.
    pub fn persist(&self, job: &Job, result: &mut JobResult) -> Result<(), HandlerError> {
        self.store.update_job_status(&job.actor(), &job.id, JobStatus::Running, result)?;
        Ok(())
    }
}
