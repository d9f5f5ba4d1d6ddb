// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Published model artifacts.

use crate::finetune::{FinetuneJobId, TrainStage};
use crate::meta::{Actor, Meta};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a release.
    pub struct ReleaseId("rel-");
}

/// Immutable snapshot of a successful fine-tune job: a tarred LoRA artifact
/// at a well-known local path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub description: String,
    pub base_model: String,
    pub stage: TrainStage,
    pub finetune_method: String,
    pub job_id: FinetuneJobId,
    pub model_path: String,
}

impl Release {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        actor: &Actor,
        name: impl Into<String>,
        description: impl Into<String>,
        base_model: impl Into<String>,
        stage: TrainStage,
        finetune_method: impl Into<String>,
        job_id: FinetuneJobId,
        model_path: impl Into<String>,
        now: u64,
    ) -> Self {
        Self {
            id: ReleaseId::new(),
            meta: Meta::new(actor, now),
            name: name.into(),
            description: description.into(),
            base_model: base_model.into(),
            stage,
            finetune_method: finetune_method.into(),
            job_id,
            model_path: model_path.into(),
        }
    }
}

crate::record_impl!(Release);
