// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fine-tuning jobs, training configs, and their embedded snapshots.

use crate::document::DatasetVersion;
use crate::locale::Locale;
use crate::machine::{Machine, MachineId};
use crate::meta::{Actor, Meta};
use crate::release::ReleaseId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a fine-tuning job.
    pub struct FinetuneJobId("ftj-");
}

crate::define_id! {
    /// Unique identifier for a named training config.
    pub struct FinetuneConfigId("ftc-");
}

/// Training stage. Dataset versions and fine-tune jobs share this enum;
/// only `Sft` is accepted by the creation paths today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrainStage {
    Pt,
    Sft,
    Dpo,
    Kto,
}

crate::simple_display! {
    TrainStage {
        Pt => "PT",
        Sft => "SFT",
        Dpo => "DPO",
        Kto => "KTO",
    }
}

/// Which llamafactory argument block a config belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigType {
    ModelArguments,
    DataArguments,
    TrainingArguments,
    FinetuningArguments,
    GeneratingArguments,
    DeepspeedArguments,
    OutputArguments,
}

crate::simple_display! {
    ConfigType {
        ModelArguments => "ModelArguments",
        DataArguments => "DataArguments",
        TrainingArguments => "TrainingArguments",
        FinetuningArguments => "FinetuningArguments",
        GeneratingArguments => "GeneratingArguments",
        DeepspeedArguments => "DeepspeedArguments",
        OutputArguments => "OutputArguments",
    }
}

/// A named bag of hyperparameters for one argument block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuneConfig {
    pub id: FinetuneConfigId,
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub config_type: ConfigType,
    pub config: serde_json::Map<String, serde_json::Value>,
}

impl FinetuneConfig {
    pub fn new(
        actor: &Actor,
        name: impl Into<String>,
        config_type: ConfigType,
        config: serde_json::Map<String, serde_json::Value>,
        now: u64,
    ) -> Self {
        Self {
            id: FinetuneConfigId::new(),
            meta: Meta::new(actor, now),
            name: name.into(),
            config_type,
            config,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }
}

crate::record_impl!(FinetuneConfig);

/// Look up `finetuning_type` across a config list.
pub fn detect_finetune_method(configs: &[FinetuneConfig]) -> String {
    configs
        .iter()
        .find_map(|c| c.get_str("finetuning_type").filter(|m| !m.is_empty()))
        .unwrap_or_default()
        .to_string()
}

/// Fine-tune job lifecycle.
///
/// `Initializing → Init → Starting → {Success | Failed | Error | Cancel}`.
/// The four end states are sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinetuneJobStatus {
    Init,
    Initializing,
    Starting,
    Cancel,
    Success,
    Failed,
    Error,
}

impl FinetuneJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FinetuneJobStatus::Cancel
                | FinetuneJobStatus::Success
                | FinetuneJobStatus::Failed
                | FinetuneJobStatus::Error
        )
    }
}

crate::simple_display! {
    FinetuneJobStatus {
        Init => "Init",
        Initializing => "Initializing",
        Starting => "Starting",
        Cancel => "Cancel",
        Success => "Success",
        Failed => "Failed",
        Error => "Error",
    }
}

/// A fine-tuning job with deep-copied config, dataset, and machine snapshots.
///
/// Snapshots are embedded (credentials included) so the job stays runnable
/// after the source rows are edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinetuneJob {
    pub id: FinetuneJobId,
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    pub description: String,
    pub status: FinetuneJobStatus,
    pub stage: TrainStage,
    pub finetune_method: String,
    pub dataset_version: DatasetVersion,
    pub finetune_config_list: Vec<FinetuneConfig>,
    pub node_machine_list: Vec<Machine>,
    #[serde(default)]
    pub error_info: String,
    #[serde(default)]
    pub done_node_num: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_id: Option<ReleaseId>,
    pub locale: Locale,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub end_at: u64,
}

impl FinetuneJob {
    /// First machine in the node list; rendezvous address and artifact source.
    pub fn master(&self) -> Option<&Machine> {
        self.node_machine_list.first()
    }

    pub fn node(&self, machine_id: &MachineId) -> Option<&Machine> {
        self.node_machine_list.iter().find(|m| &m.id == machine_id)
    }

    pub fn node_index(&self, machine_id: &MachineId) -> Option<usize> {
        self.node_machine_list.iter().position(|m| &m.id == machine_id)
    }

    pub fn config_of(&self, config_type: ConfigType) -> Option<&FinetuneConfig> {
        self.finetune_config_list.iter().find(|c| c.config_type == config_type)
    }

    /// `model_name_or_path` from the ModelArguments block.
    pub fn base_model(&self) -> String {
        self.config_of(ConfigType::ModelArguments)
            .and_then(|c| c.get_str("model_name_or_path"))
            .unwrap_or_default()
            .to_string()
    }

    pub fn actor(&self) -> Actor {
        self.meta.actor()
    }
}

crate::record_impl!(FinetuneJob);

#[cfg(test)]
#[path = "finetune_tests.rs"]
mod tests;
