// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic artifact locations on remote hosts and in the local store.
//!
//! Staging is replayed on restart, so every path must be derivable from IDs
//! alone.

use std::path::{Path, PathBuf};
use tf_core::{ClusterId, DatasetVersionId, FinetuneJobId, LoraId, MachineId};

/// Root of everything we place on a remote host.
pub const MACHINE_RUN_DIR: &str = "/dataset_finetune";

// ---- fine-tune jobs

pub fn job_work_dir(job_id: &FinetuneJobId) -> String {
    format!("{MACHINE_RUN_DIR}/jobs/{job_id}")
}

pub fn job_log_path(job_id: &FinetuneJobId) -> String {
    format!("{MACHINE_RUN_DIR}/jobs/{job_id}/run.log")
}

pub fn job_config_path(job_id: &FinetuneJobId) -> String {
    format!("{MACHINE_RUN_DIR}/jobs/{job_id}/config.yaml")
}

pub fn job_deepspeed_path(job_id: &FinetuneJobId) -> String {
    format!("{MACHINE_RUN_DIR}/jobs/{job_id}/deepspeed.json")
}

pub fn job_output_dir(job_id: &FinetuneJobId) -> String {
    format!("{MACHINE_RUN_DIR}/jobs/{job_id}/output")
}

pub fn job_lora_tar_path(job_id: &FinetuneJobId) -> String {
    format!("{MACHINE_RUN_DIR}/jobs/{job_id}/lora_model.tar.gz")
}

// ---- datasets staged for llamafactory

pub fn dataset_path(version_id: &DatasetVersionId) -> String {
    format!("{MACHINE_RUN_DIR}/datasets/{version_id}.json")
}

pub fn dataset_info_dir(job_id: &FinetuneJobId) -> String {
    format!("{MACHINE_RUN_DIR}/datasets/{job_id}")
}

pub fn dataset_info_json_path(job_id: &FinetuneJobId) -> String {
    format!("{MACHINE_RUN_DIR}/datasets/{job_id}/dataset_info.json")
}

// ---- deploy clusters

pub fn deploy_work_dir(cluster_id: &ClusterId) -> String {
    format!("{MACHINE_RUN_DIR}/deploys/{cluster_id}")
}

pub fn deploy_log_path(cluster_id: &ClusterId) -> String {
    format!("{MACHINE_RUN_DIR}/deploys/{cluster_id}/run.log")
}

pub fn deploy_lora_dir(cluster_id: &ClusterId, lora_id: &LoraId) -> String {
    format!("{MACHINE_RUN_DIR}/deploys/{cluster_id}/loras/{lora_id}")
}

pub fn deploy_lora_tar_path(cluster_id: &ClusterId, lora_id: &LoraId) -> String {
    format!("{MACHINE_RUN_DIR}/deploys/{cluster_id}/loras/{lora_id}/lora_model.tar.gz")
}

// ---- local artifact store

pub fn local_job_log(base: &Path, job_id: &FinetuneJobId, machine_id: &MachineId) -> PathBuf {
    base.join(job_id.as_str()).join(machine_id.as_str()).join("run.log")
}

pub fn local_lora_tar(base: &Path, job_id: &FinetuneJobId) -> PathBuf {
    base.join(job_id.as_str()).join("lora_model.tar.gz")
}

pub fn dataset_version_file(base: &Path, version_id: &DatasetVersionId) -> PathBuf {
    base.join(format!("{version_id}.jsonl"))
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
