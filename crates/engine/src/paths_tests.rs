// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tf_core::{ClusterId, DatasetVersionId, FinetuneJobId, LoraId, MachineId};

#[test]
fn remote_job_paths_are_rooted_at_the_run_dir() {
    let job = FinetuneJobId::from_string("job-123");
    assert_eq!(job_config_path(&job), "/dataset_finetune/jobs/job-123/config.yaml");
    assert_eq!(job_log_path(&job), "/dataset_finetune/jobs/job-123/run.log");
    assert_eq!(job_output_dir(&job), "/dataset_finetune/jobs/job-123/output");
    assert_eq!(job_lora_tar_path(&job), "/dataset_finetune/jobs/job-123/lora_model.tar.gz");
    assert_eq!(job_deepspeed_path(&job), "/dataset_finetune/jobs/job-123/deepspeed.json");
}

#[test]
fn dataset_paths() {
    let version = DatasetVersionId::from_string("dv1");
    let job = FinetuneJobId::from_string("job-123");
    assert_eq!(dataset_path(&version), "/dataset_finetune/datasets/dv1.json");
    assert_eq!(dataset_info_json_path(&job), "/dataset_finetune/datasets/job-123/dataset_info.json");
}

#[test]
fn deploy_paths() {
    let cluster = ClusterId::from_string("dpc-1");
    let lora = LoraId::from_string("L1");
    assert_eq!(deploy_log_path(&cluster), "/dataset_finetune/deploys/dpc-1/run.log");
    assert_eq!(
        deploy_lora_tar_path(&cluster, &lora),
        "/dataset_finetune/deploys/dpc-1/loras/L1/lora_model.tar.gz"
    );
}

#[test]
fn local_store_paths_nest_job_then_machine() {
    let base = std::path::Path::new("/var/lib/tuneforge");
    let job = FinetuneJobId::from_string("job-123");
    let machine = MachineId::from_string("m1");
    assert_eq!(
        local_job_log(base, &job, &machine),
        std::path::Path::new("/var/lib/tuneforge/job-123/m1/run.log")
    );
    assert_eq!(
        local_lora_tar(base, &job),
        std::path::Path::new("/var/lib/tuneforge/job-123/lora_model.tar.gz")
    );
}
