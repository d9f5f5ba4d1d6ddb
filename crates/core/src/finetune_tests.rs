// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{actor, config, dataset_version, machine_with_id, NOW};
use crate::ProjectId;
use serde_json::json;

fn job_with(machines: Vec<Machine>, configs: Vec<FinetuneConfig>) -> FinetuneJob {
    let project = ProjectId::from_string("prj-1");
    FinetuneJob {
        id: FinetuneJobId::from_string("ftj-1"),
        meta: Meta::new(&actor(), NOW),
        name: "job".into(),
        description: String::new(),
        status: FinetuneJobStatus::Initializing,
        stage: TrainStage::Sft,
        finetune_method: detect_finetune_method(&configs),
        dataset_version: dataset_version(&project, "dv1"),
        finetune_config_list: configs,
        node_machine_list: machines,
        error_info: String::new(),
        done_node_num: 0,
        release_id: None,
        locale: Locale::Zh,
        start_at: 0,
        end_at: 0,
    }
}

#[test]
fn node_index_follows_machine_list_order() {
    let job = job_with(
        vec![machine_with_id("mch-a", "a", 1), machine_with_id("mch-b", "b", 1)],
        vec![],
    );
    assert_eq!(job.node_index(&MachineId::from_string("mch-a")), Some(0));
    assert_eq!(job.node_index(&MachineId::from_string("mch-b")), Some(1));
    assert_eq!(job.node_index(&MachineId::from_string("mch-c")), None);
    assert_eq!(job.master().map(|m| m.id.as_str()), Some("mch-a"));
}

#[test]
fn base_model_reads_model_arguments() {
    let job = job_with(
        vec![machine_with_id("mch-a", "a", 1)],
        vec![config(ConfigType::ModelArguments, &[("model_name_or_path", json!("/models/m"))])],
    );
    assert_eq!(job.base_model(), "/models/m");
}

#[test]
fn base_model_is_empty_without_model_arguments() {
    let job = job_with(vec![], vec![]);
    assert_eq!(job.base_model(), "");
}

#[test]
fn finetune_method_comes_from_finetuning_type() {
    let configs = vec![
        config(ConfigType::ModelArguments, &[("model_name_or_path", json!("/m"))]),
        config(ConfigType::FinetuningArguments, &[("finetuning_type", json!("lora"))]),
    ];
    assert_eq!(detect_finetune_method(&configs), "lora");
    assert_eq!(detect_finetune_method(&[]), "");
}

#[test]
fn terminal_statuses_are_the_four_end_states() {
    for s in [
        FinetuneJobStatus::Cancel,
        FinetuneJobStatus::Success,
        FinetuneJobStatus::Failed,
        FinetuneJobStatus::Error,
    ] {
        assert!(s.is_terminal());
    }
    for s in
        [FinetuneJobStatus::Init, FinetuneJobStatus::Initializing, FinetuneJobStatus::Starting]
    {
        assert!(!s.is_terminal());
    }
}

#[test]
fn stage_serializes_uppercase() {
    assert_eq!(serde_json::to_string(&TrainStage::Sft).unwrap(), "\"SFT\"");
    let parsed: TrainStage = serde_json::from_str("\"DPO\"").unwrap();
    assert_eq!(parsed, TrainStage::Dpo);
}
