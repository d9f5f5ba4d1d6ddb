// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small single-machine SFT job, end to end: dataset version
//! materialization, staging, launch, watch, and the published release.

use super::support::world;
use std::sync::Arc;
use std::time::Duration;
use tf_core::test_support::{actor, config as ft_config, machine_with_id};
use tf_core::{
    ConfigType, DatasetVersionOptions, FinetuneJobStatus, Locale, Meta, ProjectId, TrainStage,
};
use tf_engine::dataset_version::{DatasetVersionCreate, DatasetVersionService};
use tf_engine::{paths, FinetuneCreate, FinetuneService};
use tf_remote::{HostFactory, ServiceStatus};

#[tokio::test]
async fn small_sft_job_on_one_machine_publishes_one_release() {
    let w = world();
    let project_id = ProjectId::from_string("prj-1");

    // Two Q/A rows, materialized into a dataset version.
    let mut dataset_ids = Vec::new();
    for (q, a) in [("2+2?", "4"), ("cap of France?", "Paris")] {
        let dataset = w
            .store
            .create_dataset(tf_core::Dataset {
                id: tf_core::DatasetId::new(),
                meta: Meta::new(&actor(), tf_core::test_support::NOW),
                project_id: project_id.clone(),
                file_id: tf_core::FileId::from_string("fil-1"),
                file_pair_id: tf_core::FilePairId::from_string("fpr-1"),
                question_id: tf_core::QuestionId::new(),
                question: q.to_string(),
                answer: a.to_string(),
                cot: String::new(),
                tag_name: String::new(),
                model: "m".to_string(),
                confirmed: true,
                ga_pair: None,
            })
            .unwrap();
        dataset_ids.push(dataset.id);
    }

    let versions = DatasetVersionService::new(w.store.clone(), w.engine_config(), w.clock.clone());
    let version = versions
        .create(
            &actor(),
            DatasetVersionCreate {
                project_id: project_id.clone(),
                name: "dv1".into(),
                description: String::new(),
                dataset_type: TrainStage::Sft,
                dataset_id_list: dataset_ids,
                options: DatasetVersionOptions::default(),
            },
            Locale::En,
        )
        .unwrap();
    let records = tf_engine::dataset_version::read_records(&versions.version_path(&version.id))
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].instruction, "2+2?");
    assert_eq!(records[0].output, "4");

    // Pre-converted JSON so staging skips the local jq run.
    std::fs::write(versions.version_path(&version.id).with_extension("json"), "[]").unwrap();

    // One machine, one GPU, the four standard config blocks, no DeepSpeed.
    let machine = w.store.add_machine(machine_with_id("m1", "m1", 1)).unwrap();
    let config_ids: Vec<_> = [
        ft_config(ConfigType::ModelArguments, &[("model_name_or_path", serde_json::json!("/models/m"))]),
        ft_config(ConfigType::DataArguments, &[("template", serde_json::json!("qwen"))]),
        ft_config(ConfigType::TrainingArguments, &[("learning_rate", serde_json::json!(5e-5))]),
        ft_config(ConfigType::OutputArguments, &[("logging_steps", serde_json::json!(10))]),
    ]
    .into_iter()
    .map(|c| w.store.add_finetune_config(c).unwrap().id)
    .collect();

    let finetune = FinetuneService::new(
        w.store.clone(),
        w.hosts.clone() as Arc<dyn HostFactory>,
        w.engine_config(),
        w.clock.clone(),
    )
    .with_poll_interval(Duration::from_millis(10));

    let job = finetune
        .create(
            &actor(),
            FinetuneCreate {
                name: "small-sft".into(),
                description: String::new(),
                stage: TrainStage::Sft,
                dataset_version_id: version.id.clone(),
                finetune_config_id_list: config_ids,
                node_machine_id_list: vec![machine.id.clone()],
            },
            Locale::En,
        )
        .unwrap();
    assert_eq!(job.status, FinetuneJobStatus::Initializing);

    // Initializing → Init once staging lands.
    wait_for(&w.store, &job.id, FinetuneJobStatus::Init).await;

    // Script the unit lifecycle on the node, then launch.
    let host = w.hosts.host_for("m1");
    host.push_service_status(job.id.as_str(), ServiceStatus::Success, "inactive (dead)");
    host.set_remote_content(&paths::job_log_path(&job.id), "done\n");
    host.set_remote_content(&paths::job_lora_tar_path(&job.id), "tar");

    let started = finetune.start(&actor(), &job.id).await.unwrap();
    assert_eq!(started.status, FinetuneJobStatus::Starting);
    assert!(host.exec_commands().iter().any(|c| c
        == &format!("llamafactory-cli train /dataset_finetune/jobs/{}/config.yaml", job.id)
        || c.contains(&format!("ExecStart=llamafactory-cli train /dataset_finetune/jobs/{}/config.yaml", job.id))));

    let done = wait_for(&w.store, &job.id, FinetuneJobStatus::Success).await;
    assert_eq!(done.done_node_num, 1);
    assert_eq!(w.store.releases_for_job(&job.id), 1);

    let release = w.store.get_release(&actor(), &done.release_id.unwrap()).unwrap();
    assert!(release.model_path.ends_with(&format!("{}/lora_model.tar.gz", job.id)));
    assert_eq!(release.base_model, "/models/m");
    assert_eq!(release.stage, TrainStage::Sft);
}

async fn wait_for(
    store: &tf_storage::Store<tf_core::FakeClock>,
    id: &tf_core::FinetuneJobId,
    expected: FinetuneJobStatus,
) -> tf_core::FinetuneJob {
    for _ in 0..300 {
        let job = store.get_finetune_job(&actor(), id).unwrap();
        if job.status == expected {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never reached {expected}");
}
