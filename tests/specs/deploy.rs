// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LoRA install on a running cluster, then a streamed completion against
//! the adapter.

use super::support::world;
use std::sync::Arc;
use std::time::Duration;
use tf_core::test_support::{actor, machine_with_id};
use tf_core::{DeployStatus, Locale, ReleaseId, TrainStage};
use tf_engine::deploy::{FakeInferenceApi, InferenceApi, LoraCreate};
use tf_engine::{paths, CompletionParams, DeployCreate, DeployService};
use tf_remote::HostFactory;

#[tokio::test]
async fn lora_install_and_streamed_completion() {
    let w = world();
    let inference = Arc::new(FakeInferenceApi::new());
    let deploy = DeployService::new(
        w.store.clone(),
        w.hosts.clone() as Arc<dyn HostFactory>,
        inference.clone() as Arc<dyn InferenceApi>,
        w.clock.clone(),
    );

    let m1 = w.store.add_machine(machine_with_id("m1", "m1", 2)).unwrap();
    let m2 = w.store.add_machine(machine_with_id("m2", "m2", 2)).unwrap();
    let cluster = deploy
        .create(
            &actor(),
            DeployCreate {
                name: "infer".into(),
                machine_id_list: vec![m1.id.clone(), m2.id.clone()],
                base_model: "/models/base".into(),
                finetune_method: "lora".into(),
            },
        )
        .unwrap();

    deploy.install(&actor(), &cluster.id, Locale::En).unwrap();
    for _ in 0..300 {
        if w.store.get_cluster(&actor(), &cluster.id).unwrap().status == DeployStatus::Starting {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let started = w.store.get_cluster(&actor(), &cluster.id).unwrap();
    assert_eq!(started.status, DeployStatus::Starting);

    // Create + install the adapter; the tarball lands on every node, the
    // load call hits only the master.
    let lora_id = deploy
        .lora_create(
            &actor(),
            &cluster.id,
            LoraCreate {
                release_id: ReleaseId::from_string("rel-1"),
                model_path: "/local/rel-1/lora_model.tar.gz".into(),
                stage: TrainStage::Sft,
            },
        )
        .unwrap();
    deploy.lora_install(&actor(), &cluster.id, &lora_id, Locale::En).unwrap();
    let stored = wait_lora(&w, &cluster.id, &lora_id, DeployStatus::Starting).await;
    assert_eq!(stored.lora(&lora_id).map(|l| l.status), Some(DeployStatus::Starting));

    let tar_remote = paths::deploy_lora_tar_path(&cluster.id, &lora_id);
    for machine in ["m1", "m2"] {
        assert!(w.hosts.host_for(machine).uploads().iter().any(|(r, _)| r == &tar_remote));
    }
    let loads = inference.loads.lock().clone();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].1, lora_id.as_str());
    assert!(loads[0].2.ends_with("/output"));

    // A second install is a pure no-op on the wire.
    deploy.lora_install(&actor(), &cluster.id, &lora_id, Locale::En).unwrap();
    for _ in 0..300 {
        if w.hosts.host_for("m1").uploads().len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let uploads = w.hosts.host_for("m1").uploads();
    assert!(uploads.last().map(|(_, skipped)| *skipped).unwrap_or(false));

    // Completion against the adapter carries its id as the model.
    inference.set_tokens(&["Bon", "jour"]);
    let frames = deploy
        .completion_stream(
            &actor(),
            CompletionParams {
                cluster_id: cluster.id.clone(),
                lora_id: Some(lora_id.clone()),
                prompt: "greet".into(),
                max_tokens: 8,
                temperature: 0.7,
            },
            Locale::En,
        )
        .await
        .unwrap()
        .collect_frames()
        .await;
    assert_eq!(frames, vec!["data: Bon\n\n", "data: jour\n\n", "data: [DONE]\n\n"]);
    assert_eq!(inference.completions.lock()[0].model, lora_id.as_str());
}

async fn wait_lora(
    w: &super::support::World,
    cluster_id: &tf_core::ClusterId,
    lora_id: &tf_core::LoraId,
    expected: DeployStatus,
) -> tf_core::DeployCluster {
    for _ in 0..300 {
        let cluster = w.store.get_cluster(&actor(), cluster_id).unwrap();
        if cluster.lora(lora_id).map(|l| l.status) == Some(expected) {
            return cluster;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("lora never reached {expected}");
}
