// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tf_core::test_support::{actor, machine_with_id, NOW};
use tf_core::{FakeClock, LoraId, ReleaseId, TrainStage};
use tf_remote::{ExecOutput, FakeHost, FakeHostFactory};
use vllm::FakeInferenceApi;

struct Fixture {
    svc: DeployService<FakeClock>,
    store: Store<FakeClock>,
    factory: Arc<FakeHostFactory>,
    inference: Arc<FakeInferenceApi>,
}

fn fixture() -> Fixture {
    let clock = FakeClock::new();
    clock.set_epoch_secs(NOW);
    let store = Store::in_memory(clock.clone());
    let factory = Arc::new(FakeHostFactory::new());
    let inference = Arc::new(FakeInferenceApi::new());
    let svc = DeployService::new(
        store.clone(),
        factory.clone() as Arc<dyn HostFactory>,
        inference.clone() as Arc<dyn InferenceApi>,
        clock,
    );
    Fixture { svc, store, factory, inference }
}

impl Fixture {
    fn seed_machines(&self, ids: &[&str], gpu: u32) -> Vec<MachineId> {
        ids.iter()
            .map(|id| {
                let mut machine = machine_with_id(id, id, gpu);
                machine.conn.ip = format!("192.168.1.{}", id.len());
                machine.conn.internal_ip = format!("10.0.0.{}", id.len());
                self.store.add_machine(machine).unwrap().id
            })
            .collect()
    }

    fn create_cluster(&self, machine_ids: Vec<MachineId>) -> DeployCluster {
        self.svc
            .create(
                &actor(),
                DeployCreate {
                    name: "cluster".into(),
                    machine_id_list: machine_ids,
                    base_model: "/models/base".into(),
                    finetune_method: "lora".into(),
                },
            )
            .unwrap()
    }

    fn host(&self, machine_id: &str) -> Arc<FakeHost> {
        self.factory.host_for(machine_id)
    }

    async fn wait_cluster_status(&self, id: &ClusterId, expected: DeployStatus) -> DeployCluster {
        for _ in 0..300 {
            let cluster = self.store.get_cluster(&actor(), id).unwrap();
            if cluster.status == expected {
                return cluster;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("cluster never reached {expected}");
    }

    async fn starting_cluster(&self, ids: &[&str], gpu: u32) -> DeployCluster {
        let machine_ids = self.seed_machines(ids, gpu);
        let cluster = self.create_cluster(machine_ids);
        self.svc.install(&actor(), &cluster.id, tf_core::Locale::En).unwrap();
        self.wait_cluster_status(&cluster.id, DeployStatus::Starting).await
    }

    fn seed_lora(&self, cluster_id: &ClusterId) -> LoraId {
        self.svc
            .lora_create(
                &actor(),
                cluster_id,
                LoraCreate {
                    release_id: ReleaseId::from_string("rel-1"),
                    model_path: "/local/rel-1/lora_model.tar.gz".into(),
                    stage: TrainStage::Sft,
                },
            )
            .unwrap()
    }
}

#[tokio::test]
async fn install_brings_up_ray_then_vllm() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma", "mbb"], 2).await;

    assert!(cluster.ray_status_aligned());
    assert!(cluster.ray_status.iter().all(|rs| rs.status == DeployStatus::Starting));

    // Master got the head command, the worker joined it.
    let master_cmds = fx.host("ma").exec_commands();
    assert!(master_cmds.iter().any(|c| c == "ray stop"));
    assert!(master_cmds.iter().any(|c| c.contains("ray start --head --node-ip-address 10.0.0.2 --port 26379")));
    let worker_cmds = fx.host("mbb").exec_commands();
    assert!(worker_cmds.iter().any(|c| c.contains("ray start --address 10.0.0.2:26379")));

    // Reboot entries registered under the cluster's name.
    let calls = fx.host("mbb").calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        tf_remote::HostCall::AddRebootTask { task_name, .. } if task_name == &format!("{}_ray", cluster.id)
    )));

    // vLLM unit sized to the whole cluster, on the master only.
    let unit_write = master_cmds.iter().find(|c| c.contains("/etc/systemd/system/")).unwrap();
    assert!(unit_write.contains("--tensor-parallel-size=4"));
    assert!(unit_write.contains("--pipeline-parallel-size=2"));
    assert!(unit_write.contains("--served-model-name base_model"));
    assert!(unit_write.contains("VLLM_ALLOW_RUNTIME_LORA_UPDATING=true"));
    assert!(master_cmds.iter().any(|c| c == &format!("systemctl enable {}.service", cluster.id)));
    assert!(!fx.host("mbb").exec_commands().iter().any(|c| c.contains("vllm serve")));
}

#[tokio::test]
async fn ray_failure_marks_the_node_and_the_cluster() {
    let fx = fixture();
    let machine_ids = fx.seed_machines(&["ma", "mbb"], 1);
    fx.host("mbb").on_exec("ray start --address", ExecOutput::failed(1, "no route"));

    let cluster = fx.create_cluster(machine_ids);
    fx.svc.install(&actor(), &cluster.id, tf_core::Locale::En).unwrap();
    let stored = fx.wait_cluster_status(&cluster.id, DeployStatus::Error).await;

    assert_eq!(stored.ray_status[0].status, DeployStatus::Starting);
    assert_eq!(stored.ray_status[1].status, DeployStatus::Error);
    assert!(stored.ray_status[1].error_info.contains("no route"));
    assert!(stored.error_info.contains("no route"));
}

#[tokio::test]
async fn install_is_refused_while_deploying_or_starting() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    let err = fx.svc.install(&actor(), &cluster.id, tf_core::Locale::En).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn uninstall_tears_down_workers_first_and_resets_statuses() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma", "mbb"], 1).await;
    let lora_id = fx.seed_lora(&cluster.id);

    // vLLM unit reports running, ray is up on both nodes.
    fx.host("ma").push_service_status(cluster.id.as_str(), tf_remote::ServiceStatus::Starting, "running");

    let stored = fx.svc.uninstall(&actor(), &cluster.id, tf_core::Locale::En).await.unwrap();
    assert_eq!(stored.status, DeployStatus::Uninstalled);
    assert!(stored.ray_status.iter().all(|rs| rs.status == DeployStatus::Uninstalled));
    assert_eq!(stored.lora(&lora_id).map(|l| l.status), Some(DeployStatus::Uninstalled));

    let master_cmds = fx.host("ma").exec_commands();
    assert!(master_cmds.iter().any(|c| c == &format!("systemctl disable {}.service", cluster.id)));
    assert!(master_cmds.iter().any(|c| c == &format!("systemctl stop {}.service", cluster.id)));
    assert!(fx.host("mbb").exec_commands().iter().any(|c| c == "ray stop"));
}

#[tokio::test]
async fn lora_install_stages_every_node_then_loads_on_the_master() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma", "mbb"], 1).await;
    let lora_id = fx.seed_lora(&cluster.id);

    fx.svc.lora_install(&actor(), &cluster.id, &lora_id, tf_core::Locale::En).unwrap();

    for _ in 0..300 {
        let stored = fx.store.get_cluster(&actor(), &cluster.id).unwrap();
        if stored.lora(&lora_id).map(|l| l.status) == Some(DeployStatus::Starting) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let tar_remote = paths::deploy_lora_tar_path(&cluster.id, &lora_id);
    for machine in ["ma", "mbb"] {
        let uploads = fx.host(machine).uploads();
        assert!(uploads.iter().any(|(r, _)| r == &tar_remote), "{machine} missing upload");
        assert!(fx
            .host(machine)
            .exec_commands()
            .iter()
            .any(|c| c.contains("tar -xzf") && c.contains(lora_id.as_str())));
    }

    let loads = fx.inference.loads.lock().clone();
    assert_eq!(loads.len(), 1);
    let (_, name, path) = &loads[0];
    assert_eq!(name, lora_id.as_str());
    assert_eq!(path, &format!("{}/output", paths::deploy_lora_dir(&cluster.id, &lora_id)));
}

#[tokio::test]
async fn second_lora_install_skips_the_upload() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    let lora_id = fx.seed_lora(&cluster.id);

    fx.svc.install_lora(actor(), cluster.id.clone(), lora_id.clone(), tf_core::Locale::En).await;
    fx.svc.install_lora(actor(), cluster.id.clone(), lora_id.clone(), tf_core::Locale::En).await;

    let uploads = fx.host("ma").uploads();
    assert_eq!(uploads.len(), 2);
    assert!(!uploads[0].1);
    assert!(uploads[1].1, "second staging should be a no-op");
}

#[tokio::test]
async fn failed_load_marks_the_adapter_error() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    let lora_id = fx.seed_lora(&cluster.id);
    fx.inference.fail_loads();

    fx.svc.install_lora(actor(), cluster.id.clone(), lora_id.clone(), tf_core::Locale::En).await;

    let stored = fx.store.get_cluster(&actor(), &cluster.id).unwrap();
    let lora = stored.lora(&lora_id).unwrap();
    assert_eq!(lora.status, DeployStatus::Error);
    assert!(lora.error_info.contains("/v1/load_lora_adapter"));
}

#[tokio::test]
async fn lora_uninstall_posts_the_unload_and_marks_uninstalled() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    let lora_id = fx.seed_lora(&cluster.id);

    fx.svc.lora_uninstall(&actor(), &cluster.id, &lora_id, tf_core::Locale::En).await.unwrap();

    let unloads = fx.inference.unloads.lock().clone();
    assert_eq!(unloads.len(), 1);
    assert_eq!(unloads[0].1, lora_id.as_str());
    let stored = fx.store.get_cluster(&actor(), &cluster.id).unwrap();
    assert_eq!(stored.lora(&lora_id).map(|l| l.status), Some(DeployStatus::Uninstalled));
}

#[tokio::test]
async fn serving_adapters_cannot_be_deleted() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    let lora_id = fx.seed_lora(&cluster.id);
    fx.svc.install_lora(actor(), cluster.id.clone(), lora_id.clone(), tf_core::Locale::En).await;

    let err = fx.svc.lora_delete(&actor(), &cluster.id, &lora_id, tf_core::Locale::En).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    fx.svc.lora_uninstall(&actor(), &cluster.id, &lora_id, tf_core::Locale::En).await.unwrap();
    fx.svc.lora_delete(&actor(), &cluster.id, &lora_id, tf_core::Locale::En).unwrap();
    let stored = fx.store.get_cluster(&actor(), &cluster.id).unwrap();
    assert!(stored.lora(&lora_id).is_none());
}

#[tokio::test]
async fn completion_uses_the_lora_id_as_the_model() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    let lora_id = fx.seed_lora(&cluster.id);
    fx.inference.set_tokens(&["Hel", "lo"]);

    let frames = fx
        .svc
        .completion_stream(
            &actor(),
            CompletionParams {
                cluster_id: cluster.id.clone(),
                lora_id: Some(lora_id.clone()),
                prompt: "hi".into(),
                max_tokens: 16,
                temperature: 0.0,
            },
            tf_core::Locale::En,
        )
        .await
        .unwrap()
        .collect_frames()
        .await;

    assert_eq!(frames, vec!["data: Hel\n\n", "data: lo\n\n", "data: [DONE]\n\n"]);

    let requests = fx.inference.completions.lock().clone();
    assert_eq!(requests[0].model, lora_id.as_str());
    assert!(requests[0].stream);
}

#[tokio::test]
async fn completion_defaults_to_the_base_model() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    fx.inference.set_tokens(&["ok"]);

    fx.svc
        .completion_stream(
            &actor(),
            CompletionParams {
                cluster_id: cluster.id.clone(),
                lora_id: None,
                prompt: "hi".into(),
                max_tokens: 16,
                temperature: 0.0,
            },
            tf_core::Locale::En,
        )
        .await
        .unwrap()
        .collect_frames()
        .await;

    assert_eq!(fx.inference.completions.lock()[0].model, "base_model");
}

#[tokio::test]
async fn completion_rejects_foreign_lora_ids() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;

    let err = fx
        .svc
        .completion_stream(
            &actor(),
            CompletionParams {
                cluster_id: cluster.id.clone(),
                lora_id: Some(LoraId::from_string("lra-foreign")),
                prompt: "hi".into(),
                max_tokens: 16,
                temperature: 0.0,
            },
            tf_core::Locale::En,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn sync_flags_unhealthy_nodes() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma", "mbb"], 1).await;
    fx.host("mbb").on_exec("ray status", ExecOutput::failed(1, "ray down"));

    let stored = fx.svc.sync(&actor(), &cluster.id).await.unwrap();
    assert_eq!(stored.status, DeployStatus::Error);
    assert_eq!(stored.ray_status[1].status, DeployStatus::Error);
    assert!(stored.ray_status[1].error_info.contains("ray down"));
}

#[tokio::test]
async fn sync_confirms_a_healthy_cluster() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    fx.host("ma").push_service_status(cluster.id.as_str(), tf_remote::ServiceStatus::Starting, "running");

    let stored = fx.svc.sync(&actor(), &cluster.id).await.unwrap();
    assert_eq!(stored.status, DeployStatus::Starting);
    assert!(stored.ray_status.iter().all(|rs| rs.status == DeployStatus::Starting));
}

#[tokio::test]
async fn machine_list_is_frozen_after_init() {
    let fx = fixture();
    let cluster = fx.starting_cluster(&["ma"], 1).await;
    let other = fx.seed_machines(&["mx"], 1);

    let updated = fx
        .svc
        .update(
            &actor(),
            &cluster.id,
            DeployUpdate {
                name: "renamed".into(),
                machine_id_list: other,
                base_model: "/models/other".into(),
                finetune_method: "full".into(),
            },
        )
        .unwrap();

    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.base_model, "/models/base");
    assert_eq!(updated.machine_id_list, cluster.machine_id_list);
}
