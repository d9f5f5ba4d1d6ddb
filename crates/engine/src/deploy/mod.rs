// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inference cluster controller: ray head/worker lifecycle, the vLLM unit
//! on the master, LoRA adapters, status sync, and completion streaming.

pub mod completion;
pub mod lora;
pub mod vllm;

pub use completion::{CompletionParams, SseFrames};
pub use lora::LoraCreate;
pub use vllm::{CompletionRequest, HttpInferenceApi, InferenceApi, TokenStream};

#[cfg(any(test, feature = "test-support"))]
pub use vllm::FakeInferenceApi;

use crate::error::EngineError;
use crate::{messages, paths};
use std::sync::Arc;
use std::time::Duration;
use tf_core::{
    Actor, Clock, ClusterId, DeployCluster, DeployStatus, Locale, Machine, MachineId, RayStatus,
};
use tf_remote::{HostFactory, LogStream, ServiceStatus};
use tf_storage::Store;
use tracing::{error, info};

pub(crate) const RAY_PORT: u16 = 26379;
pub(crate) const EXEC_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const INSTALL_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct DeployCreate {
    pub name: String,
    pub machine_id_list: Vec<MachineId>,
    pub base_model: String,
    pub finetune_method: String,
}

/// Field changes; machine list, base model, and method apply only in `Init`.
#[derive(Debug, Clone)]
pub struct DeployUpdate {
    pub name: String,
    pub machine_id_list: Vec<MachineId>,
    pub base_model: String,
    pub finetune_method: String,
}

#[derive(Clone)]
pub struct DeployService<C: Clock> {
    pub(crate) store: Store<C>,
    pub(crate) hosts: Arc<dyn HostFactory>,
    pub(crate) inference: Arc<dyn InferenceApi>,
    pub(crate) clock: C,
}

impl<C: Clock> DeployService<C> {
    pub fn new(
        store: Store<C>,
        hosts: Arc<dyn HostFactory>,
        inference: Arc<dyn InferenceApi>,
        clock: C,
    ) -> Self {
        Self { store, hosts, inference, clock }
    }

    pub fn create(&self, actor: &Actor, create: DeployCreate) -> Result<DeployCluster, EngineError> {
        let now = self.clock.epoch_secs();
        let mut cluster =
            DeployCluster::new(actor, create.name, create.machine_id_list, create.base_model, now);
        cluster.finetune_method = create.finetune_method;
        Ok(self.store.create_cluster(cluster)?)
    }

    /// Only the name is mutable once the cluster has left `Init`.
    pub fn update(
        &self,
        actor: &Actor,
        id: &ClusterId,
        update: DeployUpdate,
    ) -> Result<DeployCluster, EngineError> {
        let cluster = self.store.get_cluster(actor, id)?;
        if cluster.status == DeployStatus::Init {
            Ok(self.store.update_cluster(actor, id, |c| {
                c.name = update.name;
                c.ray_status = RayStatus::init_for(&update.machine_id_list);
                c.machine_id_list = update.machine_id_list;
                c.base_model = update.base_model;
                c.finetune_method = update.finetune_method;
            })?)
        } else {
            Ok(self.store.update_cluster(actor, id, |c| c.name = update.name)?)
        }
    }

    pub fn delete(
        &self,
        actor: &Actor,
        id: &ClusterId,
        locale: Locale,
    ) -> Result<DeployCluster, EngineError> {
        let cluster = self.store.get_cluster(actor, id)?;
        if matches!(cluster.status, DeployStatus::Deploying | DeployStatus::Starting) {
            return Err(EngineError::Validation(messages::cluster_busy(locale)));
        }
        Ok(self.store.delete_cluster(actor, id)?)
    }

    /// Synchronous flip to `Deploying`, then async installation.
    pub fn install(
        &self,
        actor: &Actor,
        id: &ClusterId,
        locale: Locale,
    ) -> Result<DeployCluster, EngineError> {
        let cluster = self.store.get_cluster(actor, id)?;
        if matches!(cluster.status, DeployStatus::Deploying | DeployStatus::Starting) {
            return Err(EngineError::Validation(messages::cluster_busy(locale)));
        }
        let updated =
            self.store.update_cluster(actor, id, |c| c.status = DeployStatus::Deploying)?;

        let svc = self.clone();
        let actor = actor.clone();
        let id = id.clone();
        tokio::spawn(async move { svc.install_cluster(actor, id, locale).await });
        Ok(updated)
    }

    pub(crate) async fn install_cluster(&self, actor: Actor, id: ClusterId, locale: Locale) {
        let Ok(cluster) = self.store.get_cluster(&actor, &id) else {
            error!(cluster = %id, "install: cluster not found");
            return;
        };

        let machines = match self.store.machines_by_ids(&actor, &cluster.machine_id_list) {
            Ok(machines) if !machines.is_empty() => machines,
            _ => {
                let joined = cluster
                    .machine_id_list
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                let _ = self.store.update_cluster(&actor, &id, |c| {
                    c.status = DeployStatus::Error;
                    c.error_info = messages::machine_not_found(locale, &joined);
                });
                return;
            }
        };

        match self.bring_up(&cluster, &machines, locale).await {
            Ok(ray_status) => {
                let _ = self.store.update_cluster(&actor, &id, |c| {
                    c.status = DeployStatus::Starting;
                    c.error_info.clear();
                    c.ray_status = ray_status;
                });
                info!(cluster = %id, "cluster started");
            }
            Err((ray_status, message)) => {
                error!(cluster = %id, error = %message, "cluster install failed");
                let _ = self.store.update_cluster(&actor, &id, |c| {
                    c.status = DeployStatus::Error;
                    c.error_info = message;
                    c.ray_status = ray_status;
                });
            }
        }
    }

    /// Start ray across the nodes, then the vLLM unit on the master.
    /// Returns the per-node ray states alongside any fatal error.
    async fn bring_up(
        &self,
        cluster: &DeployCluster,
        machines: &[Machine],
        locale: Locale,
    ) -> Result<Vec<RayStatus>, (Vec<RayStatus>, String)> {
        let mut ray_status = RayStatus::init_for(&cluster.machine_id_list);
        let mut failure = String::new();
        let mut gpu_num = 0u32;
        let master_internal = machines[0].conn.internal_ip.clone();
        let reboot_name = format!("{}_ray", cluster.id);

        for (index, machine) in machines.iter().enumerate() {
            gpu_num += machine.gpu_count;
            let host = self.hosts.host(machine);

            // Stop first so a reinstall is idempotent.
            let _ = host.execute_command("ray stop", INSTALL_TIMEOUT).await;
            let _ = host.remove_reboot_task_by_name(&reboot_name).await;

            let cmd = if index == 0 {
                format!(
                    "ray start --head --node-ip-address {master_internal} --port {RAY_PORT} --dashboard-host 0.0.0.0"
                )
            } else {
                format!("ray start --address {master_internal}:{RAY_PORT}")
            };

            let outcome = host.execute_command(&cmd, INSTALL_TIMEOUT).await;
            match outcome {
                Ok(out) if out.success() => {
                    // Survive node reboots: re-join the cluster via cron.
                    match host.add_reboot_task(&cmd, &reboot_name).await {
                        Ok(()) => {
                            ray_status[index].status = DeployStatus::Starting;
                            ray_status[index].error_info.clear();
                        }
                        Err(e) => {
                            ray_status[index].status = DeployStatus::Error;
                            ray_status[index].error_info = e.to_string();
                            failure = e.to_string();
                        }
                    }
                }
                Ok(out) => {
                    ray_status[index].status = DeployStatus::Error;
                    ray_status[index].error_info = out.stderr.clone();
                    failure = out.stderr;
                }
                Err(e) => {
                    ray_status[index].status = DeployStatus::Error;
                    ray_status[index].error_info = e.to_string();
                    failure = e.to_string();
                }
            }
        }

        if !failure.is_empty() {
            return Err((ray_status, messages::deploy_failed(locale, &failure)));
        }

        // vLLM OpenAI server on the master, sized to the whole cluster.
        let master_host = self.hosts.host(&machines[0]);
        let unit = render_vllm_unit(&cluster.id, &cluster.base_model, gpu_num, machines.len());
        let cmds = vec![
            format!("cat << 'EOF' > /etc/systemd/system/{}.service\n{unit}\nEOF", cluster.id),
            "systemctl daemon-reload".to_string(),
            format!("mkdir -p {}", paths::deploy_work_dir(&cluster.id)),
            format!("systemctl enable {}.service", cluster.id),
            format!("systemctl start {}.service", cluster.id),
        ];
        for cmd in &cmds {
            match master_host.execute_command(cmd, INSTALL_TIMEOUT).await {
                Ok(out) if out.success() => {}
                Ok(out) => {
                    return Err((
                        ray_status,
                        messages::start_deploy_failed(locale, out.exit_code, &out.stderr),
                    ));
                }
                Err(e) => return Err((ray_status, e.to_string())),
            }
        }

        Ok(ray_status)
    }

    /// Tear down in reverse: vLLM on the master, then ray workers-first.
    pub async fn uninstall(
        &self,
        actor: &Actor,
        id: &ClusterId,
        locale: Locale,
    ) -> Result<DeployCluster, EngineError> {
        let cluster = self.store.get_cluster(actor, id)?;
        if cluster.status != DeployStatus::Starting {
            return Err(EngineError::Validation(messages::only_starting_cluster(locale)));
        }
        let machines = self.store.machines_by_ids(actor, &cluster.machine_id_list)?;

        let master_host = self.hosts.host(&machines[0]);
        let _ = master_host
            .execute_command(&format!("systemctl disable {id}.service"), EXEC_TIMEOUT)
            .await;
        let (service_status, _) = master_host.monitor_service_status(id.as_str()).await?;
        if service_status == ServiceStatus::Starting {
            let out = master_host
                .execute_command(&format!("systemctl stop {id}.service"), EXEC_TIMEOUT)
                .await?;
            if !out.success() {
                return Err(EngineError::Internal(messages::stop_cluster_failed(
                    locale,
                    &out.stderr,
                )));
            }
        }
        let _ = master_host
            .execute_command(&format!("rm -rf /etc/systemd/system/{id}.service"), EXEC_TIMEOUT)
            .await;

        let reboot_name = format!("{}_ray", cluster.id);
        for machine in machines.iter().rev() {
            let host = self.hosts.host(machine);
            let _ = host.remove_reboot_task_by_name(&reboot_name).await;
            // Only stop ray where it is actually up, for idempotence.
            let probe = host.execute_command("ray status", EXEC_TIMEOUT).await?;
            if probe.success() {
                let out = host.execute_command("ray stop", EXEC_TIMEOUT).await?;
                if !out.success() {
                    return Err(EngineError::Internal(messages::stop_cluster_failed(
                        locale,
                        &out.stderr,
                    )));
                }
            }
        }

        Ok(self.store.update_cluster(actor, id, |c| {
            c.status = DeployStatus::Uninstalled;
            for ray in &mut c.ray_status {
                ray.status = DeployStatus::Uninstalled;
                ray.error_info.clear();
            }
            for lora in &mut c.lora_infos {
                lora.status = DeployStatus::Uninstalled;
            }
        })?)
    }

    /// Probe ray on every node and the vLLM unit on the master, updating
    /// the stored statuses in place.
    pub async fn sync(
        &self,
        actor: &Actor,
        id: &ClusterId,
    ) -> Result<DeployCluster, EngineError> {
        let cluster = self.store.get_cluster(actor, id)?;
        let machines = self.store.machines_by_ids(actor, &cluster.machine_id_list)?;

        let mut ray_status = RayStatus::init_for(&cluster.machine_id_list);
        let mut failure = String::new();
        for (index, machine) in machines.iter().enumerate() {
            let host = self.hosts.host(machine);
            match host.execute_command("ray status", EXEC_TIMEOUT).await {
                Ok(out) if out.success() => ray_status[index].status = DeployStatus::Starting,
                Ok(out) => {
                    ray_status[index].status = DeployStatus::Error;
                    ray_status[index].error_info = out.stderr.clone();
                    failure = out.stderr;
                }
                Err(e) => {
                    ray_status[index].status = DeployStatus::Error;
                    ray_status[index].error_info = e.to_string();
                    failure = e.to_string();
                }
            }
        }

        if !failure.is_empty() {
            return Ok(self.store.update_cluster(actor, id, |c| {
                c.status = DeployStatus::Error;
                c.error_info = failure;
                c.ray_status = ray_status;
            })?);
        }

        let master_host = self.hosts.host(&machines[0]);
        let (service_status, detail) = master_host.monitor_service_status(id.as_str()).await?;
        let status = if service_status == ServiceStatus::Starting {
            DeployStatus::Starting
        } else {
            DeployStatus::Error
        };
        Ok(self.store.update_cluster(actor, id, |c| {
            c.status = status;
            c.error_info = if status == DeployStatus::Error { detail.clone() } else { String::new() };
            c.ray_status = ray_status;
        })?)
    }

    /// Live tail of the vLLM log on the master.
    pub async fn cluster_logs(
        &self,
        actor: &Actor,
        id: &ClusterId,
    ) -> Result<LogStream, EngineError> {
        let cluster = self.store.get_cluster(actor, id)?;
        let machines = self.store.machines_by_ids(actor, &cluster.machine_id_list)?;
        let host = self.hosts.host(&machines[0]);
        Ok(host.tail_log(&paths::deploy_log_path(id)).await?)
    }
}

fn render_vllm_unit(id: &ClusterId, base_model: &str, gpu_num: u32, machine_count: usize) -> String {
    let work_dir = paths::deploy_work_dir(id);
    let log_path = paths::deploy_log_path(id);
    let serve = format!(
        "vllm serve {base_model} --served-model-name base_model --enable-lora \
--tensor-parallel-size={gpu_num} --pipeline-parallel-size={machine_count} \
--gpu-memory-utilization 0.9 --distributed-executor-backend ray \
--host 0.0.0.0 --port {}",
        vllm::VLLM_PORT
    );
    format!(
        "[Unit]\n\
Description=deploy job\n\
\n\
[Service]\n\
Type=simple\n\
WorkingDirectory={work_dir}\n\
ExecStart=/bin/bash -c '{serve} >> {log_path} 2>&1'\n\
Restart=no\n\
Environment=VLLM_USE_MODELSCOPE=true\n\
Environment=VLLM_ALLOW_RUNTIME_LORA_UPDATING=true\n\
\n\
[Install]\n\
WantedBy=multi-user.target"
    )
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
