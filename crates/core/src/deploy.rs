// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inference deploy clusters and LoRA adapter records.

use crate::finetune::TrainStage;
use crate::machine::MachineId;
use crate::meta::{Actor, Meta};
use crate::release::ReleaseId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a deploy cluster.
    pub struct ClusterId("dpc-");
}

crate::define_id! {
    /// Unique identifier for a LoRA adapter deployment.
    pub struct LoraId("lra-");
}

/// Shared lifecycle for clusters, per-node ray state, and LoRA adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployStatus {
    Init,
    Deploying,
    Starting,
    Uninstalled,
    Error,
}

crate::simple_display! {
    DeployStatus {
        Init => "Init",
        Deploying => "Deploying",
        Starting => "Starting",
        Uninstalled => "Uninstalled",
        Error => "Error",
    }
}

/// Per-node ray state, index-aligned with the cluster machine list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RayStatus {
    pub machine_id: MachineId,
    pub status: DeployStatus,
    #[serde(default)]
    pub error_info: String,
}

impl RayStatus {
    /// One `Init` entry per machine, in machine-list order.
    pub fn init_for(machine_ids: &[MachineId]) -> Vec<RayStatus> {
        machine_ids
            .iter()
            .map(|id| RayStatus {
                machine_id: id.clone(),
                status: DeployStatus::Init,
                error_info: String::new(),
            })
            .collect()
    }
}

/// A LoRA adapter attached to a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoraInfo {
    pub id: LoraId,
    pub release_id: ReleaseId,
    /// Local path of the adapter tarball to stage onto the nodes.
    pub model_path: String,
    pub stage: TrainStage,
    pub status: DeployStatus,
    #[serde(default)]
    pub error_info: String,
}

/// A head/worker inference cluster running ray + vLLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployCluster {
    pub id: ClusterId,
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    /// Ordered; the first machine is the master.
    pub machine_id_list: Vec<MachineId>,
    pub ray_status: Vec<RayStatus>,
    pub status: DeployStatus,
    #[serde(default)]
    pub error_info: String,
    pub base_model: String,
    #[serde(default)]
    pub finetune_method: String,
    #[serde(default)]
    pub lora_infos: Vec<LoraInfo>,
}

impl DeployCluster {
    pub fn new(
        actor: &Actor,
        name: impl Into<String>,
        machine_id_list: Vec<MachineId>,
        base_model: impl Into<String>,
        now: u64,
    ) -> Self {
        let ray_status = RayStatus::init_for(&machine_id_list);
        Self {
            id: ClusterId::new(),
            meta: Meta::new(actor, now),
            name: name.into(),
            machine_id_list,
            ray_status,
            status: DeployStatus::Init,
            error_info: String::new(),
            base_model: base_model.into(),
            finetune_method: String::new(),
            lora_infos: Vec::new(),
        }
    }

    pub fn master_id(&self) -> Option<&MachineId> {
        self.machine_id_list.first()
    }

    pub fn lora(&self, lora_id: &LoraId) -> Option<&LoraInfo> {
        self.lora_infos.iter().find(|l| &l.id == lora_id)
    }

    pub fn lora_mut(&mut self, lora_id: &LoraId) -> Option<&mut LoraInfo> {
        self.lora_infos.iter_mut().find(|l| &l.id == lora_id)
    }

    /// `ray_status` must stay index-aligned with `machine_id_list`.
    pub fn ray_status_aligned(&self) -> bool {
        self.ray_status.len() == self.machine_id_list.len()
            && self
                .ray_status
                .iter()
                .zip(&self.machine_id_list)
                .all(|(rs, id)| &rs.machine_id == id)
    }

    pub fn actor(&self) -> Actor {
        self.meta.actor()
    }
}

crate::record_impl!(DeployCluster);

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
