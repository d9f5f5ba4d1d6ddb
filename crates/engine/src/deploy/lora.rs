// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LoRA adapter lifecycle on a running cluster.
//!
//! Per adapter: `Init → Deploying → Starting → Uninstalled`, with `Error`
//! reachable from `Deploying`. Transitions are serialized per adapter by
//! the store's state lock.

use super::{DeployService, INSTALL_TIMEOUT};
use crate::error::EngineError;
use crate::{messages, paths};
use tf_core::{
    Actor, Clock, ClusterId, DeployStatus, Locale, LoraId, LoraInfo, ReleaseId, TrainStage,
};
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct LoraCreate {
    pub release_id: ReleaseId,
    /// Local path of the adapter tarball (a release's `model_path`).
    pub model_path: String,
    pub stage: TrainStage,
}

impl<C: Clock> DeployService<C> {
    /// Register an adapter on the cluster with status `Init`.
    pub fn lora_create(
        &self,
        actor: &Actor,
        cluster_id: &ClusterId,
        create: LoraCreate,
    ) -> Result<LoraId, EngineError> {
        let lora_id = LoraId::new();
        let info = LoraInfo {
            id: lora_id.clone(),
            release_id: create.release_id,
            model_path: create.model_path,
            stage: create.stage,
            status: DeployStatus::Init,
            error_info: String::new(),
        };
        self.store.update_cluster(actor, cluster_id, |c| c.lora_infos.push(info))?;
        Ok(lora_id)
    }

    /// Flip the adapter to `Deploying` and stage + load it asynchronously.
    pub fn lora_install(
        &self,
        actor: &Actor,
        cluster_id: &ClusterId,
        lora_id: &LoraId,
        locale: Locale,
    ) -> Result<(), EngineError> {
        let cluster = self.store.get_cluster(actor, cluster_id)?;
        if cluster.status != DeployStatus::Starting {
            return Err(EngineError::Validation(messages::only_starting_cluster(locale)));
        }
        if cluster.lora(lora_id).is_none() {
            return Err(EngineError::Validation(messages::lora_not_found(locale, lora_id)));
        }
        self.store.update_lora(actor, cluster_id, lora_id, |l| {
            l.status = DeployStatus::Deploying;
        })?;

        let svc = self.clone();
        let actor = actor.clone();
        let cluster_id = cluster_id.clone();
        let lora_id = lora_id.clone();
        tokio::spawn(async move {
            svc.install_lora(actor, cluster_id, lora_id, locale).await;
        });
        Ok(())
    }

    pub(crate) async fn install_lora(
        &self,
        actor: Actor,
        cluster_id: ClusterId,
        lora_id: LoraId,
        locale: Locale,
    ) {
        match self.stage_and_load_lora(&actor, &cluster_id, &lora_id, locale).await {
            Ok(()) => {
                let _ = self.store.update_lora(&actor, &cluster_id, &lora_id, |l| {
                    l.status = DeployStatus::Starting;
                    l.error_info.clear();
                });
                info!(cluster = %cluster_id, lora = %lora_id, "lora adapter loaded");
            }
            Err(e) => {
                error!(cluster = %cluster_id, lora = %lora_id, error = %e, "lora install failed");
                let _ = self.store.update_lora(&actor, &cluster_id, &lora_id, |l| {
                    l.status = DeployStatus::Error;
                    l.error_info = e.to_string();
                });
            }
        }
    }

    async fn stage_and_load_lora(
        &self,
        actor: &Actor,
        cluster_id: &ClusterId,
        lora_id: &LoraId,
        locale: Locale,
    ) -> Result<(), EngineError> {
        let cluster = self.store.get_cluster(actor, cluster_id)?;
        let lora = cluster
            .lora(lora_id)
            .ok_or_else(|| EngineError::Validation(messages::lora_not_found(locale, lora_id)))?;
        let machines = self.store.machines_by_ids(actor, &cluster.machine_id_list)?;

        let tar_remote = paths::deploy_lora_tar_path(cluster_id, lora_id);
        let lora_dir = paths::deploy_lora_dir(cluster_id, lora_id);
        for machine in &machines {
            let host = self.hosts.host(machine);
            // Idempotent: the tarball upload no-ops when already staged.
            host.upload_with_dirs(std::path::Path::new(&lora.model_path), &tar_remote, false)
                .await?;
            let out = host
                .execute_command(&format!("tar -xzf {tar_remote} -C {lora_dir}"), INSTALL_TIMEOUT)
                .await?;
            if !out.success() {
                return Err(EngineError::Internal(out.stderr));
            }
        }

        let master_ip = machines[0].conn.ip.clone();
        self.inference
            .load_lora(&master_ip, lora_id.as_str(), &format!("{lora_dir}/output"), locale)
            .await
    }

    /// Unload from vLLM and mark `Uninstalled`.
    pub async fn lora_uninstall(
        &self,
        actor: &Actor,
        cluster_id: &ClusterId,
        lora_id: &LoraId,
        locale: Locale,
    ) -> Result<(), EngineError> {
        let cluster = self.store.get_cluster(actor, cluster_id)?;
        if cluster.status != DeployStatus::Starting {
            return Err(EngineError::Validation(messages::only_starting_cluster(locale)));
        }
        if cluster.lora(lora_id).is_none() {
            return Err(EngineError::Validation(messages::lora_not_found(locale, lora_id)));
        }
        let machines = self.store.machines_by_ids(actor, &cluster.machine_id_list)?;

        self.inference.unload_lora(&machines[0].conn.ip, lora_id.as_str(), locale).await?;
        self.store.update_lora(actor, cluster_id, lora_id, |l| {
            l.status = DeployStatus::Uninstalled;
        })?;
        Ok(())
    }

    /// Remove the adapter record; refused while it is deploying or serving.
    pub fn lora_delete(
        &self,
        actor: &Actor,
        cluster_id: &ClusterId,
        lora_id: &LoraId,
        locale: Locale,
    ) -> Result<(), EngineError> {
        let cluster = self.store.get_cluster(actor, cluster_id)?;
        if let Some(lora) = cluster.lora(lora_id) {
            if matches!(lora.status, DeployStatus::Deploying | DeployStatus::Starting) {
                return Err(EngineError::Validation(messages::lora_busy(locale)));
            }
        }
        self.store.remove_lora(actor, cluster_id, lora_id)?;
        Ok(())
    }
}
