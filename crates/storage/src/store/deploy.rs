// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy cluster rows. LoRA transitions go through [`Store::update_lora`]
//! so they are serialized per adapter by the state lock.

use super::{get_row, get_row_mut, visible, Store};
use crate::error::StorageError;
use tf_core::{Actor, Clock, ClusterId, DeployCluster, LoraId, LoraInfo};

impl<C: Clock> Store<C> {
    pub fn create_cluster(&self, cluster: DeployCluster) -> Result<DeployCluster, StorageError> {
        self.mutate(|state, now| {
            let mut cluster = cluster;
            super::stamp_new(&mut cluster, now);
            state.clusters.insert(cluster.id.to_string(), cluster.clone());
            Ok(cluster)
        })
    }

    pub fn get_cluster(&self, actor: &Actor, id: &ClusterId) -> Result<DeployCluster, StorageError> {
        self.read(|state| get_row(&state.clusters, actor, "Deploy cluster", id).cloned())
    }

    pub fn list_clusters(&self, actor: &Actor) -> Vec<DeployCluster> {
        self.read(|state| {
            let mut clusters: Vec<DeployCluster> = visible(&state.clusters, actor).cloned().collect();
            clusters.sort_by_key(|c| c.meta.created_at);
            clusters
        })
    }

    pub fn update_cluster(
        &self,
        actor: &Actor,
        id: &ClusterId,
        f: impl FnOnce(&mut DeployCluster),
    ) -> Result<DeployCluster, StorageError> {
        self.mutate(|state, now| {
            let cluster = get_row_mut(&mut state.clusters, actor, "Deploy cluster", id)?;
            f(cluster);
            cluster.meta.touch(now);
            Ok(cluster.clone())
        })
    }

    /// Apply `f` to one adapter entry.
    pub fn update_lora(
        &self,
        actor: &Actor,
        cluster_id: &ClusterId,
        lora_id: &LoraId,
        f: impl FnOnce(&mut LoraInfo),
    ) -> Result<LoraInfo, StorageError> {
        self.mutate(|state, now| {
            let cluster = get_row_mut(&mut state.clusters, actor, "Deploy cluster", cluster_id)?;
            let lora = cluster
                .lora_mut(lora_id)
                .ok_or_else(|| StorageError::not_found("Lora adaptor", lora_id.as_str()))?;
            f(lora);
            let lora = lora.clone();
            cluster.meta.touch(now);
            Ok(lora)
        })
    }

    pub fn remove_lora(
        &self,
        actor: &Actor,
        cluster_id: &ClusterId,
        lora_id: &LoraId,
    ) -> Result<(), StorageError> {
        self.mutate(|state, now| {
            let cluster = get_row_mut(&mut state.clusters, actor, "Deploy cluster", cluster_id)?;
            cluster.lora_infos.retain(|l| &l.id != lora_id);
            cluster.meta.touch(now);
            Ok(())
        })
    }

    pub fn delete_cluster(&self, actor: &Actor, id: &ClusterId) -> Result<DeployCluster, StorageError> {
        self.mutate(|state, now| {
            let cluster = get_row_mut(&mut state.clusters, actor, "Deploy cluster", id)?;
            cluster.meta.soft_delete(now);
            Ok(cluster.clone())
        })
    }
}
