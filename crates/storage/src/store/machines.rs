// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine and LLM provider-model rows.

use super::{get_row, get_row_mut, stamp_new, visible, Store};
use crate::error::StorageError;
use tf_core::{Actor, Clock, Machine, MachineId, ProviderModel, ProviderModelId};

impl<C: Clock> Store<C> {
    pub fn add_machine(&self, machine: Machine) -> Result<Machine, StorageError> {
        self.mutate(|state, now| {
            let mut machine = machine;
            stamp_new(&mut machine, now);
            state.machines.insert(machine.id.to_string(), machine.clone());
            Ok(machine)
        })
    }

    pub fn get_machine(&self, actor: &Actor, id: &MachineId) -> Result<Machine, StorageError> {
        self.read(|state| get_row(&state.machines, actor, "Machine", id).cloned())
    }

    /// Fetch machines in the order of `ids`, erroring on the first missing one.
    pub fn machines_by_ids(
        &self,
        actor: &Actor,
        ids: &[MachineId],
    ) -> Result<Vec<Machine>, StorageError> {
        self.read(|state| {
            ids.iter().map(|id| get_row(&state.machines, actor, "Machine", id).cloned()).collect()
        })
    }

    pub fn list_machines(&self, actor: &Actor) -> Vec<Machine> {
        self.read(|state| {
            let mut machines: Vec<Machine> = visible(&state.machines, actor).cloned().collect();
            machines.sort_by_key(|m| m.meta.created_at);
            machines
        })
    }

    pub fn delete_machine(&self, actor: &Actor, id: &MachineId) -> Result<Machine, StorageError> {
        self.mutate(|state, now| {
            let machine = get_row_mut(&mut state.machines, actor, "Machine", id)?;
            machine.meta.soft_delete(now);
            Ok(machine.clone())
        })
    }

    pub fn add_provider_model(&self, model: ProviderModel) -> Result<ProviderModel, StorageError> {
        self.mutate(|state, now| {
            let mut model = model;
            stamp_new(&mut model, now);
            state.provider_models.insert(model.id.to_string(), model.clone());
            Ok(model)
        })
    }

    /// Make `id` the process-wide default, clearing any previous default.
    pub fn set_default_model(
        &self,
        actor: &Actor,
        id: &ProviderModelId,
    ) -> Result<ProviderModel, StorageError> {
        self.mutate(|state, now| {
            get_row(&state.provider_models, actor, "ProviderModel", id)?;
            for model in state.provider_models.values_mut() {
                if model.is_default {
                    model.is_default = false;
                    model.meta.touch(now);
                }
            }
            let model = get_row_mut(&mut state.provider_models, actor, "ProviderModel", id)?;
            model.is_default = true;
            model.meta.touch(now);
            Ok(model.clone())
        })
    }

    /// The current default model, if any. Read lock-free of any caller state;
    /// callers re-read on every LLM call so operator edits apply immediately.
    pub fn default_model(&self) -> Option<ProviderModel> {
        self.read(|state| {
            state
                .provider_models
                .values()
                .find(|m| m.meta.is_live() && m.is_valid && m.is_default)
                .cloned()
        })
    }
}
