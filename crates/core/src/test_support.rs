// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures and proptest strategies for tests across the workspace.

use crate::chunk::{ChunkConfig, TocBuildAction};
use crate::document::{
    DatasetVersion, DatasetVersionId, DatasetVersionOptions, ProjectId, SourceFile,
};
use crate::finetune::{ConfigType, FinetuneConfig};
use crate::job::Progress;
use crate::machine::{ConnInfo, Machine, MachineId};
use crate::meta::{Actor, Meta};
use crate::TrainStage;

/// Fixed epoch used by fixtures; pair with `FakeClock::set_epoch_secs`.
pub const NOW: u64 = 1_700_000_000;

pub fn actor() -> Actor {
    Actor::new("user-1", "group-1")
}

pub fn conn(ip: &str, internal_ip: &str) -> ConnInfo {
    ConnInfo {
        ip: ip.to_string(),
        internal_ip: internal_ip.to_string(),
        ssh_port: 22,
        ssh_user: "root".to_string(),
        ssh_password: Some("secret".to_string()),
        ssh_private_key: None,
    }
}

pub fn machine(hostname: &str, gpu_count: u32) -> Machine {
    Machine::new(&actor(), hostname, conn("192.168.1.10", "10.0.0.10"), NOW).gpu_count(gpu_count)
}

pub fn machine_with_id(id: &str, hostname: &str, gpu_count: u32) -> Machine {
    let mut m = machine(hostname, gpu_count);
    m.id = MachineId::from_string(id);
    m
}

pub fn source_file(project_id: &ProjectId, name: &str, content: &str) -> SourceFile {
    SourceFile::new(&actor(), project_id.clone(), name, content, NOW)
}

pub fn dataset_version(project_id: &ProjectId, name: &str) -> DatasetVersion {
    DatasetVersion {
        id: DatasetVersionId::new(),
        meta: Meta::new(&actor(), NOW),
        project_id: project_id.clone(),
        name: name.to_string(),
        description: String::new(),
        dataset_type: TrainStage::Sft,
        options: DatasetVersionOptions::default(),
    }
}

pub fn config(config_type: ConfigType, entries: &[(&str, serde_json::Value)]) -> FinetuneConfig {
    let mut map = serde_json::Map::new();
    for (k, v) in entries {
        map.insert((*k).to_string(), v.clone());
    }
    FinetuneConfig::new(&actor(), format!("{config_type}"), config_type, map, NOW)
}

pub fn chunk_config() -> ChunkConfig {
    ChunkConfig::default()
}

pub fn toc_keep() -> TocBuildAction {
    TocBuildAction::Keep
}

/// Proptest strategies for invariant-style tests.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    /// A progress value that always satisfies `done_count <= total`.
    pub fn arb_progress() -> impl Strategy<Value = Progress> {
        (0u32..1000).prop_flat_map(|total| {
            (Just(total), 0..=total).prop_map(|(total, done_count)| Progress { total, done_count })
        })
    }

    pub fn arb_log_line() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ._-]{0,40}"
    }
}
