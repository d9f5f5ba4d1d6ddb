// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The materialized entity state persisted in snapshots.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tf_core::{
    Catalog, Dataset, DatasetVersion, DeployCluster, FilePair, FinetuneConfig, FinetuneJob, GaPair,
    Job, Machine, Project, ProviderModel, Question, Release, SourceFile, Tag,
};

/// Every entity table, keyed by ID. Deleted rows stay in the map with a
/// nonzero `is_deleted`; readers are responsible for filtering.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub jobs: HashMap<String, Job>,
    #[serde(default)]
    pub projects: HashMap<String, Project>,
    #[serde(default)]
    pub files: HashMap<String, SourceFile>,
    #[serde(default)]
    pub file_pairs: HashMap<String, FilePair>,
    #[serde(default)]
    pub ga_pairs: HashMap<String, GaPair>,
    #[serde(default)]
    pub questions: HashMap<String, Question>,
    #[serde(default)]
    pub datasets: HashMap<String, Dataset>,
    #[serde(default)]
    pub tags: HashMap<String, Tag>,
    #[serde(default)]
    pub catalogs: HashMap<String, Catalog>,
    #[serde(default)]
    pub dataset_versions: HashMap<String, DatasetVersion>,
    #[serde(default)]
    pub machines: HashMap<String, Machine>,
    #[serde(default)]
    pub provider_models: HashMap<String, ProviderModel>,
    #[serde(default)]
    pub finetune_configs: HashMap<String, FinetuneConfig>,
    #[serde(default)]
    pub finetune_jobs: HashMap<String, FinetuneJob>,
    #[serde(default)]
    pub clusters: HashMap<String, DeployCluster>,
    #[serde(default)]
    pub releases: HashMap<String, Release>,
}
