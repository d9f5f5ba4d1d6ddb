// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dataset version materialization: an immutable JSONL view of selected
//! dataset rows, one `{instruction, input, output}` object per line.

use crate::context::EngineConfig;
use crate::error::EngineError;
use crate::messages;
use crate::paths;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tf_core::{
    Actor, Clock, Dataset, DatasetId, DatasetVersion, DatasetVersionId, DatasetVersionOptions,
    Locale, Meta, ProjectId, SftRecord, TrainStage,
};
use tf_storage::Store;
use tracing::info;

const WRITE_BATCH: usize = 1000;

#[derive(Debug, Clone)]
pub struct DatasetVersionCreate {
    pub project_id: ProjectId,
    pub name: String,
    pub description: String,
    pub dataset_type: TrainStage,
    pub dataset_id_list: Vec<DatasetId>,
    pub options: DatasetVersionOptions,
}

#[derive(Clone)]
pub struct DatasetVersionService<C: Clock> {
    store: Store<C>,
    config: EngineConfig,
    clock: C,
}

impl<C: Clock> DatasetVersionService<C> {
    pub fn new(store: Store<C>, config: EngineConfig, clock: C) -> Self {
        Self { store, config, clock }
    }

    pub fn version_path(&self, id: &DatasetVersionId) -> PathBuf {
        paths::dataset_version_file(&self.config.dataset_version_dir, id)
    }

    /// Create the row and write the file in one go. Only SFT is accepted;
    /// the other stages stay on the enum but are rejected here.
    pub fn create(
        &self,
        actor: &Actor,
        create: DatasetVersionCreate,
        locale: Locale,
    ) -> Result<DatasetVersion, EngineError> {
        if create.dataset_type != TrainStage::Sft {
            return Err(EngineError::Validation(messages::validation_failed(
                locale,
                "dataset_type",
            )));
        }

        let version = self.store.create_dataset_version(DatasetVersion {
            id: DatasetVersionId::new(),
            meta: Meta::new(actor, self.clock.epoch_secs()),
            project_id: create.project_id,
            name: create.name,
            description: create.description,
            dataset_type: create.dataset_type,
            options: create.options,
        })?;

        let path = self.version_path(&version.id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&path)
            .map_err(|e| EngineError::Internal(messages::write_file_failed(locale, &e.to_string())))?;

        let mut written = 0usize;
        for batch in create.dataset_id_list.chunks(WRITE_BATCH) {
            let rows = self.store.datasets_by_ids(actor, batch);
            for dataset in &rows {
                let record = sft_record(dataset, version.options.output_with_cot);
                let line = serde_json::to_string(&record)
                    .map_err(|e| EngineError::Internal(e.to_string()))?;
                writeln!(file, "{line}").map_err(|e| {
                    EngineError::Internal(messages::write_file_failed(locale, &e.to_string()))
                })?;
                written += 1;
            }
        }
        info!(version = %version.id, rows = written, "dataset version materialized");
        Ok(version)
    }

    /// Soft-delete the row and remove the materialized file.
    pub fn delete(
        &self,
        actor: &Actor,
        id: &DatasetVersionId,
    ) -> Result<DatasetVersion, EngineError> {
        let version = self.store.delete_dataset_version(actor, id)?;
        std::fs::remove_file(self.version_path(id))?;
        Ok(version)
    }
}

/// Serialize one dataset row for the SFT stage. With `output_with_cot` set
/// and a nonempty chain, the output embeds the chain before the answer.
pub fn sft_record(dataset: &Dataset, output_with_cot: bool) -> SftRecord {
    let output = if output_with_cot && !dataset.cot.is_empty() {
        format!("<think>{}<\\think>\n{}", dataset.cot, dataset.answer)
    } else {
        dataset.answer.clone()
    };
    SftRecord { instruction: dataset.question.clone(), input: String::new(), output }
}

/// Read a materialized file back into records.
pub fn read_records(path: &std::path::Path) -> Result<Vec<SftRecord>, EngineError> {
    let file = std::fs::File::open(path)?;
    let mut records = Vec::new();
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(
            serde_json::from_str(&line).map_err(|e| EngineError::Internal(e.to_string()))?,
        );
    }
    Ok(records)
}

#[cfg(test)]
#[path = "dataset_version_tests.rs"]
mod tests;
