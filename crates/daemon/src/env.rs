// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration from the environment.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Snapshot store location.
    pub state_dir: PathBuf,
    /// Dataset version `.jsonl` materialization directory.
    pub dataset_version_dir: PathBuf,
    /// Local artifact store for fine-tune logs and lora tarballs.
    pub finetune_local_dir: PathBuf,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            state_dir: required("TF_STATE_DIR")?,
            dataset_version_dir: required("DATASET_VERSION_DIR")?,
            finetune_local_dir: required("FINETUNE_FILE_LOCAL_DIR")?,
            debug: std::env::var("DEBUG").is_ok_and(|v| v.eq_ignore_ascii_case("true")),
        })
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }

    pub fn engine(&self) -> tf_engine::EngineConfig {
        tf_engine::EngineConfig {
            dataset_version_dir: self.dataset_version_dir.clone(),
            finetune_local_dir: self.finetune_local_dir.clone(),
        }
    }
}

fn required(key: &'static str) -> Result<PathBuf, ConfigError> {
    std::env::var(key).map(PathBuf::from).map_err(|_| ConfigError::Missing(key))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
