// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Request rejected before any work started; the message is already
    /// localized for the caller.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] tf_storage::StorageError),
    #[error(transparent)]
    Remote(#[from] tf_remote::RemoteError),
    #[error(transparent)]
    Llm(#[from] tf_llm::LlmError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Internal(String),
}
