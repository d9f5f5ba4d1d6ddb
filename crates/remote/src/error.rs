// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("SSH authentication failed: {0}")]
    AuthFailed(String),
    #[error("machine unreachable: {0}")]
    Unreachable(String),
    #[error("command failed. exit_code: {exit_code}, error: {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },
    #[error("remote file not found: {0}")]
    NotFound(String),
    #[error("operation timed out: {0}")]
    Timeout(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session error: {0}")]
    Session(String),
}
