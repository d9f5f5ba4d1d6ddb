// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The gateway trait and its supporting types.

use crate::error::RemoteError;
use crate::status::ServiceStatus;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tf_core::Machine;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Connection parameters for one host, copied out of a [`Machine`] snapshot.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub ip: String,
    pub ssh_port: u16,
    pub ssh_user: String,
    pub ssh_password: Option<String>,
    pub ssh_private_key: Option<String>,
}

impl HostConfig {
    pub fn from_machine(machine: &Machine) -> Self {
        Self {
            ip: machine.conn.ip.clone(),
            ssh_port: machine.conn.ssh_port,
            ssh_user: machine.conn.ssh_user.clone(),
            ssh_password: machine.conn.ssh_password.clone(),
            ssh_private_key: machine.conn.ssh_private_key.clone(),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip, self.ssh_port)
    }
}

/// Output of a one-shot exec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: String::new(), exit_code: 0 }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self { stdout: String::new(), stderr: stderr.into(), exit_code }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A live `tail -f` over SSH. Complete lines only; the partial tail stays
/// buffered on the producer side. Dropping the stream (or firing the stop
/// token) ends the remote channel.
pub struct LogStream {
    lines: mpsc::Receiver<String>,
    stop: CancellationToken,
}

impl LogStream {
    pub fn new(lines: mpsc::Receiver<String>, stop: CancellationToken) -> Self {
        Self { lines, stop }
    }

    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// A streaming remote file read with an overall deadline.
pub struct ByteChunks {
    chunks: mpsc::Receiver<Result<String, RemoteError>>,
}

impl ByteChunks {
    pub fn new(chunks: mpsc::Receiver<Result<String, RemoteError>>) -> Self {
        Self { chunks }
    }

    pub async fn next_chunk(&mut self) -> Option<Result<String, RemoteError>> {
        self.chunks.recv().await
    }

    /// Drain the stream into one string.
    pub async fn collect(mut self) -> Result<String, RemoteError> {
        let mut out = String::new();
        while let Some(chunk) = self.next_chunk().await {
            out.push_str(&chunk?);
        }
        Ok(out)
    }
}

/// Result of an idempotent upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    /// Remote file already existed and `overwrite` was false. Re-running a
    /// staging step must take this path.
    SkippedExisting,
}

/// Operations the orchestrators run against a remote host.
///
/// Implementations open their transport lazily per operation and release it
/// on the operation's exit path; streaming calls hold it until the stream is
/// drained or stopped. A watcher polling every 10 s must not pin a socket
/// between ticks.
#[async_trait]
pub trait HostClient: Send + Sync + 'static {
    /// Open a session, run a trivial command, close. Returns `(ok, error)`.
    async fn test_connection(&self) -> (bool, String);

    async fn execute_command(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, RemoteError>;

    /// `tail -n 1000 -f <path>` as a line stream.
    async fn tail_log(&self, path: &str) -> Result<LogStream, RemoteError>;

    /// Streaming `cat <path>` with an overall deadline.
    async fn get_large_file(
        &self,
        path: &str,
        chunk_size: usize,
        timeout: Duration,
    ) -> Result<ByteChunks, RemoteError>;

    /// SFTP get. A directory `local` gets the remote basename appended;
    /// missing local parents are created. Returns the final local path.
    async fn download_file(&self, remote: &str, local: &Path) -> Result<PathBuf, RemoteError>;

    /// SFTP put with recursive remote mkdir. No-op when the target exists
    /// and `overwrite` is false.
    async fn upload_with_dirs(
        &self,
        local: &Path,
        remote: &str,
        overwrite: bool,
    ) -> Result<UploadOutcome, RemoteError>;

    /// First unused port in `[start, end]` per `netstat`.
    async fn find_available_port(&self, start: u16, end: u16)
        -> Result<Option<u16>, RemoteError>;

    async fn add_crontab_entry(
        &self,
        entry: &str,
        comment: Option<&str>,
    ) -> Result<(), RemoteError>;

    /// Register `@reboot <command>` under a task name.
    async fn add_reboot_task(&self, command: &str, task_name: &str) -> Result<(), RemoteError>;

    async fn remove_reboot_task_by_name(&self, task_name: &str) -> Result<(), RemoteError>;

    /// Probe `systemctl status <name>.service`.
    async fn monitor_service_status(
        &self,
        name: &str,
    ) -> Result<(ServiceStatus, String), RemoteError>;
}

/// Builds a [`HostClient`] for a machine snapshot. The seam where tests
/// substitute fakes.
pub trait HostFactory: Send + Sync + 'static {
    fn host(&self, machine: &Machine) -> Arc<dyn HostClient>;
}
