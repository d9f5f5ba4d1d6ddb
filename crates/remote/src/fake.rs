// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted in-memory [`HostClient`] for tests.
//!
//! A `FakeHost` records every call and replays configured outcomes:
//! connection failures, per-command exec results, service status sequences,
//! and a remote filesystem set for upload idempotence checks.

use crate::error::RemoteError;
use crate::host::{
    ByteChunks, ExecOutput, HostClient, HostFactory, LogStream, UploadOutcome,
};
use crate::status::ServiceStatus;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tf_core::Machine;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    TestConnection,
    Exec(String),
    TailLog(String),
    GetLargeFile(String),
    Download { remote: String, local: PathBuf },
    Upload { local: PathBuf, remote: String, skipped: bool },
    FindPort,
    AddCrontabEntry(String),
    AddRebootTask { command: String, task_name: String },
    RemoveRebootTask(String),
    ServiceStatus(String),
}

#[derive(Default)]
struct FakeHostState {
    /// Pending connection outcomes; empty means "always succeeds".
    connect_results: VecDeque<(bool, String)>,
    /// Substring-matched exec outcomes, first match wins.
    exec_rules: Vec<(String, ExecOutput)>,
    /// Per-service status sequences; the last entry repeats.
    service_statuses: HashMap<String, VecDeque<(ServiceStatus, String)>>,
    /// Remote paths that "exist" for upload/stat purposes.
    remote_files: HashSet<String>,
    /// Remote file contents served by download/cat/tail.
    remote_contents: HashMap<String, String>,
}

#[derive(Default)]
pub struct FakeHost {
    state: Mutex<FakeHostState>,
    calls: Mutex<Vec<HostCall>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_connect_result(&self, ok: bool, error: &str) {
        self.state.lock().connect_results.push_back((ok, error.to_string()));
    }

    /// Queue `n` connection failures ahead of the default success.
    pub fn fail_connections(&self, n: usize) {
        let mut state = self.state.lock();
        for _ in 0..n {
            state.connect_results.push_back((false, "connection refused".to_string()));
        }
    }

    pub fn on_exec(&self, needle: &str, output: ExecOutput) {
        self.state.lock().exec_rules.push((needle.to_string(), output));
    }

    pub fn push_service_status(&self, service: &str, status: ServiceStatus, detail: &str) {
        self.state
            .lock()
            .service_statuses
            .entry(service.to_string())
            .or_default()
            .push_back((status, detail.to_string()));
    }

    pub fn add_remote_file(&self, path: &str) {
        self.state.lock().remote_files.insert(path.to_string());
    }

    pub fn set_remote_content(&self, path: &str, content: &str) {
        let mut state = self.state.lock();
        state.remote_files.insert(path.to_string());
        state.remote_contents.insert(path.to_string(), content.to_string());
    }

    pub fn remote_file_exists(&self, path: &str) -> bool {
        self.state.lock().remote_files.contains(path)
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    /// Exec commands in call order.
    pub fn exec_commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Exec(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn uploads(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Upload { remote, skipped, .. } => Some((remote, skipped)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().push(call);
    }

    fn connect_outcome(&self) -> (bool, String) {
        let mut state = self.state.lock();
        state.connect_results.pop_front().unwrap_or((true, String::new()))
    }
}

#[async_trait]
impl HostClient for FakeHost {
    async fn test_connection(&self) -> (bool, String) {
        self.record(HostCall::TestConnection);
        self.connect_outcome()
    }

    async fn execute_command(
        &self,
        cmd: &str,
        _timeout: Duration,
    ) -> Result<ExecOutput, RemoteError> {
        self.record(HostCall::Exec(cmd.to_string()));
        let state = self.state.lock();
        let output = state
            .exec_rules
            .iter()
            .find(|(needle, _)| cmd.contains(needle.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_else(|| ExecOutput::ok(""));
        Ok(output)
    }

    async fn tail_log(&self, path: &str) -> Result<LogStream, RemoteError> {
        self.record(HostCall::TailLog(path.to_string()));
        let content =
            self.state.lock().remote_contents.get(path).cloned().unwrap_or_default();
        let lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for line in lines {
            let _ = tx.send(line).await;
        }
        Ok(LogStream::new(rx, CancellationToken::new()))
    }

    async fn get_large_file(
        &self,
        path: &str,
        chunk_size: usize,
        _timeout: Duration,
    ) -> Result<ByteChunks, RemoteError> {
        self.record(HostCall::GetLargeFile(path.to_string()));
        let content = {
            let state = self.state.lock();
            if !state.remote_files.contains(path) {
                return Err(RemoteError::NotFound(path.to_string()));
            }
            state.remote_contents.get(path).cloned().unwrap_or_default()
        };
        let mut chunks = Vec::new();
        let mut rest = content.as_str();
        let step = chunk_size.max(1);
        while !rest.is_empty() {
            let mut cut = step.min(rest.len());
            while cut < rest.len() && !rest.is_char_boundary(cut) {
                cut += 1;
            }
            chunks.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            let _ = tx.send(Ok(chunk)).await;
        }
        Ok(ByteChunks::new(rx))
    }

    async fn download_file(&self, remote: &str, local: &Path) -> Result<PathBuf, RemoteError> {
        let target = if local.is_dir() {
            match Path::new(remote).file_name() {
                Some(name) => local.join(name),
                None => local.to_path_buf(),
            }
        } else {
            local.to_path_buf()
        };
        self.record(HostCall::Download { remote: remote.to_string(), local: target.clone() });

        let content = {
            let state = self.state.lock();
            if !state.remote_files.contains(remote) {
                return Err(RemoteError::NotFound(remote.to_string()));
            }
            state.remote_contents.get(remote).cloned().unwrap_or_default()
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)?;
        Ok(target)
    }

    async fn upload_with_dirs(
        &self,
        local: &Path,
        remote: &str,
        overwrite: bool,
    ) -> Result<UploadOutcome, RemoteError> {
        let mut state = self.state.lock();
        let exists = state.remote_files.contains(remote);
        let skipped = exists && !overwrite;
        if !skipped {
            state.remote_files.insert(remote.to_string());
        }
        drop(state);
        self.record(HostCall::Upload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            skipped,
        });
        Ok(if skipped { UploadOutcome::SkippedExisting } else { UploadOutcome::Uploaded })
    }

    async fn find_available_port(
        &self,
        start: u16,
        _end: u16,
    ) -> Result<Option<u16>, RemoteError> {
        self.record(HostCall::FindPort);
        Ok(Some(start))
    }

    async fn add_crontab_entry(
        &self,
        entry: &str,
        _comment: Option<&str>,
    ) -> Result<(), RemoteError> {
        self.record(HostCall::AddCrontabEntry(entry.to_string()));
        Ok(())
    }

    async fn add_reboot_task(&self, command: &str, task_name: &str) -> Result<(), RemoteError> {
        self.record(HostCall::AddRebootTask {
            command: command.to_string(),
            task_name: task_name.to_string(),
        });
        Ok(())
    }

    async fn remove_reboot_task_by_name(&self, task_name: &str) -> Result<(), RemoteError> {
        self.record(HostCall::RemoveRebootTask(task_name.to_string()));
        Ok(())
    }

    async fn monitor_service_status(
        &self,
        name: &str,
    ) -> Result<(ServiceStatus, String), RemoteError> {
        self.record(HostCall::ServiceStatus(name.to_string()));
        let mut state = self.state.lock();
        let queue = state.service_statuses.entry(name.to_string()).or_default();
        let outcome = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(outcome
            .unwrap_or((ServiceStatus::Error, format!("Unit {name}.service could not be found."))))
    }
}

/// Factory handing out one shared [`FakeHost`] per machine ID.
#[derive(Default)]
pub struct FakeHostFactory {
    hosts: Mutex<HashMap<String, Arc<FakeHost>>>,
}

impl FakeHostFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fake for a machine ID, created on first access.
    pub fn host_for(&self, machine_id: &str) -> Arc<FakeHost> {
        self.hosts
            .lock()
            .entry(machine_id.to_string())
            .or_insert_with(|| Arc::new(FakeHost::new()))
            .clone()
    }
}

impl HostFactory for FakeHostFactory {
    fn host(&self, machine: &Machine) -> Arc<dyn HostClient> {
        self.host_for(machine.id.as_str())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
