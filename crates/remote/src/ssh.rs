// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ssh2`-backed [`HostClient`].
//!
//! libssh2 is blocking, so every operation runs on the blocking pool with a
//! freshly opened transport, mirroring the acquire-on-demand discipline the
//! watchers rely on. Credentials come from the embedded machine snapshot.

use crate::cron;
use crate::error::RemoteError;
use crate::host::{
    ByteChunks, ExecOutput, HostClient, HostConfig, HostFactory, LogStream, UploadOutcome,
};
use crate::status::{parse_systemctl, ServiceStatus};
use async_trait::async_trait;
use ssh2::Session;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tf_core::Machine;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Poll interval for streaming reads, so stop tokens are observed promptly.
const STREAM_READ_TIMEOUT_MS: u32 = 500;

#[derive(Clone)]
pub struct SshHost {
    config: HostConfig,
}

impl SshHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    async fn blocking<R: Send + 'static>(
        &self,
        f: impl FnOnce(HostConfig) -> Result<R, RemoteError> + Send + 'static,
    ) -> Result<R, RemoteError> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || f(config))
            .await
            .map_err(|e| RemoteError::Session(format!("blocking task failed: {e}")))?
    }
}

fn connect(config: &HostConfig) -> Result<Session, RemoteError> {
    let addr = config
        .addr()
        .to_socket_addrs()
        .map_err(|e| RemoteError::Unreachable(format!("{}: {e}", config.addr())))?
        .next()
        .ok_or_else(|| RemoteError::Unreachable(format!("{}: no address", config.addr())))?;
    let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|e| RemoteError::Unreachable(format!("{}: {e}", config.addr())))?;

    let mut session =
        Session::new().map_err(|e| RemoteError::Session(format!("session init: {e}")))?;
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| RemoteError::Unreachable(format!("handshake failed: {e}")))?;

    if let Some(key) = &config.ssh_private_key {
        session
            .userauth_pubkey_memory(&config.ssh_user, None, key, None)
            .map_err(|e| RemoteError::AuthFailed(e.to_string()))?;
    } else if let Some(password) = &config.ssh_password {
        session
            .userauth_password(&config.ssh_user, password)
            .map_err(|e| RemoteError::AuthFailed(e.to_string()))?;
    }
    if !session.authenticated() {
        return Err(RemoteError::AuthFailed("no credentials accepted".to_string()));
    }
    debug!(host = %config.ip, "ssh session established");
    Ok(session)
}

fn exec(session: &Session, cmd: &str) -> Result<ExecOutput, RemoteError> {
    let mut channel =
        session.channel_session().map_err(|e| RemoteError::Session(e.to_string()))?;
    channel.exec(cmd).map_err(|e| RemoteError::Session(e.to_string()))?;

    let mut stdout = String::new();
    channel
        .read_to_string(&mut stdout)
        .map_err(|e| RemoteError::Session(format!("read stdout: {e}")))?;
    let mut stderr = String::new();
    channel
        .stderr()
        .read_to_string(&mut stderr)
        .map_err(|e| RemoteError::Session(format!("read stderr: {e}")))?;

    channel.wait_close().map_err(|e| RemoteError::Session(e.to_string()))?;
    let exit_code = channel.exit_status().map_err(|e| RemoteError::Session(e.to_string()))?;

    Ok(ExecOutput {
        stdout: stdout.trim_end().to_string(),
        stderr: stderr.trim_end().to_string(),
        exit_code,
    })
}

/// Write `content` to a command's stdin (`crontab -`).
fn exec_with_stdin(session: &Session, cmd: &str, content: &str) -> Result<(), RemoteError> {
    let mut channel =
        session.channel_session().map_err(|e| RemoteError::Session(e.to_string()))?;
    channel.exec(cmd).map_err(|e| RemoteError::Session(e.to_string()))?;
    channel
        .write_all(content.as_bytes())
        .map_err(|e| RemoteError::Session(format!("write stdin: {e}")))?;
    channel.send_eof().map_err(|e| RemoteError::Session(e.to_string()))?;

    let mut stderr = String::new();
    let _ = channel.stderr().read_to_string(&mut stderr);
    channel.wait_close().map_err(|e| RemoteError::Session(e.to_string()))?;
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return Err(RemoteError::Session(format!("update crontab failed: {stderr}")));
    }
    Ok(())
}

fn read_crontab(session: &Session) -> Result<String, RemoteError> {
    let out = exec(session, "crontab -l 2>/dev/null || echo ''")?;
    Ok(out.stdout)
}

/// Create every missing ancestor of `dir` on the remote side.
fn sftp_mkdir_p(sftp: &ssh2::Sftp, dir: &Path) -> Result<(), RemoteError> {
    let mut prefix = PathBuf::new();
    for component in dir.components() {
        prefix.push(component);
        if prefix.as_os_str().is_empty() || prefix == Path::new("/") {
            continue;
        }
        if sftp.stat(&prefix).is_err() {
            if let Err(e) = sftp.mkdir(&prefix, 0o755) {
                // A concurrent upload may have created it in between.
                if sftp.stat(&prefix).is_err() {
                    return Err(RemoteError::Session(format!(
                        "mkdir {} failed: {e}",
                        prefix.display()
                    )));
                }
            }
        }
    }
    Ok(())
}

#[async_trait]
impl HostClient for SshHost {
    async fn test_connection(&self) -> (bool, String) {
        let result = self
            .blocking(|config| {
                let session = connect(&config)?;
                session.set_timeout(5_000);
                exec(&session, "echo 'test'")
            })
            .await;
        match result {
            Ok(out) if out.success() => (true, String::new()),
            Ok(out) => (false, out.stderr),
            Err(e) => (false, e.to_string()),
        }
    }

    async fn execute_command(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<ExecOutput, RemoteError> {
        let cmd = cmd.to_string();
        self.blocking(move |config| {
            let session = connect(&config)?;
            session.set_timeout(timeout.as_millis() as u32);
            exec(&session, &cmd)
        })
        .await
    }

    async fn tail_log(&self, path: &str) -> Result<LogStream, RemoteError> {
        let config = self.config.clone();
        let path = path.to_string();
        let stop = CancellationToken::new();
        let token = stop.clone();
        let (tx, rx) = mpsc::channel::<String>(256);

        tokio::task::spawn_blocking(move || {
            let session = match connect(&config) {
                Ok(s) => s,
                Err(e) => {
                    warn!(path, error = %e, "tail connect failed");
                    return;
                }
            };
            session.set_timeout(STREAM_READ_TIMEOUT_MS);
            let mut channel = match session.channel_session() {
                Ok(c) => c,
                Err(e) => {
                    warn!(path, error = %e, "tail channel failed");
                    return;
                }
            };
            if let Err(e) = channel.exec(&format!("tail -n 1000 -f {path}")) {
                warn!(path, error = %e, "tail exec failed");
                return;
            }

            let mut buffer = String::new();
            let mut chunk = [0u8; 1024];
            while !token.is_cancelled() {
                match channel.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk[..n]));
                        // Emit complete lines; keep the partial tail buffered.
                        while let Some(pos) = buffer.find('\n') {
                            let line: String = buffer.drain(..=pos).collect();
                            if tx.blocking_send(line).is_err() {
                                return;
                            }
                        }
                    }
                    Err(_) => {
                        if channel.eof() {
                            break;
                        }
                        // Read window elapsed; poll the stop token again.
                    }
                }
            }
            let _ = channel.close();
        });

        Ok(LogStream::new(rx, stop))
    }

    async fn get_large_file(
        &self,
        path: &str,
        chunk_size: usize,
        timeout: Duration,
    ) -> Result<ByteChunks, RemoteError> {
        let config = self.config.clone();
        let path = path.to_string();
        let (tx, rx) = mpsc::channel::<Result<String, RemoteError>>(64);

        tokio::task::spawn_blocking(move || {
            let send_err = |tx: &mpsc::Sender<Result<String, RemoteError>>, e: RemoteError| {
                let _ = tx.blocking_send(Err(e));
            };
            let session = match connect(&config) {
                Ok(s) => s,
                Err(e) => return send_err(&tx, e),
            };
            session.set_timeout(STREAM_READ_TIMEOUT_MS);
            let mut channel = match session.channel_session() {
                Ok(c) => c,
                Err(e) => return send_err(&tx, RemoteError::Session(e.to_string())),
            };
            if let Err(e) = channel.exec(&format!("cat {path}")) {
                return send_err(&tx, RemoteError::Session(e.to_string()));
            }

            let started = Instant::now();
            let mut buf = vec![0u8; chunk_size.max(1)];
            loop {
                if started.elapsed() > timeout {
                    return send_err(&tx, RemoteError::Timeout(format!("reading {path}")));
                }
                match channel.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                        if tx.blocking_send(Ok(chunk)).is_err() {
                            return;
                        }
                    }
                    Err(_) => {
                        if channel.eof() {
                            break;
                        }
                    }
                }
            }

            let mut stderr = String::new();
            let _ = channel.stderr().read_to_string(&mut stderr);
            let _ = channel.wait_close();
            if channel.exit_status().unwrap_or(0) != 0 {
                send_err(
                    &tx,
                    RemoteError::CommandFailed { exit_code: 1, stderr: stderr.trim().to_string() },
                );
            }
        });

        Ok(ByteChunks::new(rx))
    }

    async fn download_file(&self, remote: &str, local: &Path) -> Result<PathBuf, RemoteError> {
        let remote = remote.to_string();
        let local = local.to_path_buf();
        self.blocking(move |config| {
            let session = connect(&config)?;
            let sftp = session.sftp().map_err(|e| RemoteError::Session(e.to_string()))?;

            let remote_path = Path::new(&remote);
            sftp.stat(remote_path).map_err(|_| RemoteError::NotFound(remote.clone()))?;

            let target = if local.is_dir() {
                match remote_path.file_name() {
                    Some(name) => local.join(name),
                    None => local.clone(),
                }
            } else {
                local.clone()
            };
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut remote_file =
                sftp.open(remote_path).map_err(|e| RemoteError::Session(e.to_string()))?;
            let mut local_file = std::fs::File::create(&target)?;
            std::io::copy(&mut remote_file, &mut local_file)?;
            debug!(remote = %remote, local = %target.display(), "downloaded file");
            Ok(target)
        })
        .await
    }

    async fn upload_with_dirs(
        &self,
        local: &Path,
        remote: &str,
        overwrite: bool,
    ) -> Result<UploadOutcome, RemoteError> {
        let local = local.to_path_buf();
        let remote = remote.to_string();
        self.blocking(move |config| {
            let session = connect(&config)?;
            let sftp = session.sftp().map_err(|e| RemoteError::Session(e.to_string()))?;

            let remote_path = Path::new(&remote);
            if !overwrite && sftp.stat(remote_path).is_ok() {
                debug!(remote = %remote, "remote file exists, skipping upload");
                return Ok(UploadOutcome::SkippedExisting);
            }

            if let Some(dir) = remote_path.parent() {
                sftp_mkdir_p(&sftp, dir)?;
            }

            let mut local_file = std::fs::File::open(&local)?;
            let mut remote_file =
                sftp.create(remote_path).map_err(|e| RemoteError::Session(e.to_string()))?;
            std::io::copy(&mut local_file, &mut remote_file)?;
            debug!(local = %local.display(), remote = %remote, "uploaded file");
            Ok(UploadOutcome::Uploaded)
        })
        .await
    }

    async fn find_available_port(
        &self,
        start: u16,
        end: u16,
    ) -> Result<Option<u16>, RemoteError> {
        self.blocking(move |config| {
            let session = connect(&config)?;
            session.set_timeout(30_000);
            for port in start..=end {
                let out = exec(&session, &format!("netstat -tuln | grep ':{port} '"))?;
                if out.stdout.trim().is_empty() {
                    return Ok(Some(port));
                }
            }
            Ok(None)
        })
        .await
    }

    async fn add_crontab_entry(
        &self,
        entry: &str,
        comment: Option<&str>,
    ) -> Result<(), RemoteError> {
        let entry = entry.to_string();
        let comment = comment.map(|c| c.to_string());
        self.blocking(move |config| {
            let session = connect(&config)?;
            session.set_timeout(30_000);
            let current = read_crontab(&session)?;
            match cron::append_entry(&current, &entry, comment.as_deref()) {
                Some(next) => exec_with_stdin(&session, "crontab -", &next),
                None => Ok(()),
            }
        })
        .await
    }

    async fn add_reboot_task(&self, command: &str, task_name: &str) -> Result<(), RemoteError> {
        let entry = format!("@reboot {command}");
        let comment = cron::reboot_comment(task_name);
        self.add_crontab_entry(&entry, Some(&comment)).await
    }

    async fn remove_reboot_task_by_name(&self, task_name: &str) -> Result<(), RemoteError> {
        let task_name = task_name.to_string();
        self.blocking(move |config| {
            let session = connect(&config)?;
            session.set_timeout(30_000);
            let current = read_crontab(&session)?;
            match cron::strip_task(&current, &task_name) {
                Some(next) => exec_with_stdin(&session, "crontab -", &next),
                None => Ok(()),
            }
        })
        .await
    }

    async fn monitor_service_status(
        &self,
        name: &str,
    ) -> Result<(ServiceStatus, String), RemoteError> {
        let cmd = format!("systemctl status {name}.service");
        let name = name.to_string();
        self.blocking(move |config| {
            let session = connect(&config)?;
            session.set_timeout(30_000);
            let out = exec(&session, &cmd)?;
            let (status, detail) = parse_systemctl(&out.stdout, &out.stderr);
            debug!(service = %name, status = %status, "service probed");
            Ok((status, detail))
        })
        .await
    }
}

/// Production factory: one [`SshHost`] per machine snapshot.
#[derive(Default, Clone)]
pub struct SshFactory;

impl HostFactory for SshFactory {
    fn host(&self, machine: &Machine) -> Arc<dyn HostClient> {
        Arc::new(SshHost::new(HostConfig::from_machine(machine)))
    }
}
