// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tf-remote: SSH/SFTP gateway to the GPU machines.
//!
//! Everything the orchestrators do on a remote host goes through the
//! [`HostClient`] trait: one-shot exec, streaming log tail, SFTP transfer
//! with recursive directory creation, cron editing, and systemd service
//! probing. [`SshHost`] is the production implementation; `FakeHost`
//! (test-support) scripts outcomes and records calls.

pub mod cron;
mod error;
mod host;
mod ssh;
mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::RemoteError;
pub use host::{
    ByteChunks, ExecOutput, HostClient, HostConfig, HostFactory, LogStream, UploadOutcome,
};
pub use ssh::{SshFactory, SshHost};
pub use status::{parse_systemctl, ServiceStatus};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeHost, FakeHostFactory, HostCall};
