// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote GPU machine records.

use crate::meta::{Actor, Meta};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a registered machine.
    pub struct MachineId("mch-");
}

/// SSH connection parameters. Either a password or a private key is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnInfo {
    pub ip: String,
    /// Address the nodes use to reach each other (ray / torchrun rendezvous).
    pub internal_ip: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    pub ssh_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_private_key: Option<String>,
}

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    #[serde(flatten)]
    pub meta: Meta,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    pub cuda_available: bool,
    pub gpu_count: u32,
    pub is_active: bool,
    pub conn: ConnInfo,
}

impl Machine {
    pub fn new(actor: &Actor, hostname: impl Into<String>, conn: ConnInfo, now: u64) -> Self {
        Self {
            id: MachineId::new(),
            meta: Meta::new(actor, now),
            hostname: hostname.into(),
            device_type: None,
            cuda_available: true,
            gpu_count: 1,
            is_active: true,
            conn,
        }
    }

    crate::setters! {
        set {
            gpu_count: u32,
            cuda_available: bool,
            is_active: bool,
        }
        option {
            device_type: String,
        }
    }
}

crate::record_impl!(Machine);
