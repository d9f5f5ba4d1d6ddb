// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM provider model registrations.

use crate::meta::{Actor, Meta};
use serde::{Deserialize, Serialize};

crate::define_id! {
    pub struct ProviderModelId("mdl-");
}

/// An OpenAI-compatible model registration. The facade resolves the default
/// row on every call so operator edits take effect without a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderModel {
    pub id: ProviderModelId,
    #[serde(flatten)]
    pub meta: Meta,
    pub provider_name: String,
    pub account_name: String,
    pub model_name: String,
    #[serde(default)]
    pub model_type: String,
    pub api_key: String,
    pub endpoint: String,
    pub is_valid: bool,
    #[serde(default)]
    pub is_default: bool,
}

impl ProviderModel {
    pub fn new(
        actor: &Actor,
        account_name: impl Into<String>,
        model_name: impl Into<String>,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        now: u64,
    ) -> Self {
        Self {
            id: ProviderModelId::new(),
            meta: Meta::new(actor, now),
            provider_name: "open_ai".to_string(),
            account_name: account_name.into(),
            model_name: model_name.into(),
            model_type: String::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            is_valid: true,
            is_default: false,
        }
    }
}

crate::record_impl!(ProviderModel);
