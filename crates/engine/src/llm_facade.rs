// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`ChatClient`] that resolves the default provider model from storage on
//! every call, so operator edits take effect without a restart.

use async_trait::async_trait;
use tf_core::Clock;
use tf_llm::{ChatClient, ChatCot, LlmError, OpenAiChatClient, OpenAiConfig};
use tf_storage::Store;

pub struct StoreChatClient<C: Clock> {
    store: Store<C>,
    http: reqwest::Client,
}

impl<C: Clock> StoreChatClient<C> {
    pub fn new(store: Store<C>) -> Self {
        Self { store, http: reqwest::Client::new() }
    }

    fn resolve(&self) -> Result<OpenAiChatClient, LlmError> {
        let model = self
            .store
            .default_model()
            .ok_or_else(|| LlmError::Unexpected("model config not found".to_string()))?;
        Ok(OpenAiChatClient::new(
            self.http.clone(),
            OpenAiConfig {
                endpoint: model.endpoint,
                api_key: model.api_key,
                model: model.model_name,
            },
        ))
    }
}

#[async_trait]
impl<C: Clock> ChatClient for StoreChatClient<C> {
    async fn chat(&self, prompt: &str) -> Result<String, LlmError> {
        self.resolve()?.chat(prompt).await
    }

    async fn chat_cot(&self, prompt: &str) -> Result<ChatCot, LlmError> {
        self.resolve()?.chat_cot(prompt).await
    }
}
