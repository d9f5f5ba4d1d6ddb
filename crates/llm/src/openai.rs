// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reqwest-backed OpenAI-compatible client.

use crate::client::{ChatClient, ChatCot};
use crate::error::LlmError;
use crate::extract;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Endpoint + credentials + model, resolved per call by the caller so that
/// operator edits to the default model apply without a restart.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

pub struct OpenAiChatClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    /// Populated by reasoning-capable servers instead of `<think>` tags.
    #[serde(default)]
    reasoning_content: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    async fn call(&self, prompt: &str) -> Result<ResponseMessage, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/').trim_end_matches("/chat/completions")
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![Message { role: "user", content: prompt }],
            temperature: 0.0,
        };

        debug!(model = %self.config.model, "chat request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status: status.as_u16(), message });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Unexpected(format!("malformed response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::Unexpected("response carried no choices".to_string()))
    }
}

fn classify_send_error(e: reqwest::Error) -> LlmError {
    if e.is_connect() || e.is_timeout() {
        LlmError::Connection(e.to_string())
    } else {
        LlmError::Unexpected(e.to_string())
    }
}

/// Split a raw reply into answer and chain-of-thought.
///
/// `<think>`/`<thinking>` blocks win; otherwise a `reasoning_content` field
/// is the CoT; otherwise the CoT is empty.
pub(crate) fn split_cot(content: &str, reasoning_content: Option<String>) -> ChatCot {
    let trimmed = content.trim_start();
    if trimmed.starts_with("<think>") || trimmed.starts_with("<thinking>") {
        ChatCot { answer: extract::answer(content), cot: extract::think_chain(content) }
    } else if let Some(reasoning) = reasoning_content.filter(|r| !r.is_empty()) {
        ChatCot { answer: content.to_string(), cot: reasoning }
    } else {
        ChatCot { answer: content.to_string(), cot: String::new() }
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn chat(&self, prompt: &str) -> Result<String, LlmError> {
        let message = self.call(prompt).await?;
        Ok(message.content.unwrap_or_default())
    }

    async fn chat_cot(&self, prompt: &str) -> Result<ChatCot, LlmError> {
        let message = self.call(prompt).await?;
        let content = message.content.unwrap_or_default();
        Ok(split_cot(&content, message.reasoning_content))
    }
}

#[cfg(test)]
#[path = "openai_tests.rs"]
mod tests;
