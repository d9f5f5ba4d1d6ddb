// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vLLM admin and completion endpoints on the cluster master.
//!
//! The trait is the seam tests fake; [`HttpInferenceApi`] is the reqwest
//! implementation talking to port 8000.

use crate::error::EngineError;
use crate::messages;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use tf_core::Locale;
use tokio::sync::mpsc;
use tracing::debug;

pub const VLLM_PORT: u16 = 8000;

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

/// Tokens from a streaming completion. `None` means the upstream finished.
#[derive(Debug)]
pub struct TokenStream {
    tokens: mpsc::Receiver<Result<String, EngineError>>,
}

impl TokenStream {
    pub fn new(tokens: mpsc::Receiver<Result<String, EngineError>>) -> Self {
        Self { tokens }
    }

    pub async fn next_token(&mut self) -> Option<Result<String, EngineError>> {
        self.tokens.recv().await
    }
}

#[async_trait]
pub trait InferenceApi: Send + Sync + 'static {
    async fn load_lora(
        &self,
        ip: &str,
        lora_name: &str,
        lora_path: &str,
        locale: Locale,
    ) -> Result<(), EngineError>;

    async fn unload_lora(
        &self,
        ip: &str,
        lora_name: &str,
        locale: Locale,
    ) -> Result<(), EngineError>;

    /// POST `/v1/completions` with `stream: true`; yields `choices[0].text`
    /// per SSE event. Dropping the stream aborts the upstream request.
    async fn completion(
        &self,
        ip: &str,
        request: CompletionRequest,
    ) -> Result<TokenStream, EngineError>;
}

pub struct HttpInferenceApi {
    http: reqwest::Client,
}

impl HttpInferenceApi {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }

    async fn post_adapter(
        &self,
        ip: &str,
        path: &str,
        body: serde_json::Value,
        locale: Locale,
    ) -> Result<(), EngineError> {
        let url = format!("http://{ip}:{VLLM_PORT}{path}");
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Internal(messages::request_remote_failed(
                locale,
                path,
                ip,
                status.as_u16(),
                &text,
            )));
        }
        Ok(())
    }
}

impl Default for HttpInferenceApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceApi for HttpInferenceApi {
    async fn load_lora(
        &self,
        ip: &str,
        lora_name: &str,
        lora_path: &str,
        locale: Locale,
    ) -> Result<(), EngineError> {
        debug!(ip, lora_name, "loading lora adapter");
        self.post_adapter(
            ip,
            "/v1/load_lora_adapter",
            serde_json::json!({ "lora_name": lora_name, "lora_path": lora_path }),
            locale,
        )
        .await
    }

    async fn unload_lora(
        &self,
        ip: &str,
        lora_name: &str,
        locale: Locale,
    ) -> Result<(), EngineError> {
        debug!(ip, lora_name, "unloading lora adapter");
        self.post_adapter(
            ip,
            "/v1/unload_lora_adapter",
            serde_json::json!({ "lora_name": lora_name }),
            locale,
        )
        .await
    }

    async fn completion(
        &self,
        ip: &str,
        request: CompletionRequest,
    ) -> Result<TokenStream, EngineError> {
        let url = format!("http://{ip}:{VLLM_PORT}/v1/completions");
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Internal(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Internal(format!(
                "completion request failed. status: {status}, body: {text}"
            )));
        }

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(EngineError::Internal(e.to_string()))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find('\n') {
                    let line: String = buffer.drain(..=pos).collect();
                    match parse_sse_line(line.trim()) {
                        SseEvent::Token(token) => {
                            if tx.send(Ok(token)).await.is_err() {
                                // Client went away; dropping `response` here
                                // closes the upstream connection.
                                return;
                            }
                        }
                        SseEvent::Done => return,
                        SseEvent::Skip => {}
                    }
                }
            }
        });
        Ok(TokenStream::new(rx))
    }
}

enum SseEvent {
    Token(String),
    Done,
    Skip,
}

/// One upstream SSE line → the token inside `choices[0].text`.
fn parse_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
        return SseEvent::Skip;
    };
    if data == "[DONE]" {
        return SseEvent::Done;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(data) else {
        return SseEvent::Skip;
    };
    match value["choices"][0]["text"].as_str() {
        Some(text) => SseEvent::Token(text.to_string()),
        None => SseEvent::Skip,
    }
}

/// Scripted [`InferenceApi`] recording admin calls and replaying canned
/// completion tokens.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeInferenceApi {
    pub loads: parking_lot::Mutex<Vec<(String, String, String)>>,
    pub unloads: parking_lot::Mutex<Vec<(String, String)>>,
    pub completions: parking_lot::Mutex<Vec<CompletionRequest>>,
    tokens: parking_lot::Mutex<Vec<String>>,
    fail_loads: parking_lot::Mutex<bool>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeInferenceApi {
    pub fn new() -> Self {
        Self {
            loads: parking_lot::Mutex::new(Vec::new()),
            unloads: parking_lot::Mutex::new(Vec::new()),
            completions: parking_lot::Mutex::new(Vec::new()),
            tokens: parking_lot::Mutex::new(Vec::new()),
            fail_loads: parking_lot::Mutex::new(false),
        }
    }

    pub fn set_tokens(&self, tokens: &[&str]) {
        *self.tokens.lock() = tokens.iter().map(|t| t.to_string()).collect();
    }

    pub fn fail_loads(&self) {
        *self.fail_loads.lock() = true;
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeInferenceApi {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl InferenceApi for FakeInferenceApi {
    async fn load_lora(
        &self,
        ip: &str,
        lora_name: &str,
        lora_path: &str,
        locale: Locale,
    ) -> Result<(), EngineError> {
        if *self.fail_loads.lock() {
            return Err(EngineError::Internal(messages::request_remote_failed(
                locale,
                "/v1/load_lora_adapter",
                ip,
                500,
                "load rejected",
            )));
        }
        self.loads.lock().push((ip.to_string(), lora_name.to_string(), lora_path.to_string()));
        Ok(())
    }

    async fn unload_lora(
        &self,
        ip: &str,
        lora_name: &str,
        _locale: Locale,
    ) -> Result<(), EngineError> {
        self.unloads.lock().push((ip.to_string(), lora_name.to_string()));
        Ok(())
    }

    async fn completion(
        &self,
        _ip: &str,
        request: CompletionRequest,
    ) -> Result<TokenStream, EngineError> {
        self.completions.lock().push(request);
        let tokens = self.tokens.lock().clone();
        let (tx, rx) = mpsc::channel(tokens.len().max(1));
        for token in tokens {
            let _ = tx.send(Ok(token)).await;
        }
        Ok(TokenStream::new(rx))
    }
}

#[cfg(test)]
#[path = "vllm_tests.rs"]
mod tests;
