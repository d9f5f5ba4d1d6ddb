// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token streaming: proxy `/v1/completions` as server-sent-event frames.

use super::vllm::{CompletionRequest, TokenStream};
use super::DeployService;
use crate::error::EngineError;
use crate::messages;
use std::collections::VecDeque;
use tf_core::{Actor, Clock, ClusterId, Locale, LoraId};

#[derive(Debug, Clone)]
pub struct CompletionParams {
    pub cluster_id: ClusterId,
    /// Adapter to serve; `None` means the base model.
    pub lora_id: Option<LoraId>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Re-framed SSE output: `data: <token>\n\n` per token, an error frame on
/// upstream failure, and a final `data: [DONE]\n\n`. Dropping this drops the
/// upstream stream, which cancels the request promptly.
#[derive(Debug)]
pub struct SseFrames {
    upstream: TokenStream,
    pending: VecDeque<String>,
    finished: bool,
}

impl SseFrames {
    fn new(upstream: TokenStream) -> Self {
        Self { upstream, pending: VecDeque::new(), finished: false }
    }

    pub async fn next_frame(&mut self) -> Option<String> {
        if let Some(frame) = self.pending.pop_front() {
            return Some(frame);
        }
        if self.finished {
            return None;
        }
        match self.upstream.next_token().await {
            Some(Ok(token)) => Some(format!("data: {token}\n\n")),
            Some(Err(e)) => {
                self.finished = true;
                self.pending.push_back("data: [DONE]\n\n".to_string());
                let body = serde_json::json!({ "error": e.to_string() });
                Some(format!("data: {body}\n\n"))
            }
            None => {
                self.finished = true;
                Some("data: [DONE]\n\n".to_string())
            }
        }
    }

    /// Drain every frame. Test helper.
    pub async fn collect_frames(mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame().await {
            frames.push(frame);
        }
        frames
    }
}

impl<C: Clock> DeployService<C> {
    /// Validate the target and open a token stream against the master.
    pub async fn completion_stream(
        &self,
        actor: &Actor,
        params: CompletionParams,
        locale: Locale,
    ) -> Result<SseFrames, EngineError> {
        let cluster = self.store.get_cluster(actor, &params.cluster_id)?;
        if let Some(lora_id) = &params.lora_id {
            if cluster.lora(lora_id).is_none() {
                return Err(EngineError::Validation(messages::lora_not_found(locale, lora_id)));
            }
        }
        let machines = self.store.machines_by_ids(actor, &cluster.machine_id_list)?;

        let model = params
            .lora_id
            .as_ref()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "base_model".to_string());
        let upstream = self
            .inference
            .completion(
                &machines[0].conn.ip,
                CompletionRequest {
                    model,
                    prompt: params.prompt,
                    max_tokens: params.max_tokens,
                    temperature: params.temperature,
                    stream: true,
                },
            )
            .await?;
        Ok(SseFrames::new(upstream))
    }
}
