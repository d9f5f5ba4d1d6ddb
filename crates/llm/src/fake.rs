// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted [`ChatClient`] for tests.

use crate::client::{ChatClient, ChatCot};
use crate::error::LlmError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

enum Scripted {
    Text(String),
    Cot(ChatCot),
    RateLimited,
}

/// Replays queued replies in order and records every prompt. An exhausted
/// queue answers with an empty string, which handlers treat as a skip.
#[derive(Default)]
pub struct FakeChatClient {
    replies: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: &str) {
        self.replies.lock().push_back(Scripted::Text(text.to_string()));
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push_text(&value.to_string());
    }

    pub fn push_cot(&self, answer: &str, cot: &str) {
        self.replies
            .lock()
            .push_back(Scripted::Cot(ChatCot { answer: answer.to_string(), cot: cot.to_string() }));
    }

    pub fn push_rate_limited(&self) {
        self.replies.lock().push_back(Scripted::RateLimited);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    async fn chat(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().push(prompt.to_string());
        match self.replies.lock().pop_front() {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Cot(cot)) => Ok(cot.answer),
            Some(Scripted::RateLimited) => Err(LlmError::RateLimited),
            None => Ok(String::new()),
        }
    }

    async fn chat_cot(&self, prompt: &str) -> Result<ChatCot, LlmError> {
        self.prompts.lock().push(prompt.to_string());
        match self.replies.lock().pop_front() {
            Some(Scripted::Cot(cot)) => Ok(cot),
            Some(Scripted::Text(text)) => Ok(ChatCot { answer: text, cot: String::new() }),
            Some(Scripted::RateLimited) => Err(LlmError::RateLimited),
            None => Ok(ChatCot::default()),
        }
    }
}
