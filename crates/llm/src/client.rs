// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The chat client trait.

use crate::error::LlmError;
use async_trait::async_trait;

/// Answer plus chain-of-thought, as separated by [`crate::extract`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatCot {
    pub answer: String,
    pub cot: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    /// One user-turn chat call; returns the raw assistant text.
    async fn chat(&self, prompt: &str) -> Result<String, LlmError>;

    /// Chat call that splits the reply into answer and chain-of-thought.
    async fn chat_cot(&self, prompt: &str) -> Result<ChatCot, LlmError>;
}
