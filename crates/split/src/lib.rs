// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tf-split: chunking strategies and markdown TOC extraction.
//!
//! Splitting is deterministic: the same input and config always produce the
//! same chunks, in order, with 1-based `chunk_index` values.

mod code;
mod markdown;
mod recursive;
mod text;
pub mod toc;
mod token;

use tf_core::{ChunkConfig, ChunkStrategy};

pub use toc::{extract_table_of_contents, render_toc, TocEntry};

/// One chunk produced by a splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitItem {
    pub name: String,
    pub content: String,
    pub summary: String,
    pub size: u64,
    pub chunk_index: u32,
}

/// Split a file's content with the configured strategy.
pub fn split_file(file_name: &str, content: &str, config: &ChunkConfig) -> Vec<SplitItem> {
    let chunks = match config.strategy {
        ChunkStrategy::Markdown => return markdown::split(file_name, content, config),
        ChunkStrategy::Recursive => recursive::split(content, config),
        ChunkStrategy::Text => text::split(content, config),
        ChunkStrategy::Token => token::split(content, config),
        ChunkStrategy::Code => code::split(content, config),
    };
    items_from_chunks(file_name, chunks)
}

/// Wrap raw chunk strings into [`SplitItem`]s with positional names.
fn items_from_chunks(file_name: &str, chunks: Vec<String>) -> Vec<SplitItem> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, content)| SplitItem {
            name: format!("{} - {:03}", file_name, i + 1),
            size: content.len() as u64,
            summary: String::new(),
            content,
            chunk_index: (i + 1) as u32,
        })
        .collect()
}

/// Truncate to a char boundary at or below `max_bytes`.
pub(crate) fn floor_char_boundary(s: &str, max_bytes: usize) -> usize {
    if max_bytes >= s.len() {
        return s.len();
    }
    let mut idx = max_bytes;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
#[path = "split_tests.rs"]
mod tests;
