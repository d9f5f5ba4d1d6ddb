// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Whitespace-token windows. `chunk_size` counts tokens, not bytes.

use tf_core::ChunkConfig;

pub(crate) fn split(content: &str, config: &ChunkConfig) -> Vec<String> {
    let per_chunk = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(per_chunk - 1);
    let step = per_chunk - overlap;

    let tokens: Vec<&str> = content.split_whitespace().collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < tokens.len() {
        let end = (start + per_chunk).min(tokens.len());
        chunks.push(tokens[start..end].join(" "));
        if end == tokens.len() {
            break;
        }
        start += step;
    }
    chunks
}
