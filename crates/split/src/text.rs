// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-size windows with character-boundary-safe overlap.

use tf_core::ChunkConfig;

pub(crate) fn split(content: &str, config: &ChunkConfig) -> Vec<String> {
    let size = config.chunk_size.max(1);
    let step = size.saturating_sub(config.chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < content.len() {
        let end = start + chunk_len(&content[start..], size);
        chunks.push(content[start..end].to_string());
        if end >= content.len() {
            break;
        }
        start += chunk_len(&content[start..], step);
    }
    chunks
}

/// Byte length of a chunk of at most `max` bytes, at least one char.
fn chunk_len(s: &str, max: usize) -> usize {
    let n = crate::floor_char_boundary(s, max);
    if n == 0 {
        s.chars().next().map(|c| c.len_utf8()).unwrap_or(s.len())
    } else {
        n
    }
}
