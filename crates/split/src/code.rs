// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-code splitting on blank-line block boundaries.

use tf_core::ChunkConfig;

pub(crate) fn split(content: &str, config: &ChunkConfig) -> Vec<String> {
    let size = config.chunk_size.max(1);

    let mut chunks = Vec::new();
    let mut current = String::new();
    for block in blocks(content) {
        if !current.is_empty() && current.len() + block.len() > size {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(&block);
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Group consecutive lines into blocks ending at blank lines, preserving
/// every byte of the input.
fn blocks(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for line in content.split_inclusive('\n') {
        current.push_str(line);
        if line.trim().is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
