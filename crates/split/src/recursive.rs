// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Separator-cascade splitting: paragraphs, then lines, then words.

use tf_core::ChunkConfig;

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

pub(crate) fn split(content: &str, config: &ChunkConfig) -> Vec<String> {
    let size = config.chunk_size.max(1);
    let mut chunks = Vec::new();
    split_with(content, size, 0, &mut chunks);
    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

fn split_with(content: &str, size: usize, sep_index: usize, out: &mut Vec<String>) {
    if content.len() <= size {
        if !content.is_empty() {
            out.push(content.to_string());
        }
        return;
    }
    let Some(sep) = SEPARATORS.get(sep_index) else {
        // Out of separators: hard cut on char boundaries.
        let mut rest = content;
        while !rest.is_empty() {
            let mut cut = crate::floor_char_boundary(rest, size);
            if cut == 0 {
                cut = rest.chars().next().map(|c| c.len_utf8()).unwrap_or(rest.len());
            }
            out.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
        return;
    };

    let mut current = String::new();
    for piece in content.split_inclusive(sep) {
        if piece.len() > size {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            split_with(piece, size, sep_index + 1, out);
            continue;
        }
        if !current.is_empty() && current.len() + piece.len() > size {
            out.push(std::mem::take(&mut current));
        }
        current.push_str(piece);
    }
    if !current.is_empty() {
        out.push(current);
    }
}
