// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heading-structured splitting.
//!
//! The document is partitioned at headings so that concatenating the chunks
//! reproduces the original text; oversized sections are subdivided on
//! paragraph boundaries.

use crate::toc::TocEntry;
use crate::SplitItem;
use tf_core::ChunkConfig;

struct Section {
    heading: Option<TocEntry>,
    content: String,
}

pub(crate) fn split(file_name: &str, content: &str, config: &ChunkConfig) -> Vec<SplitItem> {
    let sections = sectionize(content);
    let mut items = Vec::new();
    let mut outline: Vec<TocEntry> = Vec::new();

    for section in &sections {
        if let Some(h) = &section.heading {
            while outline.last().is_some_and(|top| top.level >= h.level) {
                outline.pop();
            }
            outline.push(h.clone());
        }
        let name = section
            .heading
            .as_ref()
            .map(|h| h.title.clone())
            .unwrap_or_else(|| file_name.to_string());
        let summary = outline
            .iter()
            .map(|e| e.title.as_str())
            .collect::<Vec<_>>()
            .join(" > ");

        for piece in subdivide(&section.content, config.chunk_size) {
            items.push(SplitItem {
                name: name.clone(),
                summary: summary.clone(),
                size: piece.len() as u64,
                content: piece,
                chunk_index: 0,
            });
        }
    }

    for (i, item) in items.iter_mut().enumerate() {
        item.chunk_index = (i + 1) as u32;
    }
    items
}

/// Partition the document at heading lines. Every byte of the input lands in
/// exactly one section.
fn sectionize(content: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = String::new();
    let mut current_heading: Option<TocEntry> = None;
    let mut in_fence = false;

    let mut push = |heading: Option<TocEntry>, content: &mut String| {
        if !content.is_empty() || heading.is_some() {
            sections.push(Section { heading, content: std::mem::take(content) });
        }
    };

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            current.push_str(line);
            continue;
        }
        let heading = if in_fence { None } else { heading_of(trimmed) };
        match heading {
            Some(entry) => {
                push(current_heading.take(), &mut current);
                current_heading = Some(entry);
                current.push_str(line);
            }
            None => current.push_str(line),
        }
    }
    push(current_heading.take(), &mut current);
    sections
}

fn heading_of(line: &str) -> Option<TocEntry> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let title = line[hashes..].strip_prefix(' ')?.trim();
    if title.is_empty() {
        return None;
    }
    Some(TocEntry { level: hashes as u8, title: title.to_string() })
}

/// Cut an oversized section on paragraph boundaries, hard-splitting any
/// single paragraph that is still too large.
fn subdivide(content: &str, chunk_size: usize) -> Vec<String> {
    if content.len() <= chunk_size || chunk_size == 0 {
        return vec![content.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for para in content.split_inclusive("\n\n") {
        if !current.is_empty() && current.len() + para.len() > chunk_size {
            pieces.push(std::mem::take(&mut current));
        }
        if para.len() > chunk_size {
            let mut rest = para;
            while rest.len() > chunk_size {
                let mut cut = crate::floor_char_boundary(rest, chunk_size);
                if cut == 0 {
                    cut = rest.chars().next().map(|c| c.len_utf8()).unwrap_or(rest.len());
                }
                pieces.push(rest[..cut].to_string());
                rest = &rest[cut..];
            }
            current.push_str(rest);
        } else {
            current.push_str(para);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
