// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Markdown table-of-contents extraction.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
}

/// Extract ATX headings (`#` .. `######`) in document order.
///
/// Headings inside fenced code blocks are ignored.
pub fn extract_table_of_contents(content: &str) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut in_fence = false;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(entry) = parse_heading(trimmed) {
            entries.push(entry);
        }
    }
    entries
}

fn parse_heading(line: &str) -> Option<TocEntry> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    let title = rest.strip_prefix(' ')?.trim();
    if title.is_empty() {
        return None;
    }
    Some(TocEntry { level: hashes as u8, title: title.to_string() })
}

/// Render entries back into heading lines, one per entry.
///
/// Used to hand the combined project TOC to the tag-generation prompts.
pub fn render_toc(entries: &[TocEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{} {}", "#".repeat(e.level as usize), e.title))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[path = "toc_tests.rs"]
mod tests;
