// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunking configuration shared between job requests and the splitter.

use serde::{Deserialize, Serialize};

/// How a source file is cut into [`crate::FilePair`] chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    Markdown,
    Recursive,
    Text,
    Token,
    Code,
}

/// What to do with the project tag tree after a file's TOC changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TocBuildAction {
    /// Leave the tag tree untouched.
    Keep,
    /// Regenerate the whole tag tree from the project catalogs.
    Rebuild,
    /// Ask the LLM to merge the TOC diff into the existing tree.
    Revise,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub strategy: ChunkStrategy,
    pub chunk_size: usize,
    #[serde(default)]
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { strategy: ChunkStrategy::Markdown, chunk_size: 1500, chunk_overlap: 200 }
    }
}
