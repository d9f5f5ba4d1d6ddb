// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use tf_core::ChunkStrategy;
use yare::parameterized;

fn config(strategy: ChunkStrategy, chunk_size: usize, chunk_overlap: usize) -> ChunkConfig {
    ChunkConfig { strategy, chunk_size, chunk_overlap }
}

const MD: &str = "\
# Guide

intro paragraph

## Install

step one

step two

## Usage

run it
";

#[test]
fn chunk_indexes_are_one_based_and_sequential() {
    let items = split_file("guide.md", MD, &config(ChunkStrategy::Markdown, 2000, 0));
    let indexes: Vec<u32> = items.iter().map(|i| i.chunk_index).collect();
    assert_eq!(indexes, (1..=items.len() as u32).collect::<Vec<_>>());
}

#[test]
fn markdown_chunks_concatenate_back_to_the_document() {
    let items = split_file("guide.md", MD, &config(ChunkStrategy::Markdown, 40, 0));
    let rebuilt: String = items.iter().map(|i| i.content.as_str()).collect();
    assert_eq!(rebuilt, MD);
}

#[test]
fn markdown_toc_of_chunks_covers_the_original_toc() {
    let original = extract_table_of_contents(MD);
    let items = split_file("guide.md", MD, &config(ChunkStrategy::Markdown, 40, 0));
    let rebuilt: String = items.iter().map(|i| i.content.as_str()).collect();
    let after = extract_table_of_contents(&rebuilt);
    for entry in &original {
        assert!(after.contains(entry), "missing {entry:?}");
    }
}

#[test]
fn markdown_chunk_names_come_from_headings() {
    let items = split_file("guide.md", MD, &config(ChunkStrategy::Markdown, 2000, 0));
    let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Guide", "Install", "Usage"]);
}

#[test]
fn markdown_summary_tracks_the_heading_path() {
    let items = split_file("guide.md", MD, &config(ChunkStrategy::Markdown, 2000, 0));
    assert_eq!(items[1].summary, "Guide > Install");
}

#[test]
fn text_split_respects_the_size_limit() {
    let content = "abcdefghij".repeat(10);
    let items = split_file("t.txt", &content, &config(ChunkStrategy::Text, 30, 0));
    assert!(items.iter().all(|i| i.content.len() <= 30));
    let rebuilt: String = items.iter().map(|i| i.content.as_str()).collect();
    assert_eq!(rebuilt, content);
}

#[test]
fn text_split_overlap_repeats_the_tail() {
    let content = "0123456789".repeat(3);
    let items = split_file("t.txt", &content, &config(ChunkStrategy::Text, 10, 4));
    assert!(items.len() > 3);
    assert!(items[1].content.starts_with(&items[0].content[6..]));
}

#[test]
fn recursive_split_prefers_paragraph_boundaries() {
    let content = "para one\n\npara two\n\npara three\n\n";
    let items = split_file("t.txt", content, &config(ChunkStrategy::Recursive, 22, 0));
    assert!(items.iter().all(|i| i.content.len() <= 22));
    assert!(items[0].content.contains("para one"));
}

#[test]
fn token_split_counts_tokens() {
    let content = "a b c d e f g";
    let items = split_file("t.txt", content, &config(ChunkStrategy::Token, 3, 0));
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].content, "a b c");
    assert_eq!(items[2].content, "g");
}

#[test]
fn code_split_breaks_at_blank_lines() {
    let content = "fn a() {}\n\nfn b() {}\n\nfn c() {}\n";
    let items = split_file("m.rs", content, &config(ChunkStrategy::Code, 12, 0));
    assert!(items.len() >= 2);
    let rebuilt: String = items.iter().map(|i| i.content.as_str()).collect();
    assert_eq!(rebuilt, content);
}

#[parameterized(
    markdown = { ChunkStrategy::Markdown },
    recursive = { ChunkStrategy::Recursive },
    text = { ChunkStrategy::Text },
    token = { ChunkStrategy::Token },
    code = { ChunkStrategy::Code },
)]
fn splitting_is_deterministic(strategy: ChunkStrategy) {
    let cfg = config(strategy, 50, 5);
    let a = split_file("f.md", MD, &cfg);
    let b = split_file("f.md", MD, &cfg);
    assert_eq!(a, b);
}

#[test]
fn item_size_matches_content_length() {
    let items = split_file("f.md", MD, &config(ChunkStrategy::Text, 25, 0));
    assert!(items.iter().all(|i| i.size == i.content.len() as u64));
}

proptest! {
    #[test]
    fn text_split_never_loses_bytes(content in "[a-z \n]{0,200}", size in 1usize..50) {
        let items = split_file("f.txt", &content, &config(ChunkStrategy::Text, size, 0));
        let rebuilt: String = items.iter().map(|i| i.content.as_str()).collect();
        prop_assert_eq!(rebuilt, content);
    }

    #[test]
    fn markdown_split_never_loses_bytes(content in "[a-z#\n ]{0,300}", size in 1usize..80) {
        let items = split_file("f.md", &content, &config(ChunkStrategy::Markdown, size, 0));
        let rebuilt: String = items.iter().map(|i| i.content.as_str()).collect();
        prop_assert_eq!(rebuilt, content);
    }
}
