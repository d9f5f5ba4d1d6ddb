// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt builders, one variant per locale.
//!
//! Templates are intentionally compact; the contract that matters is the
//! JSON shape each prompt demands, which the handlers parse.

mod en;
mod zh;

use tf_core::{GaPair, Locale, TagNode};

pub fn ga_generation(locale: Locale, text: &str) -> String {
    match locale {
        Locale::Zh => zh::ga_generation(text),
        Locale::En => en::ga_generation(text),
    }
}

pub fn question(locale: Locale, text: &str, number: u32, ga: Option<&GaPair>) -> String {
    match locale {
        Locale::Zh => zh::question(text, number, ga),
        Locale::En => en::question(text, number, ga),
    }
}

pub fn add_label(locale: Locale, tags: &[TagNode], questions_json: &str) -> String {
    let forest = forest_json(tags);
    match locale {
        Locale::Zh => zh::add_label(&forest, questions_json),
        Locale::En => en::add_label(&forest, questions_json),
    }
}

pub fn label_rebuild(locale: Locale, toc: &str) -> String {
    match locale {
        Locale::Zh => zh::label_rebuild(toc),
        Locale::En => en::label_rebuild(toc),
    }
}

pub fn label_revise(
    locale: Locale,
    toc: &str,
    tags: &[TagNode],
    deleted_content: &str,
    new_content: &str,
) -> String {
    let forest = forest_json(tags);
    match locale {
        Locale::Zh => zh::label_revise(toc, &forest, deleted_content, new_content),
        Locale::En => en::label_revise(toc, &forest, deleted_content, new_content),
    }
}

pub fn answer(locale: Locale, chunk: &str, question: &str) -> String {
    match locale {
        Locale::Zh => zh::answer(chunk, question),
        Locale::En => en::answer(chunk, question),
    }
}

pub fn enhanced_answer(
    locale: Locale,
    chunk: &str,
    question: &str,
    ga: Option<&GaPair>,
) -> String {
    match locale {
        Locale::Zh => zh::enhanced_answer(chunk, question, ga),
        Locale::En => en::enhanced_answer(chunk, question, ga),
    }
}

pub fn optimize_cot(locale: Locale, question: &str, answer: &str, cot: &str) -> String {
    match locale {
        Locale::Zh => zh::optimize_cot(question, answer, cot),
        Locale::En => en::optimize_cot(question, answer, cot),
    }
}

fn forest_json(tags: &[TagNode]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn ga_line(ga: Option<&GaPair>) -> String {
    match ga {
        Some(ga) => format!(
            "genre: {} ({}); audience: {} ({})",
            ga.text_style, ga.text_desc, ga.audience, ga.audience_desc
        ),
        None => String::new(),
    }
}
