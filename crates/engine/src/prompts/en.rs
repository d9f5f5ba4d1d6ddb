// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ga_line;
use tf_core::GaPair;

pub(super) fn ga_generation(text: &str) -> String {
    format!(
        "You are a content analyst. Read the text below and propose suitable \
(genre, audience) pairs for generating training questions from it.\n\
Return a JSON array, each element shaped as \
{{\"genre\": {{\"title\": \"...\", \"description\": \"...\"}}, \
\"audience\": {{\"title\": \"...\", \"description\": \"...\"}}}}.\n\
Text:\n{text}"
    )
}

pub(super) fn question(text: &str, number: u32, ga: Option<&GaPair>) -> String {
    let adaptation = match ga {
        Some(_) => format!("Adapt tone and focus to this genre/audience: {}.\n", ga_line(ga)),
        None => String::new(),
    };
    format!(
        "Generate {number} study questions that the text below can fully answer. \
{adaptation}Return a JSON array of question strings only.\n\
Text:\n{text}"
    )
}

pub(super) fn add_label(forest: &str, questions_json: &str) -> String {
    format!(
        "Assign each question the best-matching label from the label tree.\n\
Label tree (JSON): {forest}\n\
Questions (JSON): {questions_json}\n\
Return a JSON array of {{\"question\": \"...\", \"label\": \"...\"}} objects."
    )
}

pub(super) fn label_rebuild(toc: &str) -> String {
    format!(
        "Build a two-level topic label tree covering the combined table of \
contents below.\n\
Return a JSON array of {{\"label\": \"...\", \"child\": [...]}} nodes.\n\
Table of contents:\n{toc}"
    )
}

pub(super) fn label_revise(
    toc: &str,
    forest: &str,
    deleted_content: &str,
    new_content: &str,
) -> String {
    format!(
        "Revise the existing label tree after a document change. Keep stable \
labels, fold in new topics, and drop labels that lost all their content.\n\
Current table of contents:\n{toc}\n\
Existing label tree (JSON): {forest}\n\
Removed entries:\n{deleted_content}\n\
Added entries:\n{new_content}\n\
Return the full revised tree as a JSON array of \
{{\"label\": \"...\", \"child\": [...]}} nodes."
    )
}

pub(super) fn answer(chunk: &str, question: &str) -> String {
    format!(
        "Answer the question strictly from the reference text. Be accurate \
and complete; do not invent facts.\n\
Reference:\n{chunk}\n\
Question: {question}"
    )
}

pub(super) fn enhanced_answer(chunk: &str, question: &str, ga: Option<&GaPair>) -> String {
    format!(
        "Answer the question strictly from the reference text, matching the \
target genre and audience: {}.\n\
Reference:\n{chunk}\n\
Question: {question}",
        ga_line(ga)
    )
}

pub(super) fn optimize_cot(question: &str, answer: &str, cot: &str) -> String {
    format!(
        "Rewrite the reasoning chain below so it reads as a self-contained \
derivation of the answer: remove references to \"the text\" or \"the \
reference\", keep every load-bearing step.\n\
Question: {question}\n\
Answer: {answer}\n\
Reasoning chain:\n{cot}"
    )
}
