// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pulling structure out of free-form model output: `<think>` blocks and
//! fenced JSON.

use crate::error::LlmError;

const START_TAGS: [&str; 2] = ["<think>", "<thinking>"];
const END_TAGS: [&str; 2] = ["</think>", "</thinking>"];

/// The text between the first `<think>`/`<thinking>` pair, or empty when no
/// complete pair exists.
pub fn think_chain(text: &str) -> String {
    for (start_tag, end_tag) in START_TAGS.iter().zip(END_TAGS) {
        let Some(start) = text.find(start_tag) else {
            continue;
        };
        let after = start + start_tag.len();
        let Some(end) = text[after..].find(end_tag) else {
            return String::new();
        };
        return text[after..after + end].trim().to_string();
    }
    String::new()
}

/// Everything outside the first think block; the whole text when none.
pub fn answer(text: &str) -> String {
    for (start_tag, end_tag) in START_TAGS.iter().zip(END_TAGS) {
        if let (Some(start), Some(_)) = (text.find(start_tag), text.find(end_tag)) {
            let before = &text[..start];
            let after_block = text[start..]
                .find(end_tag)
                .map(|e| &text[start + e + end_tag.len()..])
                .unwrap_or("");
            return format!("{} {}", before.trim(), after_block.trim()).trim().to_string();
        }
    }
    text.to_string()
}

/// Parse JSON out of model output: direct parse first, then the contents of
/// a fenced ```json block.
pub fn json_from_output(output: &str) -> Result<serde_json::Value, LlmError> {
    if let Ok(value) = serde_json::from_str(output) {
        return Ok(value);
    }

    let Some(start) = output.find("```json") else {
        return Err(LlmError::Unexpected(format!(
            "the model is not output in standard format. output: {output}"
        )));
    };
    let body = &output[start + "```json".len()..];
    let Some(end) = body.rfind("```") else {
        return Err(LlmError::Unexpected(format!(
            "the model is not output in standard format. output: {output}"
        )));
    };
    serde_json::from_str(&body[..end]).map_err(|e| {
        LlmError::Unexpected(format!("error parsing JSON returned by llm: {e}, output: {output}"))
    })
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
