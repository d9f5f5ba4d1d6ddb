// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::ga_line;
use tf_core::GaPair;

pub(super) fn ga_generation(text: &str) -> String {
    format!(
        "你是一名内容分析师。阅读下面的文本, 为其生成训练问题提出合适的(体裁, 受众)组合。\n\
返回 JSON 数组, 每个元素形如 \
{{\"genre\": {{\"title\": \"...\", \"description\": \"...\"}}, \
\"audience\": {{\"title\": \"...\", \"description\": \"...\"}}}}。\n\
文本:\n{text}"
    )
}

pub(super) fn question(text: &str, number: u32, ga: Option<&GaPair>) -> String {
    let adaptation = match ga {
        Some(_) => format!("请根据以下体裁/受众调整问题的语气和侧重点: {}。\n", ga_line(ga)),
        None => String::new(),
    };
    format!(
        "基于下面的文本生成 {number} 个可以被文本完整回答的学习问题。\
{adaptation}只返回问题字符串组成的 JSON 数组。\n\
文本:\n{text}"
    )
}

pub(super) fn add_label(forest: &str, questions_json: &str) -> String {
    format!(
        "为每个问题从标签树中选择最匹配的标签。\n\
标签树 (JSON): {forest}\n\
问题 (JSON): {questions_json}\n\
返回 JSON 数组, 元素形如 {{\"question\": \"...\", \"label\": \"...\"}}。"
    )
}

pub(super) fn label_rebuild(toc: &str) -> String {
    format!(
        "根据下面合并的目录构建一个两级主题标签树。\n\
返回 JSON 数组, 节点形如 {{\"label\": \"...\", \"child\": [...]}}。\n\
目录:\n{toc}"
    )
}

pub(super) fn label_revise(
    toc: &str,
    forest: &str,
    deleted_content: &str,
    new_content: &str,
) -> String {
    format!(
        "文档发生变更, 请修订现有标签树: 保留仍然稳定的标签, 合并新增主题, \
删除失去全部内容的标签。\n\
当前目录:\n{toc}\n\
现有标签树 (JSON): {forest}\n\
删除的目录项:\n{deleted_content}\n\
新增的目录项:\n{new_content}\n\
返回完整修订后的树, JSON 数组, 节点形如 {{\"label\": \"...\", \"child\": [...]}}。"
    )
}

pub(super) fn answer(chunk: &str, question: &str) -> String {
    format!(
        "严格依据参考文本回答问题, 准确完整, 不要编造。\n\
参考文本:\n{chunk}\n\
问题: {question}"
    )
}

pub(super) fn enhanced_answer(chunk: &str, question: &str, ga: Option<&GaPair>) -> String {
    format!(
        "严格依据参考文本回答问题, 并匹配目标体裁与受众: {}。\n\
参考文本:\n{chunk}\n\
问题: {question}",
        ga_line(ga)
    )
}

pub(super) fn optimize_cot(question: &str, answer: &str, cot: &str) -> String {
    format!(
        "重写下面的思维链, 使其成为对答案的独立推导: 去掉对\"文本\"或\"参考\"的指代, \
保留所有关键推理步骤。\n\
问题: {question}\n\
答案: {answer}\n\
思维链:\n{cot}"
    )
}
