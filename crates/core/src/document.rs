// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The document-processing graph: projects, files, chunks, questions,
//! datasets, genre/audience pairs, tags, catalogs, and dataset versions.

use crate::finetune::TrainStage;
use crate::meta::{Actor, Meta};
use serde::{Deserialize, Serialize};

crate::define_id! {
    pub struct ProjectId("prj-");
}

crate::define_id! {
    pub struct FileId("fil-");
}

crate::define_id! {
    pub struct FilePairId("fpr-");
}

crate::define_id! {
    pub struct GaPairId("gap-");
}

crate::define_id! {
    pub struct QuestionId("que-");
}

crate::define_id! {
    pub struct DatasetId("dst-");
}

crate::define_id! {
    pub struct TagId("tag-");
}

crate::define_id! {
    pub struct CatalogId("cat-");
}

crate::define_id! {
    pub struct DatasetVersionId("dsv-");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    #[serde(flatten)]
    pub meta: Meta,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Project {
    pub fn new(actor: &Actor, name: impl Into<String>, now: u64) -> Self {
        Self {
            id: ProjectId::new(),
            meta: Meta::new(actor, now),
            name: name.into(),
            description: String::new(),
        }
    }
}

crate::record_impl!(Project);

/// An uploaded source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: FileId,
    #[serde(flatten)]
    pub meta: Meta,
    pub project_id: ProjectId,
    pub file_name: String,
    pub content: String,
    pub size: u64,
}

impl SourceFile {
    pub fn new(
        actor: &Actor,
        project_id: ProjectId,
        file_name: impl Into<String>,
        content: impl Into<String>,
        now: u64,
    ) -> Self {
        let content = content.into();
        Self {
            id: FileId::new(),
            meta: Meta::new(actor, now),
            project_id,
            file_name: file_name.into(),
            size: content.len() as u64,
            content,
        }
    }
}

crate::record_impl!(SourceFile);

/// A chunk of a source file with a stable 1-based index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePair {
    pub id: FilePairId,
    #[serde(flatten)]
    pub meta: Meta,
    pub project_id: ProjectId,
    pub file_id: FileId,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub summary: String,
    pub size: u64,
    pub chunk_index: u32,
    /// Empty-or-absent both mean "no questions yet".
    #[serde(default)]
    pub question_id_list: Vec<QuestionId>,
}

crate::record_impl!(FilePair);

/// A (genre, audience) pair conditioning question/answer generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaPair {
    pub id: GaPairId,
    #[serde(flatten)]
    pub meta: Meta,
    pub project_id: ProjectId,
    pub file_id: FileId,
    pub text_style: String,
    pub text_desc: String,
    pub audience: String,
    pub audience_desc: String,
    pub enable: bool,
}

impl GaPair {
    /// Identity quadruple used for append-mode dedup.
    pub fn quadruple(&self) -> (&str, &str, &str, &str) {
        (&self.text_style, &self.text_desc, &self.audience, &self.audience_desc)
    }
}

crate::record_impl!(GaPair);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(flatten)]
    pub meta: Meta,
    pub project_id: ProjectId,
    pub file_id: FileId,
    pub file_pair_id: FilePairId,
    pub question: String,
    #[serde(default)]
    pub tag_name: String,
    /// GA pair snapshot embedded at generation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ga_pair: Option<GaPair>,
    #[serde(default)]
    pub has_dataset: bool,
}

crate::record_impl!(Question);

/// A generated question/answer/CoT row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    #[serde(flatten)]
    pub meta: Meta,
    pub project_id: ProjectId,
    pub file_id: FileId,
    pub file_pair_id: FilePairId,
    pub question_id: QuestionId,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub cot: String,
    #[serde(default)]
    pub tag_name: String,
    /// Model that produced the answer.
    pub model: String,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ga_pair: Option<GaPair>,
}

crate::record_impl!(Dataset);

/// A node in the project tag forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    #[serde(flatten)]
    pub meta: Meta,
    pub project_id: ProjectId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TagId>,
    /// Denormalized ancestor chain for fast root lookup.
    #[serde(default)]
    pub root_ids: Vec<TagId>,
}

crate::record_impl!(Tag);

/// Label tree exchanged with the LLM during tag generation and labeling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNode {
    pub label: String,
    #[serde(default)]
    pub child: Vec<TagNode>,
}

/// Per-file table of contents, stored as a JSON string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub id: CatalogId,
    #[serde(flatten)]
    pub meta: Meta,
    pub project_id: ProjectId,
    pub file_id: FileId,
    pub file_name: String,
    pub toc: String,
}

crate::record_impl!(Catalog);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersionOptions {
    /// Serialize answers as `<think>{cot}<\think>\n{answer}` when a CoT exists.
    #[serde(default)]
    pub output_with_cot: bool,
}

/// An immutable, file-materialized subset of datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub id: DatasetVersionId,
    #[serde(flatten)]
    pub meta: Meta,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub dataset_type: TrainStage,
    #[serde(default)]
    pub options: DatasetVersionOptions,
}

crate::record_impl!(DatasetVersion);

/// One line of an SFT-stage dataset version file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SftRecord {
    pub instruction: String,
    pub input: String,
    pub output: String,
}
