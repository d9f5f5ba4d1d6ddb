// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background job records and their typed request payloads.

use crate::chunk::{ChunkConfig, TocBuildAction};
use crate::document::{FileId, FilePairId, ProjectId, QuestionId};
use crate::locale::Locale;
use crate::meta::{Actor, Meta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a background job.
    pub struct JobId("job-");
}

/// Job lifecycle state. Everything except `Running` is terminal and sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Running,
    Failed,
    Cancel,
    Success,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

crate::simple_display! {
    JobStatus {
        Running => "Running",
        Failed => "Failed",
        Cancel => "Cancel",
        Success => "Success",
    }
}

/// Dispatch key for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    FilePairGenerator,
    FileDeleteGenerator,
    GaPairGenerator,
    TagGenerator,
    QuestionGenerator,
    DatasetGenerator,
}

crate::simple_display! {
    JobType {
        FilePairGenerator => "FilePairGenerator",
        FileDeleteGenerator => "FileDeleteGenerator",
        GaPairGenerator => "GaPairGenerator",
        TagGenerator => "TagGenerator",
        QuestionGenerator => "QuestionGenerator",
        DatasetGenerator => "DatasetGenerator",
    }
}

/// Item counter for a running job. `done_count` never exceeds `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: u32,
    pub done_count: u32,
}

impl Progress {
    pub fn new(total: u32) -> Self {
        Self { total, done_count: 0 }
    }
}

/// Durable outcome of a job: progress, append-only logs, and the last error.
///
/// `progress` is optional so that status-only updates (cancellation, crash
/// reporting) leave the stored counters untouched when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default)]
    pub logs: String,
    #[serde(default)]
    pub error: String,
}

impl JobResult {
    pub fn new(total: u32) -> Self {
        Self { progress: Some(Progress::new(total)), logs: String::new(), error: String::new() }
    }

    /// Status-only update carrying an error message and no progress.
    pub fn message(error: impl Into<String>) -> Self {
        Self { progress: None, logs: String::new(), error: error.into() }
    }

    /// Count one finished item.
    pub fn bump_done(&mut self) {
        if let Some(p) = self.progress.as_mut() {
            p.done_count = (p.done_count + 1).min(p.total);
        }
    }

    pub fn done_count(&self) -> u32 {
        self.progress.map(|p| p.done_count).unwrap_or(0)
    }

    /// Append a timestamped line: `[YYYY-MM-DD HH:MM:SS] message`.
    pub fn append_log(&mut self, now_secs: u64, message: &str) {
        let stamp = DateTime::<Utc>::from_timestamp(now_secs as i64, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let line = format!("[{stamp}] {message}");
        if self.logs.is_empty() {
            self.logs = line;
        } else {
            self.logs.push('\n');
            self.logs.push_str(&line);
        }
    }

    /// Drain buffered log lines after they have been persisted, so the next
    /// persistence round does not append them twice.
    pub fn take_logs(&mut self) -> String {
        std::mem::take(&mut self.logs)
    }
}

/// Snapshot of a file embedded in a deletion job.
///
/// The row itself is already soft-deleted by the time the job runs, so the
/// payload carries everything the handler needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub id: FileId,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePairRequest {
    pub file_ids: Vec<FileId>,
    pub chunk: ChunkConfig,
    pub toc_build_action: TocBuildAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDeleteRequest {
    pub file: FileSnapshot,
    pub toc_build_action: TocBuildAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaPairRequest {
    pub file_ids: Vec<FileId>,
    /// Append new pairs (skipping existing quadruples) instead of replacing.
    pub append_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    pub toc_build_action: TocBuildAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub file_pair_ids: Vec<FilePairId>,
    /// Requested question count; zero derives it from chunk length.
    #[serde(default)]
    pub number: u32,
    pub question_generation_length: u32,
    #[serde(default)]
    pub use_ga_generator: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRequest {
    pub question_ids: Vec<QuestionId>,
}

/// Typed job input, one variant per [`JobType`].
///
/// Persisted verbatim with its tag so payloads written by older builds still
/// deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobRequest {
    FilePairGenerator(FilePairRequest),
    FileDeleteGenerator(FileDeleteRequest),
    GaPairGenerator(GaPairRequest),
    TagGenerator(TagRequest),
    QuestionGenerator(QuestionRequest),
    DatasetGenerator(DatasetRequest),
}

impl JobRequest {
    pub fn job_type(&self) -> JobType {
        match self {
            JobRequest::FilePairGenerator(_) => JobType::FilePairGenerator,
            JobRequest::FileDeleteGenerator(_) => JobType::FileDeleteGenerator,
            JobRequest::GaPairGenerator(_) => JobType::GaPairGenerator,
            JobRequest::TagGenerator(_) => JobType::TagGenerator,
            JobRequest::QuestionGenerator(_) => JobType::QuestionGenerator,
            JobRequest::DatasetGenerator(_) => JobType::DatasetGenerator,
        }
    }
}

/// A background job instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(flatten)]
    pub meta: Meta,
    pub status: JobStatus,
    pub request: JobRequest,
    pub locale: Locale,
    pub project_id: ProjectId,
    #[serde(default)]
    pub result: JobResult,
}

impl Job {
    pub fn new(actor: &Actor, project_id: ProjectId, request: JobRequest, locale: Locale, now: u64) -> Self {
        Self {
            id: JobId::new(),
            meta: Meta::new(actor, now),
            status: JobStatus::Running,
            request,
            locale,
            project_id,
            result: JobResult::default(),
        }
    }

    pub fn job_type(&self) -> JobType {
        self.request.job_type()
    }

    /// Actor to run storage operations as, reconstructed from ownership.
    pub fn actor(&self) -> Actor {
        self.meta.actor()
    }
}

crate::record_impl!(Job);

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
