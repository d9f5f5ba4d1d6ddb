// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tf-core: Domain types for the tuneforge control plane.

pub mod macros;

pub mod chunk;
pub mod clock;
pub mod deploy;
pub mod document;
pub mod finetune;
pub mod id;
pub mod job;
pub mod locale;
pub mod machine;
pub mod meta;
pub mod provider;
pub mod release;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use chunk::{ChunkConfig, ChunkStrategy, TocBuildAction};
pub use clock::{Clock, FakeClock, SystemClock};
pub use deploy::{ClusterId, DeployCluster, DeployStatus, LoraId, LoraInfo, RayStatus};
pub use document::{
    Catalog, CatalogId, Dataset, DatasetId, DatasetVersion, DatasetVersionId,
    DatasetVersionOptions, FilePair, FilePairId, GaPair, GaPairId, Project, ProjectId, Question,
    QuestionId, SftRecord, SourceFile, FileId, Tag, TagId, TagNode,
};
pub use finetune::{
    detect_finetune_method, ConfigType, FinetuneConfig, FinetuneConfigId, FinetuneJob,
    FinetuneJobId, FinetuneJobStatus, TrainStage,
};
pub use job::{
    DatasetRequest, FileDeleteRequest, FilePairRequest, FileSnapshot, GaPairRequest, Job, JobId,
    JobRequest, JobResult, JobStatus, JobType, Progress, QuestionRequest, TagRequest,
};
pub use locale::Locale;
pub use machine::{ConnInfo, Machine, MachineId};
pub use meta::{Actor, Meta, Record};
pub use provider::{ProviderModel, ProviderModelId};
pub use release::{Release, ReleaseId};
