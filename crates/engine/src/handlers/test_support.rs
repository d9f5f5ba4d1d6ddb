// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for handler tests.

use crate::context::JobContext;
use std::sync::Arc;
use tf_core::test_support::{actor, NOW};
use tf_core::{
    Catalog, CatalogId, FakeClock, FilePair, FilePairId, GaPair, GaPairId, Job, JobRequest,
    Locale, Meta, Project, ProjectId, ProviderModel, Question, QuestionId, SourceFile,
};
use tf_llm::FakeChatClient;
use tf_storage::Store;
use tokio_util::sync::CancellationToken;

pub(crate) struct Fixture {
    pub ctx: JobContext<FakeClock>,
    pub store: Store<FakeClock>,
    pub llm: Arc<FakeChatClient>,
    pub project_id: ProjectId,
}

pub(crate) fn fixture() -> Fixture {
    let clock = FakeClock::new();
    clock.set_epoch_secs(NOW);
    let store = Store::in_memory(clock.clone());
    let llm = Arc::new(FakeChatClient::new());
    let project_id =
        store.create_project(Project::new(&actor(), "project", NOW)).map(|p| p.id).unwrap();
    let ctx = JobContext {
        store: store.clone(),
        llm: llm.clone(),
        clock,
        cancel: CancellationToken::new(),
    };
    Fixture { ctx, store, llm, project_id }
}

impl Fixture {
    /// Insert a `Running` job so handler persistence has a row to update.
    pub fn job(&self, request: JobRequest) -> Job {
        self.store.create_job(&actor(), self.project_id.clone(), request, Locale::En).unwrap()
    }

    pub fn seed_file(&self, name: &str, content: &str) -> SourceFile {
        self.store
            .create_file(SourceFile::new(&actor(), self.project_id.clone(), name, content, NOW))
            .unwrap()
    }

    pub fn seed_file_pair(&self, file: &SourceFile, content: &str) -> FilePair {
        self.store
            .bulk_create_file_pairs(vec![FilePair {
                id: FilePairId::new(),
                meta: Meta::new(&actor(), NOW),
                project_id: self.project_id.clone(),
                file_id: file.id.clone(),
                name: "chunk".to_string(),
                content: content.to_string(),
                summary: String::new(),
                size: content.len() as u64,
                chunk_index: 1,
                question_id_list: Vec::new(),
            }])
            .unwrap()
            .remove(0)
    }

    pub fn seed_question(&self, pair: &FilePair, text: &str) -> Question {
        self.store
            .bulk_create_questions(vec![Question {
                id: QuestionId::new(),
                meta: Meta::new(&actor(), NOW),
                project_id: self.project_id.clone(),
                file_id: pair.file_id.clone(),
                file_pair_id: pair.id.clone(),
                question: text.to_string(),
                tag_name: String::new(),
                ga_pair: None,
                has_dataset: false,
            }])
            .unwrap()
            .remove(0)
    }

    pub fn seed_ga_pair(&self, file: &SourceFile) -> GaPair {
        self.store
            .bulk_create_ga_pairs(vec![GaPair {
                id: GaPairId::new(),
                meta: Meta::new(&actor(), NOW),
                project_id: self.project_id.clone(),
                file_id: file.id.clone(),
                text_style: "tutorial".to_string(),
                text_desc: "step by step".to_string(),
                audience: "beginners".to_string(),
                audience_desc: "new users".to_string(),
                enable: true,
            }])
            .unwrap()
            .remove(0)
    }

    pub fn seed_catalog(&self, file: &SourceFile, toc_json: &str) -> Catalog {
        self.store
            .create_catalog(Catalog {
                id: CatalogId::new(),
                meta: Meta::new(&actor(), NOW),
                project_id: self.project_id.clone(),
                file_id: file.id.clone(),
                file_name: file.file_name.clone(),
                toc: toc_json.to_string(),
            })
            .unwrap()
    }

    pub fn seed_default_model(&self) -> ProviderModel {
        let model = self
            .store
            .add_provider_model(ProviderModel::new(
                &actor(),
                "acct",
                "test-model",
                "key",
                "http://llm.local",
                NOW,
            ))
            .unwrap();
        self.store.set_default_model(&actor(), &model.id).unwrap()
    }
}
