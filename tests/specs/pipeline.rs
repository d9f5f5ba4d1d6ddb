// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The content pipeline through the job manager: split a file, generate
//! questions, then cancel a second question job mid-run.

use super::support::world;
use std::sync::Arc;
use std::time::Duration;
use tf_core::test_support::actor;
use tf_core::{
    ChunkConfig, FilePairRequest, JobRequest, JobStatus, Locale, Project, QuestionRequest,
    SourceFile, TocBuildAction,
};
use tf_engine::{register_default_handlers, JobManager};

const DOC: &str = "\
# Handbook

intro

## Chapter One

alpha beta gamma

## Chapter Two

delta epsilon zeta
";

#[tokio::test]
async fn split_then_generate_then_cancel_midway() {
    let w = world();
    let manager = Arc::new(JobManager::new(w.store.clone(), w.llm.clone(), w.clock.clone()));
    register_default_handlers(manager.as_ref());
    let runner = Arc::clone(&manager);
    let run_task = tokio::spawn(async move { runner.run().await });

    let project = w.store.create_project(Project::new(&actor(), "p", 0)).unwrap();
    let file = w
        .store
        .create_file(SourceFile::new(&actor(), project.id.clone(), "handbook.md", DOC, 0))
        .unwrap();

    // 1. Split.
    let split_job = w
        .store
        .create_job(
            &actor(),
            project.id.clone(),
            JobRequest::FilePairGenerator(FilePairRequest {
                file_ids: vec![file.id.clone()],
                chunk: ChunkConfig::default(),
                toc_build_action: TocBuildAction::Keep,
            }),
            Locale::En,
        )
        .unwrap();
    manager.add_job(split_job.clone());
    wait_status(&w.store, &split_job.id, JobStatus::Success).await;

    let pairs = w.store.list_file_pairs(&actor(), &file.id);
    assert_eq!(pairs.len(), 3);

    // 2. Questions for the first chunk. Two LLM rounds: generate + label.
    w.llm.push_json(serde_json::json!(["What is the handbook for?"]));
    w.llm.push_json(serde_json::json!([
        {"question": "What is the handbook for?", "label": "handbook"}
    ]));
    let question_job = w
        .store
        .create_job(
            &actor(),
            project.id.clone(),
            JobRequest::QuestionGenerator(QuestionRequest {
                file_pair_ids: vec![pairs[0].id.clone()],
                number: 1,
                question_generation_length: 100,
                use_ga_generator: false,
            }),
            Locale::En,
        )
        .unwrap();
    manager.add_job(question_job.clone());
    wait_status(&w.store, &question_job.id, JobStatus::Success).await;
    assert_eq!(w.store.questions_for_file_pair(&actor(), &pairs[0].id).len(), 1);

    // 3. A second question job over all chunks, cancelled while the
    // scheduler owns it. Whichever side of the persistence boundary the
    // cancel lands on, the job must reach a terminal state and the
    // scheduler must keep draining.
    let doomed = w
        .store
        .create_job(
            &actor(),
            project.id.clone(),
            JobRequest::QuestionGenerator(QuestionRequest {
                file_pair_ids: pairs.iter().map(|p| p.id.clone()).collect(),
                number: 1,
                question_generation_length: 100,
                use_ga_generator: false,
            }),
            Locale::En,
        )
        .unwrap();
    manager.cancel_job(&doomed.id); // not yet running: no-op
    manager.add_job(doomed.clone());
    // Give the scheduler a tick to start it, then cancel for real.
    tokio::time::sleep(Duration::from_millis(150)).await;
    manager.cancel_job(&doomed.id);
    wait_terminal(&w.store, &doomed.id).await;

    manager.stop();
    let _ = run_task.await;
}

async fn wait_status(
    store: &tf_storage::Store<tf_core::FakeClock>,
    id: &tf_core::JobId,
    expected: JobStatus,
) {
    for _ in 0..300 {
        if store.get_job(&actor(), id).unwrap().status == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never reached {expected:?}");
}

async fn wait_terminal(store: &tf_storage::Store<tf_core::FakeClock>, id: &tf_core::JobId) {
    for _ in 0..300 {
        if store.get_job(&actor(), id).unwrap().status.is_terminal() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never finished");
}
