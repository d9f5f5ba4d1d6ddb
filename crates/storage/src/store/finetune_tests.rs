// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tf_core::test_support::{actor, dataset_version, machine_with_id, NOW};
use tf_core::{
    FakeClock, FinetuneJob, FinetuneJobId, FinetuneJobStatus, Locale, Meta, ProjectId, Release,
    TrainStage,
};

fn store() -> crate::Store<FakeClock> {
    let clock = FakeClock::new();
    clock.set_epoch_secs(NOW);
    crate::Store::in_memory(clock)
}

fn three_node_job() -> FinetuneJob {
    let project = ProjectId::from_string("prj-1");
    FinetuneJob {
        id: FinetuneJobId::new(),
        meta: Meta::new(&actor(), NOW),
        name: "train".into(),
        description: String::new(),
        status: FinetuneJobStatus::Starting,
        stage: TrainStage::Sft,
        finetune_method: "lora".into(),
        dataset_version: dataset_version(&project, "dv1"),
        finetune_config_list: vec![],
        node_machine_list: vec![
            machine_with_id("mch-0", "n0", 2),
            machine_with_id("mch-1", "n1", 2),
            machine_with_id("mch-2", "n2", 2),
        ],
        error_info: String::new(),
        done_node_num: 0,
        release_id: None,
        locale: Locale::Zh,
        start_at: NOW,
        end_at: 0,
    }
}

fn release_for(job: &FinetuneJob) -> Release {
    Release::new(
        &actor(),
        job.name.clone(),
        job.description.clone(),
        "/models/m",
        job.stage,
        job.finetune_method.clone(),
        job.id.clone(),
        "/local/lora_model.tar.gz",
        NOW,
    )
}

#[test]
fn node_success_counts_up_and_finishes_exactly_once() {
    let store = store();
    let job = store.create_finetune_job(three_node_job()).unwrap();

    let first = store.record_node_success(&actor(), &job.id).unwrap();
    assert_eq!(first, NodeSuccess { done_node_num: 1, node_count: 3, finished: false });

    let second = store.record_node_success(&actor(), &job.id).unwrap();
    assert!(!second.finished);

    let third = store.record_node_success(&actor(), &job.id).unwrap();
    assert!(third.finished);
    assert_eq!(third.done_node_num, 3);

    let stored = store.get_finetune_job(&actor(), &job.id).unwrap();
    assert_eq!(stored.status, FinetuneJobStatus::Success);
    assert!(stored.end_at > 0);
}

#[test]
fn done_node_num_never_exceeds_the_node_count() {
    let store = store();
    let job = store.create_finetune_job(three_node_job()).unwrap();

    for _ in 0..5 {
        let outcome = store.record_node_success(&actor(), &job.id).unwrap();
        assert!(outcome.done_node_num <= outcome.node_count);
    }
    let stored = store.get_finetune_job(&actor(), &job.id).unwrap();
    assert_eq!(stored.done_node_num, 3);
}

#[test]
fn a_failed_job_does_not_flip_to_success_on_late_node_reports() {
    let store = store();
    let job = store.create_finetune_job(three_node_job()).unwrap();

    store
        .update_finetune_job(&actor(), &job.id, |j| {
            j.status = FinetuneJobStatus::Failed;
            j.error_info = "exit 1".into();
        })
        .unwrap();

    for _ in 0..3 {
        let outcome = store.record_node_success(&actor(), &job.id).unwrap();
        assert!(!outcome.finished);
    }
    let stored = store.get_finetune_job(&actor(), &job.id).unwrap();
    assert_eq!(stored.status, FinetuneJobStatus::Failed);
}

#[test]
fn terminal_finetune_jobs_ignore_further_updates() {
    let store = store();
    let job = store.create_finetune_job(three_node_job()).unwrap();
    store
        .update_finetune_job(&actor(), &job.id, |j| j.status = FinetuneJobStatus::Cancel)
        .unwrap();

    let stored = store
        .update_finetune_job(&actor(), &job.id, |j| j.status = FinetuneJobStatus::Starting)
        .unwrap();
    assert_eq!(stored.status, FinetuneJobStatus::Cancel);
}

#[test]
fn publish_release_links_job_and_release() {
    let store = store();
    let job = store.create_finetune_job(three_node_job()).unwrap();
    for _ in 0..3 {
        store.record_node_success(&actor(), &job.id).unwrap();
    }

    let release = store.publish_release(&actor(), &job.id, release_for(&job)).unwrap();

    let stored = store.get_finetune_job(&actor(), &job.id).unwrap();
    assert_eq!(stored.release_id, Some(release.id.clone()));
    assert_eq!(store.releases_for_job(&job.id), 1);
    assert!(store.get_release(&actor(), &release.id).is_ok());
}

#[test]
fn concurrent_node_successes_finish_exactly_once() {
    let store = store();
    let job = store.create_finetune_job(three_node_job()).unwrap();

    let mut handles = Vec::new();
    for _ in 0..3 {
        let store = store.clone();
        let id = job.id.clone();
        handles.push(std::thread::spawn(move || {
            store.record_node_success(&actor(), &id).unwrap().finished
        }));
    }
    let finishes: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(finishes.iter().filter(|f| **f).count(), 1);
}

#[test]
fn starting_jobs_are_recovered_across_groups() {
    let store = store();
    store.create_finetune_job(three_node_job()).unwrap();
    let mut other = three_node_job();
    other.meta = Meta::new(&tf_core::Actor::new("u9", "g9"), NOW);
    store.create_finetune_job(other).unwrap();

    assert_eq!(store.starting_finetune_jobs().len(), 2);
}
