// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::handlers::tag::TagGenerator;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tf_core::test_support::{actor, NOW};
use tf_core::{FakeClock, Locale, ProjectId, TagRequest, TocBuildAction};
use tf_llm::FakeChatClient;

fn setup() -> (Arc<JobManager<FakeClock>>, Store<FakeClock>) {
    let clock = FakeClock::new();
    clock.set_epoch_secs(NOW);
    let store = Store::in_memory(clock.clone());
    let llm = Arc::new(FakeChatClient::new());
    let manager = Arc::new(JobManager::new(store.clone(), llm, clock));
    (manager, store)
}

fn keep_tag_request() -> tf_core::JobRequest {
    tf_core::JobRequest::TagGenerator(TagRequest { toc_build_action: TocBuildAction::Keep })
}

fn make_job(store: &Store<FakeClock>) -> Job {
    store
        .create_job(&actor(), ProjectId::from_string("prj-1"), keep_tag_request(), Locale::En)
        .unwrap()
}

async fn wait_idle(manager: &JobManager<FakeClock>) {
    for _ in 0..300 {
        if manager.is_idle() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("manager did not drain its jobs");
}

#[tokio::test]
async fn runs_a_job_to_success() {
    let (manager, store) = setup();
    manager.register_handler(JobType::TagGenerator, Arc::new(TagGenerator));
    let job = make_job(&store);
    manager.add_job(job.clone());

    let runner = Arc::clone(&manager);
    let handle = tokio::spawn(async move { runner.run().await });
    wait_idle(&manager).await;
    manager.stop();
    let _ = handle.await;

    let stored = store.get_job(&actor(), &job.id).unwrap();
    assert_eq!(stored.status, JobStatus::Success);
    assert_eq!(stored.result.done_count(), 1);
}

#[tokio::test]
async fn missing_handler_fails_the_job_with_a_message() {
    let (manager, store) = setup();
    let job = make_job(&store);
    manager.add_job(job.clone());

    let runner = Arc::clone(&manager);
    let handle = tokio::spawn(async move { runner.run().await });
    wait_idle(&manager).await;
    manager.stop();
    let _ = handle.await;

    let stored = store.get_job(&actor(), &job.id).unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.result.error.contains("TagGenerator"));
}

struct CancelProbe {
    reached_third_item: Arc<tokio::sync::Notify>,
}

#[async_trait]
impl JobHandler<FakeClock> for CancelProbe {
    async fn execute(
        &self,
        ctx: &crate::JobContext<FakeClock>,
        job: &Job,
    ) -> Result<JobResult, crate::HandlerError> {
        let mut result = JobResult::new(10);
        for i in 0..10 {
            ctx.ensure_active()?;
            result.bump_done();
            ctx.persist(job, &mut result)?;
            if i == 2 {
                self.reached_third_item.notify_one();
                // Hold at the persistence boundary until cancellation lands.
                ctx.cancel.cancelled().await;
            }
        }
        Ok(result)
    }
}

#[tokio::test]
async fn cancellation_is_observed_at_the_next_persistence_boundary() {
    let (manager, store) = setup();
    let reached = Arc::new(tokio::sync::Notify::new());
    manager.register_handler(
        JobType::TagGenerator,
        Arc::new(CancelProbe { reached_third_item: Arc::clone(&reached) }),
    );
    let job = make_job(&store);
    manager.add_job(job.clone());

    let runner = Arc::clone(&manager);
    let handle = tokio::spawn(async move { runner.run().await });

    reached.notified().await;
    manager.cancel_job(&job.id);
    wait_idle(&manager).await;
    manager.stop();
    let _ = handle.await;

    let stored = store.get_job(&actor(), &job.id).unwrap();
    assert_eq!(stored.status, JobStatus::Cancel);
    assert_eq!(stored.result.done_count(), 3);
    assert_eq!(stored.result.error, "Job cancel");
}

struct GaugeHandler {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

#[async_trait]
impl JobHandler<FakeClock> for GaugeHandler {
    async fn execute(
        &self,
        _ctx: &crate::JobContext<FakeClock>,
        _job: &Job,
    ) -> Result<JobResult, crate::HandlerError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(JobResult::new(0))
    }
}

#[tokio::test]
async fn concurrency_never_exceeds_the_limit() {
    let (manager, store) = setup();
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    manager.register_handler(
        JobType::TagGenerator,
        Arc::new(GaugeHandler { current: Arc::clone(&current), peak: Arc::clone(&peak) }),
    );
    for _ in 0..12 {
        manager.add_job(make_job(&store));
    }

    let runner = Arc::clone(&manager);
    let handle = tokio::spawn(async move { runner.run().await });
    wait_idle(&manager).await;
    manager.stop();
    let _ = handle.await;

    assert!(peak.load(Ordering::SeqCst) <= DEFAULT_MAX_CONCURRENCY);
    assert!(peak.load(Ordering::SeqCst) >= 2, "expected some parallelism");
}

#[tokio::test]
async fn recovery_reloads_running_jobs_from_storage() {
    let (manager, store) = setup();
    manager.register_handler(JobType::TagGenerator, Arc::new(TagGenerator));
    let a = make_job(&store);
    let b = make_job(&store);

    // Simulate a process restart: nothing queued in memory.
    assert!(manager.is_idle());
    manager.load_running_jobs();
    assert!(!manager.is_idle());

    let runner = Arc::clone(&manager);
    let handle = tokio::spawn(async move { runner.run().await });
    wait_idle(&manager).await;
    manager.stop();
    let _ = handle.await;

    for id in [a.id, b.id] {
        assert_eq!(store.get_job(&actor(), &id).unwrap().status, JobStatus::Success);
    }
}
