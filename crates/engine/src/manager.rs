// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-concurrency background job scheduler.
//!
//! One mutex guards `{jobs, running, handlers}`. The run loop reaps
//! finished tasks, fills free slots with pending jobs in arrival order, and
//! ticks until stopped. Each job runs on its own tokio task with a
//! cancellation token the handler observes between items.

use crate::context::JobContext;
use crate::handlers::{HandlerError, JobHandler};
use crate::messages;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tf_core::{Clock, Job, JobId, JobResult, JobStatus, JobType};
use tf_llm::ChatClient;
use tf_storage::Store;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
const TICK: Duration = Duration::from_millis(100);

struct RunningJob {
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

struct ManagerState<C: Clock> {
    handlers: HashMap<JobType, Arc<dyn JobHandler<C>>>,
    jobs: HashMap<String, Job>,
    running: HashMap<String, RunningJob>,
}

pub struct JobManager<C: Clock> {
    store: Store<C>,
    llm: Arc<dyn ChatClient>,
    clock: C,
    max_concurrency: usize,
    inner: Arc<Mutex<ManagerState<C>>>,
    stop: CancellationToken,
}

impl<C: Clock> JobManager<C> {
    pub fn new(store: Store<C>, llm: Arc<dyn ChatClient>, clock: C) -> Self {
        Self {
            store,
            llm,
            clock,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            inner: Arc::new(Mutex::new(ManagerState {
                handlers: HashMap::new(),
                jobs: HashMap::new(),
                running: HashMap::new(),
            })),
            stop: CancellationToken::new(),
        }
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Install a handler for a job type. Call at startup, before `run`.
    pub fn register_handler(&self, job_type: JobType, handler: Arc<dyn JobHandler<C>>) {
        self.inner.lock().handlers.insert(job_type, handler);
    }

    /// Queue a job; the scheduler picks it up on the next tick.
    pub fn add_job(&self, job: Job) {
        self.inner.lock().jobs.insert(job.id.to_string(), job);
    }

    /// Flag a running job for cancellation. The handler observes the token
    /// at its next persistence boundary and winds down.
    pub fn cancel_job(&self, id: &JobId) {
        let inner = self.inner.lock();
        if let Some(running) = inner.running.get(id.as_str()) {
            running.cancel.cancel();
        }
    }

    /// Re-add every `Running` job from storage. Handlers are idempotent, so
    /// a half-completed job re-runs without duplicating downstream rows.
    pub fn load_running_jobs(&self) {
        let jobs = self.store.running_jobs();
        if !jobs.is_empty() {
            info!(count = jobs.len(), "recovering running jobs");
        }
        let mut inner = self.inner.lock();
        for job in jobs {
            inner.jobs.insert(job.id.to_string(), job);
        }
    }

    /// True when no job is queued or executing. Test hook.
    pub fn is_idle(&self) -> bool {
        let inner = self.inner.lock();
        inner.jobs.is_empty() && inner.running.is_empty()
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Cooperative scheduling loop; returns after [`JobManager::stop`].
    pub async fn run(&self) {
        let mut tick = tokio::time::interval(TICK);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            self.fill_slots();
            tokio::select! {
                _ = self.stop.cancelled() => break,
                _ = tick.tick() => {}
            }
        }
    }

    fn fill_slots(&self) {
        let mut inner = self.inner.lock();
        inner.running.retain(|_, r| !r.handle.is_finished());

        let available = self.max_concurrency.saturating_sub(inner.running.len());
        if available == 0 {
            return;
        }

        let mut candidates: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| !inner.running.contains_key(j.id.as_str()))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| {
            (a.meta.created_at, a.id.as_str()).cmp(&(b.meta.created_at, b.id.as_str()))
        });

        for job in candidates.into_iter().take(available) {
            let id = job.id.to_string();
            let cancel = CancellationToken::new();
            let handler = inner.handlers.get(&job.job_type()).cloned();
            let handle = tokio::spawn(run_job(
                self.store.clone(),
                Arc::clone(&self.llm),
                self.clock.clone(),
                handler,
                job,
                cancel.clone(),
                Arc::clone(&self.inner),
            ));
            inner.running.insert(id, RunningJob { cancel, handle });
        }
    }
}

/// Execute one job and translate its outcome into a terminal status.
async fn run_job<C: Clock>(
    store: Store<C>,
    llm: Arc<dyn ChatClient>,
    clock: C,
    handler: Option<Arc<dyn JobHandler<C>>>,
    job: Job,
    cancel: CancellationToken,
    inner: Arc<Mutex<ManagerState<C>>>,
) {
    let job_id = job.id.clone();
    let actor = job.actor();
    let locale = job.locale;
    info!(job = %job_id, job_type = %job.job_type(), "start processing job");

    match handler {
        None => {
            let mut result = JobResult::message(messages::no_handler(locale, job.job_type()));
            let _ = store.update_job_status(&actor, &job_id, JobStatus::Failed, &mut result);
        }
        Some(handler) => {
            let ctx = JobContext {
                store: store.clone(),
                llm,
                clock: clock.clone(),
                cancel: cancel.clone(),
            };
            match handler.execute(&ctx, &job).await {
                Ok(mut result) => {
                    let _ =
                        store.update_job_status(&actor, &job_id, JobStatus::Success, &mut result);
                }
                Err(HandlerError::Cancelled) => {
                    info!(job = %job_id, "user cancelled job");
                    let mut result = JobResult::message(messages::job_cancel(locale));
                    let _ =
                        store.update_job_status(&actor, &job_id, JobStatus::Cancel, &mut result);
                }
                Err(e) => {
                    error!(job = %job_id, error = %e, "job execution failed");
                    let mut result =
                        JobResult::message(messages::job_failed(locale, &e.to_string()));
                    let _ =
                        store.update_job_status(&actor, &job_id, JobStatus::Failed, &mut result);
                }
            }
        }
    }

    let mut inner = inner.lock();
    inner.jobs.remove(job_id.as_str());
    inner.running.remove(job_id.as_str());
    info!(job = %job_id, "end processing job");
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
