// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote fine-tuning orchestrator.
//!
//! Lifecycle: `Initializing → Init → Starting → {Success | Failed | Error |
//! Cancel}`. Creation snapshots everything the job needs; initialization
//! stages artifacts idempotently; start launches one systemd unit per node
//! and spawns a watcher per node; the storage layer's atomic node
//! accounting decides which watcher publishes the release.

pub mod plan;
pub(crate) mod watcher;

use crate::context::EngineConfig;
use crate::error::EngineError;
use crate::{messages, paths};
use plan::{build_plans, NodePlan};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tf_core::{
    detect_finetune_method, Actor, Clock, ConfigType, DatasetVersionId, FinetuneConfigId,
    FinetuneJob, FinetuneJobId, FinetuneJobStatus, Locale, MachineId, Meta, TrainStage,
};
use tf_remote::{HostClient, HostFactory, LogStream};
use tf_storage::Store;
use tracing::{error, info};

pub(crate) const START_TIMEOUT: Duration = Duration::from_secs(180);
pub(crate) const STAGING_TIMEOUT: Duration = Duration::from_secs(3600);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FinetuneCreate {
    pub name: String,
    pub description: String,
    pub stage: TrainStage,
    pub dataset_version_id: DatasetVersionId,
    pub finetune_config_id_list: Vec<FinetuneConfigId>,
    pub node_machine_id_list: Vec<MachineId>,
}

/// Where a log read is served from, depending on job state.
pub enum JobLogs {
    /// Terminal job: the log was already downloaded into the local store.
    Local(PathBuf),
    /// Starting job: live remote tail.
    Remote(LogStream),
}

#[derive(Clone)]
pub struct FinetuneService<C: Clock> {
    pub(crate) store: Store<C>,
    pub(crate) hosts: Arc<dyn HostFactory>,
    pub(crate) config: EngineConfig,
    pub(crate) clock: C,
    pub(crate) poll_interval: Duration,
}

impl<C: Clock> FinetuneService<C> {
    pub fn new(
        store: Store<C>,
        hosts: Arc<dyn HostFactory>,
        config: EngineConfig,
        clock: C,
    ) -> Self {
        Self { store, hosts, config, clock, poll_interval: DEFAULT_POLL_INTERVAL }
    }

    /// Shrink the watcher tick. Test hook.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Validate, snapshot, persist as `Initializing`, and kick off async
    /// staging. Snapshots are deep copies: the job must stay runnable after
    /// the source rows are edited or deleted.
    pub fn create(
        &self,
        actor: &Actor,
        create: FinetuneCreate,
        locale: Locale,
    ) -> Result<FinetuneJob, EngineError> {
        if create.stage != TrainStage::Sft {
            return Err(EngineError::Validation(messages::validation_failed(locale, "stage")));
        }

        let dataset_version = self
            .store
            .get_dataset_version(actor, &create.dataset_version_id)
            .map_err(|_| {
                EngineError::Validation(messages::dataset_version_not_found(
                    locale,
                    &create.dataset_version_id,
                ))
            })?;
        let configs = self
            .store
            .finetune_configs_by_ids(actor, &create.finetune_config_id_list)
            .map_err(|e| match e {
                tf_storage::StorageError::NotFound { id, .. } => {
                    EngineError::Validation(messages::finetune_config_not_found(locale, &id))
                }
                other => EngineError::Storage(other),
            })?;
        let machines =
            self.store.machines_by_ids(actor, &create.node_machine_id_list).map_err(|e| {
                match e {
                    tf_storage::StorageError::NotFound { id, .. } => {
                        EngineError::Validation(messages::machine_not_found(locale, &id))
                    }
                    other => EngineError::Storage(other),
                }
            })?;
        if machines.is_empty() {
            return Err(EngineError::Validation(messages::machine_not_found(locale, "")));
        }

        // Multi-GPU or multi-node training needs a DeepSpeed config.
        let needs_deepspeed = machines[0].gpu_count > 1 || machines.len() > 1;
        let has_deepspeed =
            configs.iter().any(|c| c.config_type == ConfigType::DeepspeedArguments);
        if needs_deepspeed && !has_deepspeed {
            return Err(EngineError::Validation(messages::deepspeed_required(locale)));
        }

        let now = self.clock.epoch_secs();
        let job = FinetuneJob {
            id: FinetuneJobId::new(),
            meta: Meta::new(actor, now),
            name: create.name,
            description: create.description,
            status: FinetuneJobStatus::Initializing,
            stage: create.stage,
            finetune_method: detect_finetune_method(&configs),
            dataset_version,
            finetune_config_list: configs,
            node_machine_list: machines,
            error_info: String::new(),
            done_node_num: 0,
            release_id: None,
            locale,
            start_at: 0,
            end_at: 0,
        };
        let job = self.store.create_finetune_job(job)?;

        let svc = self.clone();
        let task_actor = actor.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move { svc.initialize(task_actor, job_id).await });

        Ok(job)
    }

    /// Async staging; flips the job to `Init` on success, `Error` otherwise.
    pub async fn initialize(&self, actor: Actor, job_id: FinetuneJobId) {
        match self.stage_artifacts(&actor, &job_id).await {
            Ok(()) => {
                let _ = self.store.update_finetune_job(&actor, &job_id, |j| {
                    j.status = FinetuneJobStatus::Init;
                    j.error_info.clear();
                });
                info!(job = %job_id, "finetune job staged");
            }
            Err(e) => {
                error!(job = %job_id, error = %e, "finetune staging failed");
                let now = self.clock.epoch_secs();
                let _ = self.store.update_finetune_job(&actor, &job_id, |j| {
                    j.status = FinetuneJobStatus::Error;
                    j.error_info = e.to_string();
                    j.end_at = now;
                });
            }
        }
    }

    async fn stage_artifacts(
        &self,
        actor: &Actor,
        job_id: &FinetuneJobId,
    ) -> Result<(), EngineError> {
        let job = self.store.get_finetune_job(actor, job_id)?;
        let locale = job.locale;
        let plans = build_plans(&job)?;
        let dataset_json = self.prepare_dataset_json(&job)?;

        for plan in &plans {
            let host = self.hosts.host(&plan.machine);
            let (ok, err) = host.test_connection().await;
            if !ok {
                return Err(EngineError::Internal(messages::machine_connect_failed(
                    locale, &err,
                )));
            }

            // Every upload below no-ops if the target already exists, so a
            // replayed initialization writes nothing new.
            host.upload_with_dirs(
                &dataset_json,
                &paths::dataset_path(&job.dataset_version.id),
                false,
            )
            .await?;
            self.upload_text(
                host.as_ref(),
                &plan.dataset_info_json,
                &paths::dataset_info_json_path(&job.id),
                &format!("tf_dataset_info_{}.json", job.id),
            )
            .await?;
            self.upload_text(
                host.as_ref(),
                &plan.train_yaml,
                &paths::job_config_path(&job.id),
                &format!("tf_train_{}.yaml", job.id),
            )
            .await?;
            if !plan.deepspeed_json.is_empty() {
                self.upload_text(
                    host.as_ref(),
                    &plan.deepspeed_json,
                    &paths::job_deepspeed_path(&job.id),
                    &format!("tf_deepspeed_{}.json", job.id),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Convert the dataset version's JSONL into the JSON array llamafactory
    /// wants, with local `jq`. Cached by output filename, so repeat runs
    /// skip the conversion.
    fn prepare_dataset_json(&self, job: &FinetuneJob) -> Result<PathBuf, EngineError> {
        let jsonl =
            paths::dataset_version_file(&self.config.dataset_version_dir, &job.dataset_version.id);
        let output = jsonl.with_extension("json");
        if output.exists() {
            return Ok(output);
        }

        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(format!("jq -s '.' {} > {}", jsonl.display(), output.display()))
            .status()?;
        if !status.success() {
            return Err(EngineError::Internal(format!(
                "jq conversion failed for {}",
                jsonl.display()
            )));
        }
        Ok(output)
    }

    /// Stage a rendered text artifact through a temp file.
    async fn upload_text(
        &self,
        host: &dyn HostClient,
        content: &str,
        remote: &str,
        temp_name: &str,
    ) -> Result<(), EngineError> {
        let tmp = std::env::temp_dir().join(temp_name);
        std::fs::write(&tmp, content)?;
        let outcome = host.upload_with_dirs(&tmp, remote, false).await;
        let _ = std::fs::remove_file(&tmp);
        outcome?;
        Ok(())
    }

    /// Launch the unit on every node and spawn the per-node watchers.
    pub async fn start(
        &self,
        actor: &Actor,
        id: &FinetuneJobId,
    ) -> Result<FinetuneJob, EngineError> {
        let job = self.store.get_finetune_job(actor, id)?;
        let locale = job.locale;
        if job.status != FinetuneJobStatus::Init {
            return Err(EngineError::Validation(messages::only_init_can_start(locale)));
        }
        let plans = build_plans(&job)?;

        match self.launch_nodes(&plans, locale).await {
            Ok(()) => {
                let now = self.clock.epoch_secs();
                let updated = self.store.update_finetune_job(actor, id, |j| {
                    j.status = FinetuneJobStatus::Starting;
                    j.start_at = now;
                    j.error_info.clear();
                })?;
                for plan in &plans {
                    self.spawn_watcher(actor.clone(), id.clone(), plan.machine.id.clone());
                }
                info!(job = %id, nodes = plans.len(), "finetune job started");
                Ok(updated)
            }
            Err(message) => {
                let now = self.clock.epoch_secs();
                self.store.update_finetune_job(actor, id, |j| {
                    j.status = FinetuneJobStatus::Error;
                    j.error_info = message.clone();
                    j.end_at = now;
                })?;
                Err(EngineError::Internal(message))
            }
        }
    }

    async fn launch_nodes(&self, plans: &[NodePlan], locale: Locale) -> Result<(), String> {
        for plan in plans {
            let host = self.hosts.host(&plan.machine);
            let (ok, err) = host.test_connection().await;
            if !ok {
                return Err(messages::machine_connect_failed(locale, &err));
            }
            for cmd in &plan.cmds {
                let out = host
                    .execute_command(cmd, START_TIMEOUT)
                    .await
                    .map_err(|e| e.to_string())?;
                if !out.success() {
                    return Err(messages::start_finetune_failed(
                        locale,
                        out.exit_code,
                        &out.stderr,
                    ));
                }
            }
        }
        Ok(())
    }

    fn spawn_watcher(&self, actor: Actor, job_id: FinetuneJobId, machine_id: MachineId) {
        let svc = self.clone();
        tokio::spawn(async move { watcher::watch_node(svc, actor, job_id, machine_id).await });
    }

    /// User cancellation, only from `Starting`. Watchers observe the status
    /// on their next tick and tear their units down.
    pub fn cancel(&self, actor: &Actor, id: &FinetuneJobId) -> Result<FinetuneJob, EngineError> {
        let job = self.store.get_finetune_job(actor, id)?;
        if job.status != FinetuneJobStatus::Starting {
            return Err(EngineError::Validation(messages::only_starting_can_cancel(job.locale)));
        }
        let now = self.clock.epoch_secs();
        Ok(self.store.update_finetune_job(actor, id, |j| {
            j.status = FinetuneJobStatus::Cancel;
            j.end_at = now;
        })?)
    }

    /// Respawn watchers for every `Starting` job after a restart. Returns
    /// the number of watchers spawned.
    pub fn recover(&self) -> usize {
        let mut spawned = 0;
        for job in self.store.starting_finetune_jobs() {
            let actor = job.actor();
            for machine in &job.node_machine_list {
                self.spawn_watcher(actor.clone(), job.id.clone(), machine.id.clone());
                spawned += 1;
            }
        }
        if spawned > 0 {
            info!(watchers = spawned, "recovered finetune watchers");
        }
        spawned
    }

    /// Per-machine training log: remote tail while running, local file once
    /// the watcher has downloaded it.
    pub async fn job_logs(
        &self,
        actor: &Actor,
        id: &FinetuneJobId,
        machine_id: &MachineId,
    ) -> Result<JobLogs, EngineError> {
        let job = self.store.get_finetune_job(actor, id)?;
        let locale = job.locale;
        match job.status {
            FinetuneJobStatus::Cancel | FinetuneJobStatus::Success | FinetuneJobStatus::Failed => {
                Ok(JobLogs::Local(paths::local_job_log(
                    &self.config.finetune_local_dir,
                    id,
                    machine_id,
                )))
            }
            FinetuneJobStatus::Starting => {
                let machine = job.node(machine_id).ok_or_else(|| {
                    EngineError::Validation(messages::machine_not_found(locale, machine_id))
                })?;
                let host = self.hosts.host(machine);
                let (ok, err) = host.test_connection().await;
                if !ok {
                    return Err(EngineError::Internal(messages::machine_connect_failed(
                        locale, &err,
                    )));
                }
                Ok(JobLogs::Remote(host.tail_log(&paths::job_log_path(id)).await?))
            }
            _ => Err(EngineError::Validation(messages::validation_failed(locale, "status"))),
        }
    }
}

#[cfg(test)]
#[path = "finetune_tests.rs"]
mod tests;
