// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-node watcher: polls the training unit every tick, reports into the
//! shared job row, and tears the unit down on exit.

use super::{FinetuneService, STAGING_TIMEOUT};
use crate::error::EngineError;
use crate::{messages, paths};
use std::time::Duration;
use tf_core::{
    detect_finetune_method, Actor, Clock, FinetuneJob, FinetuneJobId, FinetuneJobStatus,
    MachineId, Release,
};
use tf_remote::{HostClient, ServiceStatus};
use tracing::{error, info, warn};

const EXEC_TIMEOUT: Duration = Duration::from_secs(30);
/// Consecutive connection failures tolerated before the job is failed.
const CONNECT_FAILURE_LIMIT: u32 = 10;

pub(crate) async fn watch_node<C: Clock>(
    svc: FinetuneService<C>,
    actor: Actor,
    job_id: FinetuneJobId,
    machine_id: MachineId,
) {
    if let Err(e) = watch_loop(&svc, &actor, &job_id, &machine_id).await {
        error!(job = %job_id, machine = %machine_id, error = %e, "watcher failed");
        let now = svc.clock.epoch_secs();
        let _ = svc.store.update_finetune_job(&actor, &job_id, |j| {
            j.status = FinetuneJobStatus::Error;
            j.error_info = e.to_string();
            j.end_at = now;
        });
    }
}

async fn watch_loop<C: Clock>(
    svc: &FinetuneService<C>,
    actor: &Actor,
    job_id: &FinetuneJobId,
    machine_id: &MachineId,
) -> Result<(), EngineError> {
    let mut connect_failures = 0u32;

    loop {
        tokio::time::sleep(svc.poll_interval).await;

        let Ok(job) = svc.store.get_finetune_job(actor, job_id) else {
            error!(job = %job_id, machine = %machine_id, "finetune job disappeared, watcher exits");
            return Ok(());
        };
        let locale = job.locale;
        let Some(machine) = job.node(machine_id).cloned() else {
            return Ok(());
        };
        let host = svc.hosts.host(&machine);

        let (ok, _) = host.test_connection().await;
        if !ok {
            connect_failures += 1;
            warn!(job = %job_id, machine = %machine_id, failures = connect_failures, "node unreachable");
            if connect_failures > CONNECT_FAILURE_LIMIT {
                let now = svc.clock.epoch_secs();
                svc.store.update_finetune_job(actor, job_id, |j| {
                    j.status = FinetuneJobStatus::Error;
                    j.error_info = messages::connection_failed_too_often(locale);
                    j.end_at = now;
                })?;
                return Ok(());
            }
            continue;
        }
        connect_failures = 0;

        let (service_status, detail) = host.monitor_service_status(job_id.as_str()).await?;
        // Re-read: sibling watchers and user cancellation mutate the row.
        let job = svc.store.get_finetune_job(actor, job_id)?;

        match service_status {
            ServiceStatus::Starting => {
                if job.status != FinetuneJobStatus::Starting {
                    // The job ended elsewhere (cancel or failure): stop the
                    // still-running unit and leave.
                    stop_unit(host.as_ref(), job_id).await;
                    remove_unit(host.as_ref(), job_id).await;
                    return Ok(());
                }
            }
            ServiceStatus::Failed | ServiceStatus::Error => {
                if job.status != FinetuneJobStatus::Starting {
                    remove_unit(host.as_ref(), job_id).await;
                    return Ok(());
                }
                // Record the failure but keep polling: sibling nodes still
                // get to report, and the next tick exits via the branch
                // above once the row is terminal.
                let _ = host
                    .download_file(
                        &paths::job_log_path(job_id),
                        &paths::local_job_log(&svc.config.finetune_local_dir, job_id, machine_id),
                    )
                    .await;
                let status = if service_status == ServiceStatus::Failed {
                    FinetuneJobStatus::Failed
                } else {
                    FinetuneJobStatus::Error
                };
                let now = svc.clock.epoch_secs();
                svc.store.update_finetune_job(actor, job_id, |j| {
                    j.status = status;
                    j.error_info = detail.clone();
                    j.end_at = now;
                })?;
            }
            ServiceStatus::Success => {
                let _ = host
                    .download_file(
                        &paths::job_log_path(job_id),
                        &paths::local_job_log(&svc.config.finetune_local_dir, job_id, machine_id),
                    )
                    .await;

                // Atomic increment: exactly one watcher sees `finished`.
                let outcome = svc.store.record_node_success(actor, job_id)?;
                info!(
                    job = %job_id,
                    machine = %machine_id,
                    done = outcome.done_node_num,
                    nodes = outcome.node_count,
                    "node finished training"
                );
                if outcome.finished {
                    publish_release(svc, actor, &job).await?;
                }
                remove_unit(host.as_ref(), job_id).await;
                return Ok(());
            }
        }
    }
}

/// Package the master's output directory and publish the release.
async fn publish_release<C: Clock>(
    svc: &FinetuneService<C>,
    actor: &Actor,
    job: &FinetuneJob,
) -> Result<(), EngineError> {
    let master = job
        .master()
        .ok_or_else(|| EngineError::Internal("finetune job has no nodes".to_string()))?;
    let host = svc.hosts.host(master);

    let tar_cmd = format!(
        "tar -czvf {} -C {}/.. output",
        paths::job_lora_tar_path(&job.id),
        paths::job_output_dir(&job.id)
    );
    host.execute_command(&tar_cmd, STAGING_TIMEOUT).await?;

    let local_tar = paths::local_lora_tar(&svc.config.finetune_local_dir, &job.id);
    host.download_file(&paths::job_lora_tar_path(&job.id), &local_tar).await?;

    let release = Release::new(
        actor,
        job.name.clone(),
        job.description.clone(),
        job.base_model(),
        job.stage,
        detect_finetune_method(&job.finetune_config_list),
        job.id.clone(),
        local_tar.to_string_lossy(),
        svc.clock.epoch_secs(),
    );
    let release = svc.store.publish_release(actor, &job.id, release)?;
    info!(job = %job.id, release = %release.id, "release published");
    Ok(())
}

async fn stop_unit(host: &dyn HostClient, job_id: &FinetuneJobId) {
    if let Err(e) =
        host.execute_command(&format!("systemctl stop {job_id}.service"), EXEC_TIMEOUT).await
    {
        error!(job = %job_id, error = %e, "stop service failed");
    }
}

async fn remove_unit(host: &dyn HostClient, job_id: &FinetuneJobId) {
    if let Err(e) = host
        .execute_command(&format!("rm -rf /etc/systemd/system/{job_id}.service"), EXEC_TIMEOUT)
        .await
    {
        error!(job = %job_id, error = %e, "remove service failed");
    }
}
