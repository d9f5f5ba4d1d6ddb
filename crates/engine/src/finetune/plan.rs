// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-node launch plans: training command, systemd unit, rendered train
//! yaml, and the DeepSpeed JSON, all derived from the job's embedded
//! snapshots.

use crate::error::EngineError;
use crate::paths;
use tf_core::{ConfigType, FinetuneJob, Machine};

/// Rendezvous port for multi-node torchrun.
pub const MASTER_PORT: u16 = 29500;

/// Everything needed to stage and launch one node.
#[derive(Debug, Clone)]
pub struct NodePlan {
    pub machine: Machine,
    pub node_index: usize,
    pub train_cmd: String,
    pub unit_file: String,
    /// Commands that install and start the unit, in order.
    pub cmds: Vec<String>,
    pub train_yaml: String,
    /// Empty when the job has no DeepSpeed config.
    pub deepspeed_json: String,
    pub dataset_info_json: String,
}

/// Build one plan per node, in node-list order.
pub fn build_plans(job: &FinetuneJob) -> Result<Vec<NodePlan>, EngineError> {
    let train_yaml = build_train_yaml(job)?;
    let deepspeed_json = deepspeed_json(job)?;
    let dataset_info_json = dataset_info_json(job);

    (0..job.node_machine_list.len())
        .map(|index| {
            let machine = job.node_machine_list[index].clone();
            let train_cmd = train_command(job, index)?;
            let unit_file = render_unit(job, &train_cmd);
            let cmds = vec![
                format!(
                    "cat << 'EOF' > /etc/systemd/system/{}.service\n{}\nEOF",
                    job.id, unit_file
                ),
                "systemctl daemon-reload".to_string(),
                format!("systemctl start {}.service", job.id),
            ];
            Ok(NodePlan {
                machine,
                node_index: index,
                train_cmd,
                unit_file,
                cmds,
                train_yaml: train_yaml.clone(),
                deepspeed_json: deepspeed_json.clone(),
                dataset_info_json: dataset_info_json.clone(),
            })
        })
        .collect()
}

/// Topology-dependent invocation:
/// one GPU runs the CLI bare, multi-GPU forces torchrun, multi-node adds
/// the rendezvous environment.
fn train_command(job: &FinetuneJob, node_index: usize) -> Result<String, EngineError> {
    let config_path = paths::job_config_path(&job.id);
    let node_num = job.node_machine_list.len();
    let master = job
        .master()
        .ok_or_else(|| EngineError::Internal("finetune job has no nodes".to_string()))?;

    if node_num == 1 {
        if master.gpu_count > 1 {
            Ok(format!("/bin/bash -c 'FORCE_TORCHRUN=1 llamafactory-cli train {config_path}'"))
        } else {
            Ok(format!("llamafactory-cli train {config_path}"))
        }
    } else {
        let master_addr = &master.conn.internal_ip;
        Ok(format!(
            "/bin/bash -c 'FORCE_TORCHRUN=1 NNODES={node_num} NODE_RANK={node_index} \
MASTER_ADDR={master_addr} MASTER_PORT={MASTER_PORT} llamafactory-cli train {config_path}'"
        ))
    }
}

fn render_unit(job: &FinetuneJob, train_cmd: &str) -> String {
    let work_dir = paths::job_work_dir(&job.id);
    let log_path = paths::job_log_path(&job.id);
    format!(
        "[Unit]\n\
Description=finetune job\n\
\n\
[Service]\n\
Type=simple\n\
WorkingDirectory={work_dir}\n\
ExecStart={train_cmd}\n\
Restart=no\n\
StandardOutput=file:{log_path}\n\
StandardError=file:{log_path}\n\
Environment=USE_MODELSCOPE_HUB=true\n\
\n\
[Install]\n\
WantedBy=multi-user.target"
    )
}

/// Render the llamafactory train yaml, one `### <block>` section per config,
/// with the dataset, output, and deepspeed locations pinned to this job's
/// staging paths.
fn build_train_yaml(job: &FinetuneJob) -> Result<String, EngineError> {
    let has_deepspeed = job.config_of(ConfigType::DeepspeedArguments).is_some();
    let mut sections = String::new();

    for config in &job.finetune_config_list {
        if config.config_type == ConfigType::DeepspeedArguments {
            continue;
        }
        let mut block = config.config.clone();
        match config.config_type {
            ConfigType::DataArguments => {
                block.insert(
                    "dataset".to_string(),
                    serde_json::Value::String(job.dataset_version.id.to_string()),
                );
                block.insert(
                    "dataset_dir".to_string(),
                    serde_json::Value::String(paths::dataset_info_dir(&job.id)),
                );
            }
            ConfigType::OutputArguments => {
                block.insert(
                    "output_dir".to_string(),
                    serde_json::Value::String(paths::job_output_dir(&job.id)),
                );
            }
            ConfigType::TrainingArguments if has_deepspeed => {
                block.insert(
                    "deepspeed".to_string(),
                    serde_json::Value::String(paths::job_deepspeed_path(&job.id)),
                );
            }
            _ => {}
        }
        let yaml = serde_yaml::to_string(&block)
            .map_err(|e| EngineError::Internal(format!("yaml render failed: {e}")))?;
        sections.push_str(&format!("### {}\n{yaml}\n\n", config.config_type));
    }
    Ok(sections)
}

fn deepspeed_json(job: &FinetuneJob) -> Result<String, EngineError> {
    match job.config_of(ConfigType::DeepspeedArguments) {
        None => Ok(String::new()),
        Some(config) => serde_json::to_string_pretty(&config.config)
            .map_err(|e| EngineError::Internal(format!("deepspeed render failed: {e}"))),
    }
}

/// The `dataset_info.json` llamafactory reads: maps the dataset name to the
/// staged JSON file one directory up.
fn dataset_info_json(job: &FinetuneJob) -> String {
    format!(
        "{{\n   \"{id}\": {{\n      \"file_name\": \"../{id}.json\"\n   }}\n}}\n",
        id = job.dataset_version.id
    )
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
