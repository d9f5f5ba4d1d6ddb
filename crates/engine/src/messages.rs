// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing message catalog, zh/en.
//!
//! Background tasks format messages with the locale captured at job
//! creation; nothing here reads ambient request state.

use tf_core::{JobType, Locale};

macro_rules! message {
    ($name:ident ( $($arg:ident : $ty:ty),* ), zh: $zh:literal, en: $en:literal) => {
        pub fn $name(locale: Locale, $($arg: $ty),*) -> String {
            match locale {
                Locale::Zh => format!($zh),
                Locale::En => format!($en),
            }
        }
    };
}

message!(no_handler(job_type: JobType),
    zh: "未找到任务类型对应的处理器: {job_type}",
    en: "No handler found for job type: {job_type}");

message!(job_cancel(),
    zh: "任务取消",
    en: "Job cancel");

message!(job_failed(error: &str),
    zh: "任务执行出错, error: {error}",
    en: "Error executing job, error: {error}");

message!(process_files_config(config: &str),
    zh: "处理文件配置: {config}",
    en: "Process files config: {config}");

message!(file_not_found(id: &str),
    zh: "文件不存在. id: {id}",
    en: "File not found. id: {id}");

message!(start_processing_file(file_name: &str),
    zh: "开始处理文件, file_name: {file_name}",
    en: "Start processing files, file_name: {file_name}");

message!(end_processing_file(file_name: &str),
    zh: "结束处理文件, file_name: {file_name}",
    en: "End processing files, file_name: {file_name}");

message!(process_file_failed(file_id: &str, error: &str),
    zh: "处理文件失败, file_id: {file_id}, error: {error}",
    en: "Process files failed, file_id: {file_id}, error: {error}");

message!(start_splitting(),
    zh: "开始拆分文件",
    en: "Start splitting files");

message!(end_splitting(),
    zh: "结束拆分文件",
    en: "End splitting files");

message!(start_catalog(),
    zh: "开始生成文件目录",
    en: "Start create file catalog");

message!(end_catalog(),
    zh: "结束生成文件目录",
    en: "End create file catalog");

message!(start_tag(),
    zh: "开始生成标签",
    en: "Start generator tag");

message!(end_tag(),
    zh: "结束生成标签",
    en: "End generator tag");

message!(start_llm(prompt: &str),
    zh: "开始调用大模型生成数据. prompt: {prompt}",
    en: "Start calling the llm to generate data. prompt: {prompt}");

message!(end_llm(output: &str),
    zh: "结束调用大模型生成数据. output: {output}",
    en: "End calling the llm to generate data. output: {output}");

message!(llm_empty_result(),
    zh: "大模型生成结果为空",
    en: "LLM generation result failed, result is empty");

message!(ga_config(config: &str),
    zh: "GA 生成配置. config: {config}",
    en: "Ga Pair generate config. config: {config}");

message!(process_file_pair_config(config: &str),
    zh: "处理分块配置: {config}",
    en: "Process file_pair config: {config}");

message!(start_file_pair(id: &str),
    zh: "开始处理分块 id: {id}",
    en: "Start process file_pair id: {id}");

message!(end_file_pair(id: &str),
    zh: "结束处理分块 id: {id}",
    en: "End process file_pair id: {id}");

message!(process_file_pair_failed(file_pair_id: &str, error: &str),
    zh: "处理分块失败, file_pair_id: {file_pair_id}, error: {error}",
    en: "Process file_pair failed, file_pair_id: {file_pair_id}, error: {error}");

message!(start_question_by_ga(ga: &str, prompt: &str),
    zh: "开始通过 GA 调用大模型生成问题. ga_info: {ga}, prompt: {prompt}",
    en: "Start LLM generator question by GA. ga_info: {ga}, prompt: {prompt}");

message!(start_question(prompt: &str),
    zh: "开始调用大模型生成问题. prompt: {prompt}",
    en: "Start LLM generator question. prompt: {prompt}");

message!(end_question(result: &str),
    zh: "结束调用大模型生成问题. result={result}",
    en: "End LLM generator question. result={result}");

message!(start_label_question(prompt: &str),
    zh: "开始通过标签重建问题. prompt: {prompt}",
    en: "Start LLM rebuild question by label. prompt: {prompt}");

message!(end_label_question(result: &str),
    zh: "结束通过标签重建问题. result: {result}",
    en: "End LLM rebuild question by label. result: {result}");

message!(process_dataset_config(config: &str),
    zh: "处理数据集生成配置: {config}",
    en: "Process dataset generator config: {config}");

message!(start_process_question(id: &str),
    zh: "开始处理问题. question_id: {id}",
    en: "Start process question. question_id: {id}");

message!(end_process_question(id: &str),
    zh: "结束处理问题. question_id: {id}",
    en: "End process question. question_id: {id}");

message!(process_question_failed(question_id: &str, error: &str),
    zh: "处理问题失败, question_id: {question_id}, error: {error}",
    en: "Process question failed, question_id: {question_id}, error: {error}");

message!(use_mga_prompt(),
    zh: "使用 MGA 增强提示词生成答案",
    en: "Use MGA to enhance prompt words to generate answers");

message!(use_standard_prompt(),
    zh: "使用标准提示词生成答案",
    en: "Generate answers using standard prompt words");

message!(start_generate_dataset(prompt: &str),
    zh: "开始调用大模型生成数据集, prompt: {prompt}",
    en: "Start LLM generator dataset, prompt: {prompt}");

message!(end_generate_dataset(result: &str),
    zh: "结束调用大模型生成数据集. result={result}",
    en: "End LLM generator dataset. result={result}");

message!(process_file_delete_config(file_name: &str),
    zh: "处理文件删除配置, file_name: {file_name}",
    en: "Process file delete config, file_name: {file_name}");

message!(model_not_configured(),
    zh: "错误: 未找到模型配置",
    en: "Error: model config not found");

// ---- validation and orchestration

message!(validation_failed(param: &str),
    zh: "参数校验失败. {param}",
    en: "Parameter verification failed. {param}");

message!(dataset_version_not_found(id: &str),
    zh: "数据集版本不存在. id: {id}",
    en: "Dataset version not found. id: {id}");

message!(finetune_config_not_found(id: &str),
    zh: "微调配置不存在. id: {id}",
    en: "FinetuneConfig not found. id: {id}");

message!(machine_not_found(id: &str),
    zh: "机器不存在. id: {id}",
    en: "Machine not found. id: {id}");

message!(deepspeed_required(),
    zh: "单机多卡或者多机的场景下, 必须选择 DeepSpeed 配置",
    en: "In cases of single machine with multiple cards or multiple machines, the DeepSpeed configuration must be chosen");

message!(finetune_job_not_found(id: &str),
    zh: "微调任务不存在. id: {id}",
    en: "Finetune job not found. id: {id}");

message!(only_init_can_start(),
    zh: "只支持启动 Init 状态的微调任务",
    en: "Only support start Init status finetune job");

message!(only_starting_can_cancel(),
    zh: "只支持取消 Starting 状态的微调任务",
    en: "Only support cancel Starting status finetune job");

message!(machine_connect_failed(error: &str),
    zh: "机器连接测试失败. error: {error}",
    en: "Machine connection test failed. error: {error}");

message!(connection_failed_too_often(),
    zh: "机器连续连接失败超过 10 次, 微调终止",
    en: "Machine connection has failed more than 10 times in a row, fine-tuning terminated");

message!(start_finetune_failed(exit_code: i32, error: &str),
    zh: "启动微调任务失败. exit_code: {exit_code}, error: {error}",
    en: "Start finetune job failed. exit_code: {exit_code}, error: {error}");

message!(cluster_not_found(id: &str),
    zh: "部署集群不存在. id: {id}",
    en: "Deploy cluster not found. id: {id}");

message!(cluster_busy(),
    zh: "不能操作 Deploying 或 Starting 状态的部署集群",
    en: "Can not operate Deploying or Starting status deploy cluster");

message!(only_starting_cluster(),
    zh: "只支持 Starting 状态的部署集群",
    en: "Only support Starting status deploy cluster");

message!(deploy_failed(error: &str),
    zh: "通过 vllm 和 ray 部署模型失败. error: {error}",
    en: "Deploy LLM by vllm and ray failed. error: {error}");

message!(start_deploy_failed(exit_code: i32, error: &str),
    zh: "启动部署任务失败. exit_code: {exit_code}, error: {error}",
    en: "Start deploy job failed. exit_code: {exit_code}, error: {error}");

message!(stop_cluster_failed(error: &str),
    zh: "停止部署集群服务失败. error: {error}",
    en: "Stop deploy cluster service failed. error: {error}");

message!(lora_busy(),
    zh: "不能删除 Deploying 或 Starting 状态的 lora 适配器",
    en: "Can not delete Deploying or Starting status lora adaptor");

message!(lora_not_found(id: &str),
    zh: "lora 适配器不存在. id: {id}",
    en: "Lora adaptor not found. id: {id}");

message!(request_remote_failed(path: &str, ip: &str, status: u16, body: &str),
    zh: "请求远程机器 {path} 失败. ip: {ip}, port: 8000, status_code: {status}, error_info: {body}",
    en: "Request {path} to remote machine failed. ip: {ip}, port: 8000, status_code: {status}, error_info: {body}");

message!(write_file_failed(error: &str),
    zh: "写入文件时发生 I/O 错误. error: {error}",
    en: "I/O error occurred while writing file. error: {error}");

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
