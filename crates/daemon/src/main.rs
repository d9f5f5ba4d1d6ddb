// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tfd: the tuneforge daemon.
//!
//! Wires the snapshot store, the job manager with its six handlers, and the
//! fine-tune orchestrator; recovers in-flight work from the snapshot; runs
//! until interrupted.

mod env;

use env::Config;
use std::sync::Arc;
use tf_core::SystemClock;
use tf_engine::{
    register_default_handlers, EngineConfig, FinetuneService, JobManager, StoreChatClient,
};
use tf_remote::SshFactory;
use tf_storage::Store;
use tracing::info;

fn init_tracing(config: &Config) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.state_dir, "tfd.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let default_filter = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.dataset_version_dir)?;
    std::fs::create_dir_all(&config.finetune_local_dir)?;
    let _guard = init_tracing(&config);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let clock = SystemClock;
    let store = Store::open(config.state_file(), clock.clone())?;
    let engine_config: EngineConfig = config.engine();

    let llm = Arc::new(StoreChatClient::new(store.clone()));
    let manager = Arc::new(JobManager::new(store.clone(), llm, clock.clone()));
    register_default_handlers(manager.as_ref());

    let finetune = FinetuneService::new(
        store.clone(),
        Arc::new(SshFactory),
        engine_config,
        clock,
    );

    // Crash recovery: half-finished jobs re-run (handlers are idempotent),
    // and every Starting fine-tune job gets its watchers back.
    manager.load_running_jobs();
    let watchers = finetune.recover();
    info!(watchers, "tfd started");

    let runner = Arc::clone(&manager);
    let manager_task = tokio::spawn(async move { runner.run().await });

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    manager.stop();
    let _ = manager_task.await;
    Ok(())
}
