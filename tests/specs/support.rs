// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared wiring for the end-to-end scenarios.

use std::sync::Arc;
use tf_core::test_support::NOW;
use tf_core::FakeClock;
use tf_llm::FakeChatClient;
use tf_storage::Store;

pub struct World {
    pub store: Store<FakeClock>,
    pub clock: FakeClock,
    pub llm: Arc<FakeChatClient>,
    pub hosts: Arc<tf_remote::FakeHostFactory>,
    pub dirs: tempfile::TempDir,
}

pub fn world() -> World {
    let clock = FakeClock::new();
    clock.set_epoch_secs(NOW);
    let store = Store::in_memory(clock.clone());
    World {
        store,
        clock,
        llm: Arc::new(FakeChatClient::new()),
        hosts: Arc::new(tf_remote::FakeHostFactory::new()),
        dirs: tempfile::tempdir().expect("tempdir"),
    }
}

impl World {
    pub fn engine_config(&self) -> tf_engine::EngineConfig {
        tf_engine::EngineConfig {
            dataset_version_dir: self.dirs.path().to_path_buf(),
            finetune_local_dir: self.dirs.path().join("local"),
        }
    }
}
