// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tf_core::test_support::{actor, NOW};
use tf_core::{DatasetId, FakeClock, FileId, FilePairId, QuestionId};

struct Fixture {
    svc: DatasetVersionService<FakeClock>,
    store: Store<FakeClock>,
    project_id: ProjectId,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let clock = FakeClock::new();
    clock.set_epoch_secs(NOW);
    let store = Store::in_memory(clock.clone());
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig {
        dataset_version_dir: dir.path().to_path_buf(),
        finetune_local_dir: dir.path().to_path_buf(),
    };
    let project_id = store
        .create_project(tf_core::Project::new(&actor(), "p", NOW))
        .unwrap()
        .id;
    Fixture { svc: DatasetVersionService::new(store.clone(), config, clock), store, project_id, _dir: dir }
}

impl Fixture {
    fn seed_dataset(&self, question: &str, answer: &str, cot: &str) -> DatasetId {
        self.store
            .create_dataset(Dataset {
                id: DatasetId::new(),
                meta: Meta::new(&actor(), NOW),
                project_id: self.project_id.clone(),
                file_id: FileId::from_string("fil-1"),
                file_pair_id: FilePairId::from_string("fpr-1"),
                question_id: QuestionId::new(),
                question: question.to_string(),
                answer: answer.to_string(),
                cot: cot.to_string(),
                tag_name: String::new(),
                model: "m".to_string(),
                confirmed: false,
                ga_pair: None,
            })
            .unwrap()
            .id
    }

    fn create(&self, ids: Vec<DatasetId>, output_with_cot: bool) -> DatasetVersion {
        self.svc
            .create(
                &actor(),
                DatasetVersionCreate {
                    project_id: self.project_id.clone(),
                    name: "v1".into(),
                    description: String::new(),
                    dataset_type: TrainStage::Sft,
                    dataset_id_list: ids,
                    options: DatasetVersionOptions { output_with_cot },
                },
                Locale::En,
            )
            .unwrap()
    }
}

#[test]
fn materialized_records_round_trip() {
    let fx = fixture();
    let ids = vec![
        fx.seed_dataset("2+2?", "4", ""),
        fx.seed_dataset("cap of France?", "Paris", ""),
    ];
    let version = fx.create(ids, false);

    let records = read_records(&fx.svc.version_path(&version.id)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], SftRecord {
        instruction: "2+2?".into(),
        input: String::new(),
        output: "4".into(),
    });
    assert_eq!(records[1].output, "Paris");
}

#[test]
fn cot_is_wrapped_when_configured() {
    let fx = fixture();
    let ids = vec![fx.seed_dataset("why?", "because", "step 1")];
    let version = fx.create(ids, true);

    let records = read_records(&fx.svc.version_path(&version.id)).unwrap();
    assert_eq!(records[0].output, "<think>step 1<\\think>\nbecause");
}

#[test]
fn cot_option_without_a_chain_leaves_the_answer_bare() {
    let fx = fixture();
    let ids = vec![fx.seed_dataset("q", "a", "")];
    let version = fx.create(ids, true);

    let records = read_records(&fx.svc.version_path(&version.id)).unwrap();
    assert_eq!(records[0].output, "a");
}

#[test]
fn non_sft_stages_are_rejected() {
    let fx = fixture();
    let err = fx
        .svc
        .create(
            &actor(),
            DatasetVersionCreate {
                project_id: fx.project_id.clone(),
                name: "v".into(),
                description: String::new(),
                dataset_type: TrainStage::Dpo,
                dataset_id_list: vec![],
                options: DatasetVersionOptions::default(),
            },
            Locale::En,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn delete_removes_the_row_and_the_file() {
    let fx = fixture();
    let ids = vec![fx.seed_dataset("q", "a", "")];
    let version = fx.create(ids, false);
    let path = fx.svc.version_path(&version.id);
    assert!(path.exists());

    fx.svc.delete(&actor(), &version.id).unwrap();
    assert!(!path.exists());
    assert!(fx.store.get_dataset_version(&actor(), &version.id).is_err());
}
