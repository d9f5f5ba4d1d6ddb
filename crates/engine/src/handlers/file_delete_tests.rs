// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::super::test_support::fixture;
use super::*;
use tf_core::test_support::actor;
use tf_core::{FileDeleteRequest, FileSnapshot, TocBuildAction};

#[tokio::test]
async fn catalog_is_deleted_only_after_the_llm_call() {
    let fx = fixture();
    let file = fx.seed_file("gone.md", "# Gone\n");
    fx.seed_catalog(&file, r#"[{"level":1,"title":"Gone"}]"#);
    fx.store.create_tag(&actor(), &fx.project_id, "old", None).unwrap();
    fx.llm.push_json(serde_json::json!([{"label": "fresh", "child": []}]));

    let job = fx.job(JobRequest::FileDeleteGenerator(FileDeleteRequest {
        file: FileSnapshot {
            id: file.id.clone(),
            file_name: file.file_name.clone(),
            content: file.content.clone(),
        },
        toc_build_action: TocBuildAction::Revise,
    }));
    let result = FileDeleteGenerator.execute(&fx.ctx, &job).await.unwrap();

    assert_eq!(result.done_count(), 1);
    // The prompt saw the pre-deletion catalog.
    let prompts = fx.llm.prompts();
    assert!(prompts[0].contains("Gone"));
    // And the catalog rows are gone afterwards.
    assert!(fx.store.list_catalogs(&actor(), &fx.project_id).is_empty());
}

#[tokio::test]
async fn deleted_toc_is_passed_as_removed_content() {
    let fx = fixture();
    let file = fx.seed_file("gone.md", "# Removed Heading\n");
    fx.store.create_tag(&actor(), &fx.project_id, "existing", None).unwrap();
    fx.llm.push_json(serde_json::json!([{"label": "existing", "child": []}]));

    let job = fx.job(JobRequest::FileDeleteGenerator(FileDeleteRequest {
        file: FileSnapshot {
            id: file.id.clone(),
            file_name: file.file_name.clone(),
            content: file.content.clone(),
        },
        toc_build_action: TocBuildAction::Revise,
    }));
    FileDeleteGenerator.execute(&fx.ctx, &job).await.unwrap();

    let prompts = fx.llm.prompts();
    assert!(prompts[0].contains("Removed Heading"));
}
