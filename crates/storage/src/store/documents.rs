// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The document graph: projects, files, chunks, GA pairs, questions,
//! datasets, tags, catalogs, and dataset versions.
//!
//! Bulk deletes are per-relation soft deletes; there is no cascade
//! primitive. The tag-regeneration leg of a file deletion is a job, driven
//! by the engine, not by storage.

use super::{get_row, get_row_mut, stamp_new, visible, Store};
use crate::error::StorageError;
use tf_core::{
    Actor, Catalog, Clock, Dataset, DatasetId, DatasetVersion, DatasetVersionId, FileId, FilePair,
    FilePairId, GaPair, Project, ProjectId, Question, QuestionId, Record, SourceFile, Tag, TagId,
};

impl<C: Clock> Store<C> {
    // ---- projects

    pub fn create_project(&self, project: Project) -> Result<Project, StorageError> {
        self.mutate(|state, now| {
            let mut project = project;
            stamp_new(&mut project, now);
            state.projects.insert(project.id.to_string(), project.clone());
            Ok(project)
        })
    }

    pub fn get_project(&self, actor: &Actor, id: &ProjectId) -> Result<Project, StorageError> {
        self.read(|state| get_row(&state.projects, actor, "Project", id).cloned())
    }

    // ---- files

    pub fn create_file(&self, file: SourceFile) -> Result<SourceFile, StorageError> {
        self.mutate(|state, now| {
            let mut file = file;
            stamp_new(&mut file, now);
            state.files.insert(file.id.to_string(), file.clone());
            Ok(file)
        })
    }

    pub fn get_file(&self, actor: &Actor, id: &FileId) -> Result<SourceFile, StorageError> {
        self.read(|state| get_row(&state.files, actor, "File", id).cloned())
    }

    pub fn list_files(&self, actor: &Actor, project_id: &ProjectId) -> Vec<SourceFile> {
        self.read(|state| {
            let mut files: Vec<SourceFile> = visible(&state.files, actor)
                .filter(|f| &f.project_id == project_id)
                .cloned()
                .collect();
            files.sort_by_key(|f| f.meta.created_at);
            files
        })
    }

    pub fn delete_file(&self, actor: &Actor, id: &FileId) -> Result<SourceFile, StorageError> {
        self.mutate(|state, now| {
            let file = get_row_mut(&mut state.files, actor, "File", id)?;
            file.meta.soft_delete(now);
            Ok(file.clone())
        })
    }

    // ---- file pairs

    pub fn bulk_create_file_pairs(
        &self,
        pairs: Vec<FilePair>,
    ) -> Result<Vec<FilePair>, StorageError> {
        self.mutate(|state, now| {
            let mut created = Vec::with_capacity(pairs.len());
            for mut pair in pairs {
                stamp_new(&mut pair, now);
                state.file_pairs.insert(pair.id.to_string(), pair.clone());
                created.push(pair);
            }
            Ok(created)
        })
    }

    pub fn get_file_pair(&self, actor: &Actor, id: &FilePairId) -> Result<FilePair, StorageError> {
        self.read(|state| get_row(&state.file_pairs, actor, "File pair", id).cloned())
    }

    pub fn list_file_pairs(&self, actor: &Actor, file_id: &FileId) -> Vec<FilePair> {
        self.read(|state| {
            let mut pairs: Vec<FilePair> = visible(&state.file_pairs, actor)
                .filter(|p| &p.file_id == file_id)
                .cloned()
                .collect();
            pairs.sort_by_key(|p| p.chunk_index);
            pairs
        })
    }

    pub fn bulk_delete_file_pairs(
        &self,
        actor: &Actor,
        file_ids: &[FileId],
    ) -> Result<usize, StorageError> {
        self.mutate(|state, now| {
            Ok(soft_delete_where(&mut state.file_pairs, now, |p: &FilePair| {
                p.meta.owned_by(actor) && file_ids.contains(&p.file_id)
            }))
        })
    }

    // ---- GA pairs

    pub fn list_ga_pairs(&self, actor: &Actor, file_id: &FileId, enabled_only: bool) -> Vec<GaPair> {
        self.read(|state| {
            let mut pairs: Vec<GaPair> = visible(&state.ga_pairs, actor)
                .filter(|g| &g.file_id == file_id)
                .filter(|g| !enabled_only || g.enable)
                .cloned()
                .collect();
            pairs.sort_by_key(|g| g.meta.created_at);
            pairs
        })
    }

    pub fn bulk_create_ga_pairs(
        &self,
        pairs: Vec<GaPair>,
    ) -> Result<Vec<GaPair>, StorageError> {
        self.mutate(|state, now| {
            let mut created = Vec::with_capacity(pairs.len());
            for mut pair in pairs {
                stamp_new(&mut pair, now);
                state.ga_pairs.insert(pair.id.to_string(), pair.clone());
                created.push(pair);
            }
            Ok(created)
        })
    }

    pub fn bulk_delete_ga_pairs(
        &self,
        actor: &Actor,
        file_ids: &[FileId],
    ) -> Result<usize, StorageError> {
        self.mutate(|state, now| {
            Ok(soft_delete_where(&mut state.ga_pairs, now, |g: &GaPair| {
                g.meta.owned_by(actor) && file_ids.contains(&g.file_id)
            }))
        })
    }

    // ---- questions

    pub fn bulk_create_questions(
        &self,
        questions: Vec<Question>,
    ) -> Result<Vec<Question>, StorageError> {
        self.mutate(|state, now| {
            let mut created = Vec::with_capacity(questions.len());
            for mut question in questions {
                stamp_new(&mut question, now);
                // Back-reference on the owning chunk.
                if let Some(pair) = state.file_pairs.get_mut(question.file_pair_id.as_str()) {
                    pair.question_id_list.push(question.id.clone());
                    pair.meta.touch(now);
                }
                state.questions.insert(question.id.to_string(), question.clone());
                created.push(question);
            }
            Ok(created)
        })
    }

    pub fn get_question(&self, actor: &Actor, id: &QuestionId) -> Result<Question, StorageError> {
        self.read(|state| get_row(&state.questions, actor, "Question", id).cloned())
    }

    pub fn list_questions(&self, actor: &Actor, project_id: &ProjectId) -> Vec<Question> {
        self.read(|state| {
            let mut questions: Vec<Question> = visible(&state.questions, actor)
                .filter(|q| &q.project_id == project_id)
                .cloned()
                .collect();
            questions.sort_by_key(|q| q.meta.created_at);
            questions
        })
    }

    pub fn questions_for_file_pair(&self, actor: &Actor, file_pair_id: &FilePairId) -> Vec<Question> {
        self.read(|state| {
            visible(&state.questions, actor)
                .filter(|q| &q.file_pair_id == file_pair_id)
                .cloned()
                .collect()
        })
    }

    /// Soft-delete questions by question id.
    pub fn bulk_delete_questions(
        &self,
        actor: &Actor,
        ids: &[QuestionId],
    ) -> Result<usize, StorageError> {
        self.mutate(|state, now| {
            Ok(soft_delete_where(&mut state.questions, now, |q: &Question| {
                q.meta.owned_by(actor) && ids.contains(&q.id)
            }))
        })
    }

    pub fn bulk_delete_questions_by_files(
        &self,
        actor: &Actor,
        file_ids: &[FileId],
    ) -> Result<usize, StorageError> {
        self.mutate(|state, now| {
            Ok(soft_delete_where(&mut state.questions, now, |q: &Question| {
                q.meta.owned_by(actor) && file_ids.contains(&q.file_id)
            }))
        })
    }

    pub fn set_question_has_dataset(
        &self,
        actor: &Actor,
        id: &QuestionId,
        has_dataset: bool,
    ) -> Result<Question, StorageError> {
        self.mutate(|state, now| {
            let question = get_row_mut(&mut state.questions, actor, "Question", id)?;
            question.has_dataset = has_dataset;
            question.meta.touch(now);
            Ok(question.clone())
        })
    }

    // ---- datasets

    pub fn create_dataset(&self, dataset: Dataset) -> Result<Dataset, StorageError> {
        self.mutate(|state, now| {
            let mut dataset = dataset;
            stamp_new(&mut dataset, now);
            state.datasets.insert(dataset.id.to_string(), dataset.clone());
            Ok(dataset)
        })
    }

    /// Fetch datasets in the order of `ids`, skipping missing rows.
    pub fn datasets_by_ids(&self, actor: &Actor, ids: &[DatasetId]) -> Vec<Dataset> {
        self.read(|state| {
            ids.iter()
                .filter_map(|id| state.datasets.get(id.as_str()))
                .filter(|d| d.visible_to(actor))
                .cloned()
                .collect()
        })
    }

    pub fn bulk_delete_datasets_by_files(
        &self,
        actor: &Actor,
        file_ids: &[FileId],
    ) -> Result<usize, StorageError> {
        self.mutate(|state, now| {
            Ok(soft_delete_where(&mut state.datasets, now, |d: &Dataset| {
                d.meta.owned_by(actor) && file_ids.contains(&d.file_id)
            }))
        })
    }

    // ---- tags

    pub fn list_tags(&self, actor: &Actor, project_id: &ProjectId) -> Vec<Tag> {
        self.read(|state| {
            let mut tags: Vec<Tag> = visible(&state.tags, actor)
                .filter(|t| &t.project_id == project_id)
                .cloned()
                .collect();
            tags.sort_by_key(|t| t.meta.created_at);
            tags
        })
    }

    /// Insert a tag, denormalizing the ancestor chain from its parent.
    pub fn create_tag(
        &self,
        actor: &Actor,
        project_id: &ProjectId,
        label: &str,
        parent_id: Option<&TagId>,
    ) -> Result<Tag, StorageError> {
        self.mutate(|state, now| {
            let root_ids = match parent_id {
                None => Vec::new(),
                Some(pid) => {
                    let parent = get_row(&state.tags, actor, "Parent tag", pid)?;
                    let mut chain = parent.root_ids.clone();
                    chain.push(parent.id.clone());
                    chain
                }
            };
            let tag = Tag {
                id: TagId::new(),
                meta: tf_core::Meta::new(actor, now),
                project_id: project_id.clone(),
                label: label.to_string(),
                parent_id: parent_id.cloned(),
                root_ids,
            };
            state.tags.insert(tag.id.to_string(), tag.clone());
            Ok(tag)
        })
    }

    pub fn bulk_delete_tags(
        &self,
        actor: &Actor,
        project_id: &ProjectId,
    ) -> Result<usize, StorageError> {
        self.mutate(|state, now| {
            Ok(soft_delete_where(&mut state.tags, now, |t: &Tag| {
                t.meta.owned_by(actor) && &t.project_id == project_id
            }))
        })
    }

    // ---- catalogs

    pub fn list_catalogs(&self, actor: &Actor, project_id: &ProjectId) -> Vec<Catalog> {
        self.read(|state| {
            let mut catalogs: Vec<Catalog> = visible(&state.catalogs, actor)
                .filter(|c| &c.project_id == project_id)
                .cloned()
                .collect();
            catalogs.sort_by_key(|c| c.meta.created_at);
            catalogs
        })
    }

    pub fn create_catalog(&self, catalog: Catalog) -> Result<Catalog, StorageError> {
        self.mutate(|state, now| {
            let mut catalog = catalog;
            stamp_new(&mut catalog, now);
            state.catalogs.insert(catalog.id.to_string(), catalog.clone());
            Ok(catalog)
        })
    }

    pub fn bulk_delete_catalogs(
        &self,
        actor: &Actor,
        file_ids: &[FileId],
    ) -> Result<usize, StorageError> {
        self.mutate(|state, now| {
            Ok(soft_delete_where(&mut state.catalogs, now, |c: &Catalog| {
                c.meta.owned_by(actor) && file_ids.contains(&c.file_id)
            }))
        })
    }

    // ---- dataset versions

    pub fn create_dataset_version(
        &self,
        version: DatasetVersion,
    ) -> Result<DatasetVersion, StorageError> {
        self.mutate(|state, now| {
            let mut version = version;
            stamp_new(&mut version, now);
            state.dataset_versions.insert(version.id.to_string(), version.clone());
            Ok(version)
        })
    }

    pub fn get_dataset_version(
        &self,
        actor: &Actor,
        id: &DatasetVersionId,
    ) -> Result<DatasetVersion, StorageError> {
        self.read(|state| get_row(&state.dataset_versions, actor, "Dataset version", id).cloned())
    }

    pub fn delete_dataset_version(
        &self,
        actor: &Actor,
        id: &DatasetVersionId,
    ) -> Result<DatasetVersion, StorageError> {
        self.mutate(|state, now| {
            let version = get_row_mut(&mut state.dataset_versions, actor, "Dataset version", id)?;
            version.meta.soft_delete(now);
            Ok(version.clone())
        })
    }
}

/// Soft-delete every live row matching `pred`; returns how many matched.
fn soft_delete_where<T: tf_core::Record>(
    map: &mut std::collections::HashMap<String, T>,
    now: u64,
    pred: impl Fn(&T) -> bool,
) -> usize {
    let mut count = 0;
    for row in map.values_mut() {
        if row.meta().is_live() && pred(row) {
            row.meta_mut().soft_delete(now);
            count += 1;
        }
    }
    count
}
