// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership and lifecycle metadata shared by every persistent entity.

use serde::{Deserialize, Serialize};

/// The acting user on whose behalf an operation runs.
///
/// Background tasks carry an `Actor` captured at creation time so they can
/// keep reading and writing rows after the originating request is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub group_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), group_id: group_id.into() }
    }
}

/// Ownership, timestamps, and the soft-delete marker.
///
/// `is_deleted` is zero for live rows and the deletion epoch otherwise;
/// readers filter on it, writers never hard-delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub user_id: String,
    pub group_id: String,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default)]
    pub is_deleted: u64,
}

impl Meta {
    pub fn new(actor: &Actor, now: u64) -> Self {
        Self {
            user_id: actor.user_id.clone(),
            group_id: actor.group_id.clone(),
            created_at: now,
            updated_at: now,
            is_deleted: 0,
        }
    }

    /// Refresh `updated_at`; every write path goes through this.
    pub fn touch(&mut self, now: u64) {
        self.updated_at = now;
    }

    /// Mark the row deleted at `now`.
    pub fn soft_delete(&mut self, now: u64) {
        self.is_deleted = now;
        self.updated_at = now;
    }

    pub fn is_live(&self) -> bool {
        self.is_deleted == 0
    }

    pub fn owned_by(&self, actor: &Actor) -> bool {
        self.group_id == actor.group_id
    }

    pub fn actor(&self) -> Actor {
        Actor { user_id: self.user_id.clone(), group_id: self.group_id.clone() }
    }
}

/// Uniform access to an entity's identity and metadata.
///
/// Implemented via [`crate::record_impl!`] for every stored type so the
/// storage layer can apply group and live-only filtering generically.
pub trait Record {
    fn id_str(&self) -> &str;
    fn meta(&self) -> &Meta;
    fn meta_mut(&mut self) -> &mut Meta;

    /// Visible to `actor`: same group and not soft-deleted.
    fn visible_to(&self, actor: &Actor) -> bool {
        self.meta().is_live() && self.meta().owned_by(actor)
    }
}

#[cfg(test)]
#[path = "meta_tests.rs"]
mod tests;
