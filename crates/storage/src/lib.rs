// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tf-storage: snapshot-persisted entity store.
//!
//! All state lives in one in-process [`State`] behind a `RwLock`; every
//! mutation rewrites the JSON snapshot on disk so a restarted process picks
//! up exactly where it left off. Reads filter by group and live-only; writes
//! refresh `updated_at`; deletion is always a soft-delete timestamp.

mod error;
mod snapshot;
mod state;
mod store;

pub use error::StorageError;
pub use snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
pub use state::State;
pub use store::{JobFilter, NodeSuccess, Store};
