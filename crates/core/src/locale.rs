// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locale selection for user-facing text and prompt variants.
//!
//! Background tasks must carry the locale explicitly — it is captured when a
//! job is created, never read from any ambient request context.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Zh,
    En,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::Zh
    }
}

crate::simple_display! {
    Locale {
        Zh => "zh",
        En => "en",
    }
}
