// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Failure classification for one chat call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Upstream throttling; the caller may try the item again later.
    #[error("requests are too frequent")]
    RateLimited,
    /// Transient network problem reaching the endpoint.
    #[error("connection error: {0}")]
    Connection(String),
    /// The endpoint answered with a non-2xx status.
    #[error("api call failed, status_code: {status}, message: {message}")]
    Api { status: u16, message: String },
    /// No default model configured, malformed response body, anything else.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}
