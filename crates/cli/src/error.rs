// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors reported by the `mes-sync` command line.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] mes_core::Error),

    #[error(transparent)]
    Sync(#[from] mes_sync::Error),

    #[error("invalid payload: {0}\n  hint: the payload must be a JSON object, e.g. '{{\"id\": 42}}'")]
    InvalidPayload(String),

    #[error("another mes-sync process holds {0}\n  hint: wait for the running drain, or stop 'mes-sync run' first")]
    AlreadyRunning(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
