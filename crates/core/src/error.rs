// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for mes-core operations.

use thiserror::Error;

/// All possible errors that can occur in mes-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("storage write failed: {0}")]
    StorageWrite(String),

    #[error("sync record not found: {0}")]
    RecordNotFound(String),

    #[error("invalid operation kind: '{0}'\n  hint: valid kinds are: create, update, delete")]
    InvalidOperationKind(String),

    #[error(
        "invalid sync status: '{0}'\n  hint: valid statuses are: pending, syncing, success, failed"
    )]
    InvalidStatus(String),

    #[error("invalid entity tag: '{0}'\n  hint: tags are non-empty, e.g. WORK_ORDER or DEFECT")]
    InvalidEntity(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for mes-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
