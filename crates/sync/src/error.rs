// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by the sync subsystem itself.
///
/// Per-record remote failures are not errors at this level; the engine turns
/// them into status transitions (see [`crate::DispatchError`]).
#[derive(Debug, Error)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] mes_core::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("http client error: {0}")]
    HttpClient(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, Error>;
