// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mes_core::Store;
use mes_sync::{SyncConfig, SyncQueue};

use crate::error::{Error, Result};

pub mod drain;
pub mod enqueue;
pub mod list;
pub mod recover;
pub mod run;
pub mod status;

/// Opens the configured store and wraps it in a queue.
pub fn open_queue(config: &SyncConfig) -> Result<Arc<SyncQueue>> {
    let store = Store::open(&config.resolved_db_path())?;
    Ok(Arc::new(SyncQueue::new(Arc::new(store))))
}

/// Returns the lock file guarding `db_path`.
pub fn lock_path(db_path: &Path) -> PathBuf {
    db_path.with_extension("lock")
}

/// Acquires an exclusive lock on the lock file.
pub fn acquire_lock(lock_path: &Path) -> Result<File> {
    use fs2::FileExt;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;

    // Non-blocking: a second writer fails fast
    file.try_lock_exclusive()
        .map_err(|_| Error::AlreadyRunning(lock_path.display().to_string()))?;

    Ok(file)
}

/// Opens the configured queue and takes the store's lock.
///
/// Commands that claim or reset records go through here, so a `recover`
/// never resets records a live drain is still delivering. Commands that only
/// enqueue or read skip the lock.
pub fn open_locked_queue(config: &SyncConfig) -> Result<(Arc<SyncQueue>, File)> {
    let queue = open_queue(config)?;
    let lock = acquire_lock(&lock_path(&config.resolved_db_path()))?;
    Ok((queue, lock))
}

/// Builds the tokio runtime for commands that talk to the remote.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| Error::Runtime(format!("tokio: {}", e)))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
