// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-lived sync loop.
//!
//! Holds an exclusive lock next to the store so only one loop drains a
//! given store, then runs the trigger manager until Ctrl-C.

use std::sync::Arc;

use mes_sync::{
    spawn_drain, Dispatcher, HttpRemote, NetworkState, SyncEngine, TriggerManager, TriggerReason,
};

use crate::cli::GlobalArgs;
use crate::error::{Error, Result};
use crate::settings;

use super::{open_locked_queue, runtime};

pub fn run(global: &GlobalArgs) -> Result<()> {
    let config = settings::load(global)?;
    let db_path = config.resolved_db_path();
    let (queue, _lock) = open_locked_queue(&config)?;

    let remote = HttpRemote::new(&config)?;
    let engine = Arc::new(
        SyncEngine::new(queue, Dispatcher::new(remote), NetworkState::new(true))
            .with_max_retries(config.max_retries),
    );

    tracing::info!(
        db = %db_path.display(),
        remote = %config.api_base_url,
        "mes-sync starting"
    );

    runtime()?.block_on(async {
        let triggers = TriggerManager::start(Arc::clone(&engine), config.sync_interval())?;
        // Flush whatever an earlier session left behind
        spawn_drain(&engine, TriggerReason::Manual);

        tokio::signal::ctrl_c().await?;
        tracing::info!("interrupt received, shutting down");
        triggers.shutdown().await;
        Ok::<(), Error>(())
    })?;

    tracing::info!("mes-sync stopped");
    Ok(())
}
