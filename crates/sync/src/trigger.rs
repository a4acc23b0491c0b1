// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger manager: decides when the engine drains.
//!
//! Three event sources start a drain:
//!
//! - a record was enqueued while online
//! - the network went from offline to online
//! - the periodic timer fired while online and idle
//!
//! Drains are spawned fire-and-forget. A trigger that lands while a drain is
//! running is dropped by the engine's single-flight guard; the record waits
//! for the next trigger.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::dispatcher::Remote;
use crate::engine::{DrainOutcome, SyncEngine};

/// What caused a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    Enqueue,
    Reconnect,
    Periodic,
    Manual,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerReason::Enqueue => "enqueue",
            TriggerReason::Reconnect => "reconnect",
            TriggerReason::Periodic => "periodic",
            TriggerReason::Manual => "manual",
        };
        f.write_str(s)
    }
}

/// Starts a drain in the background and logs how it went.
pub fn spawn_drain<R>(engine: &Arc<SyncEngine<R>>, reason: TriggerReason) -> JoinHandle<()>
where
    R: Remote + 'static,
{
    let engine = Arc::clone(engine);
    tokio::spawn(async move {
        match engine.drain().await {
            Ok(DrainOutcome::Completed(report)) => {
                debug!(
                    %reason,
                    synced = report.synced,
                    retried = report.retried,
                    parked = report.parked,
                    "drain completed"
                );
            }
            Ok(DrainOutcome::Skipped(skip)) => {
                debug!(%reason, ?skip, "drain skipped");
            }
            Err(e) => {
                error!(%reason, error = %e, "drain failed");
            }
        }
    })
}

/// Background task wiring enqueue, network and timer events to the engine.
pub struct TriggerManager {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TriggerManager {
    /// Recovers records left `Syncing` by a previous run, then starts
    /// listening for triggers.
    ///
    /// Recovery resets every `Syncing` record, so the caller must be the
    /// only process draining this store. Must be called from within a
    /// tokio runtime.
    pub fn start<R>(engine: Arc<SyncEngine<R>>, period: Duration) -> crate::Result<Self>
    where
        R: Remote + 'static,
    {
        engine.queue().recover_interrupted()?;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_triggers(engine, period, cancel.clone()));
        info!(period_secs = period.as_secs(), "sync triggers started");
        Ok(TriggerManager { cancel, task })
    }

    /// Returns true until the trigger loop has exited.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Returns a token that stops the trigger loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops listening for triggers and waits for the loop to exit.
    ///
    /// A drain already in flight is not interrupted.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "trigger loop panicked");
        }
        info!("sync triggers stopped");
    }
}

async fn run_triggers<R>(engine: Arc<SyncEngine<R>>, period: Duration, cancel: CancellationToken)
where
    R: Remote + 'static,
{
    let enqueued = engine.queue().enqueue_signal();
    let mut network = engine.network().subscribe();
    let mut was_online = *network.borrow_and_update();

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = enqueued.notified() => {
                if engine.network().is_online() {
                    spawn_drain(&engine, TriggerReason::Enqueue);
                }
            }

            changed = network.changed() => {
                if changed.is_err() {
                    debug!("network state dropped, stopping triggers");
                    break;
                }
                let online = *network.borrow_and_update();
                if online && !was_online {
                    spawn_drain(&engine, TriggerReason::Reconnect);
                }
                was_online = online;
            }

            _ = ticker.tick() => {
                if engine.network().is_online() && !engine.is_syncing() {
                    spawn_drain(&engine, TriggerReason::Periodic);
                }
            }
        }
    }
}
