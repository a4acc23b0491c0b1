// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine: drains the queue against the remote.
//!
//! A drain takes a snapshot of pending records and delivers them one at a
//! time in queue order. Each record is claimed (`Pending -> Syncing`) before
//! its remote call and settled afterwards:
//!
//! - success: the record is deleted
//! - failure below the retry ceiling: back to `Pending`, retry count + 1
//! - failure at the ceiling: parked as `Failed`, retry count + 1
//!
//! Only one drain runs per engine at a time. Overlapping requests return
//! [`DrainOutcome::Skipped`] rather than queueing behind the running one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mes_core::SyncRecord;
use serde::Serialize;

use crate::dispatcher::{Dispatcher, Remote};
use crate::network::NetworkState;
use crate::observers::StatusObservers;
use crate::queue::SyncQueue;

/// Failed attempts tolerated before a record is parked.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Why a drain did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Offline,
    AlreadyRunning,
}

/// Per-record tallies of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Delivered and removed.
    pub synced: usize,
    /// Failed and returned to pending.
    pub retried: usize,
    /// Failed at the ceiling and parked.
    pub parked: usize,
    /// Claimed by someone else between snapshot and claim.
    pub skipped: usize,
}

impl DrainReport {
    pub fn attempted(&self) -> usize {
        self.synced + self.retried + self.parked
    }
}

/// Result of a drain request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed(DrainReport),
    Skipped(SkipReason),
}

/// Clears the in-progress flag and notifies observers when a drain ends,
/// including by error or cancellation.
struct DrainGuard<'a> {
    in_progress: &'a AtomicBool,
    observers: &'a StatusObservers,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.in_progress.store(false, Ordering::SeqCst);
        self.observers.publish(false);
    }
}

/// Delivers queued records through a dispatcher.
pub struct SyncEngine<R: Remote> {
    queue: Arc<SyncQueue>,
    dispatcher: Dispatcher<R>,
    network: NetworkState,
    observers: StatusObservers,
    in_progress: AtomicBool,
    max_retries: u32,
}

impl<R: Remote> SyncEngine<R> {
    pub fn new(queue: Arc<SyncQueue>, dispatcher: Dispatcher<R>, network: NetworkState) -> Self {
        SyncEngine {
            queue,
            dispatcher,
            network,
            observers: StatusObservers::new(),
            in_progress: AtomicBool::new(false),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Overrides the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn queue(&self) -> &Arc<SyncQueue> {
        &self.queue
    }

    pub fn network(&self) -> &NetworkState {
        &self.network
    }

    pub fn observers(&self) -> &StatusObservers {
        &self.observers
    }

    pub fn dispatcher(&self) -> &Dispatcher<R> {
        &self.dispatcher
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns true while a drain is running.
    pub fn is_syncing(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Drains pending records once.
    ///
    /// Returns an error only if the local store fails; remote failures are
    /// recorded on the affected records and counted in the report.
    pub async fn drain(&self) -> crate::Result<DrainOutcome> {
        if !self.network.is_online() {
            tracing::debug!("offline, skipping drain");
            return Ok(DrainOutcome::Skipped(SkipReason::Offline));
        }
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("drain already running");
            return Ok(DrainOutcome::Skipped(SkipReason::AlreadyRunning));
        }
        let _guard = DrainGuard {
            in_progress: &self.in_progress,
            observers: &self.observers,
        };
        self.observers.publish(true);

        let report = self.drain_pending().await.inspect_err(|e| {
            tracing::error!(error = %e, "drain aborted by store failure");
        })?;
        if report.attempted() > 0 {
            tracing::info!(
                synced = report.synced,
                retried = report.retried,
                parked = report.parked,
                "drain finished"
            );
        }
        Ok(DrainOutcome::Completed(report))
    }

    async fn drain_pending(&self) -> crate::Result<DrainReport> {
        let mut report = DrainReport::default();
        for record in self.queue.pending_records()? {
            if !self.queue.mark_syncing(&record.id)? {
                report.skipped += 1;
                continue;
            }
            if let Err(e) = self.deliver(&record, &mut report).await {
                self.release_claim(&record);
                return Err(e);
            }
        }
        Ok(report)
    }

    /// Returns a record this drain claimed but could not settle to pending,
    /// so the next trigger picks it up again.
    fn release_claim(&self, record: &SyncRecord) {
        match self.queue.release_claim(&record.id) {
            Ok(true) => {
                tracing::warn!(id = %record.id, "released claim after store failure");
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    id = %record.id,
                    error = %e,
                    "failed to release claim; record stays syncing until recovery"
                );
            }
        }
    }

    async fn deliver(&self, record: &SyncRecord, report: &mut DrainReport) -> crate::Result<()> {
        match self.dispatcher.dispatch(record).await {
            Ok(()) => {
                self.queue.mark_success(&record.id)?;
                report.synced += 1;
            }
            Err(e) if e.is_retryable() && record.retry_count < self.max_retries => {
                let updated = self.queue.mark_retry(&record.id, &e.to_string())?;
                tracing::warn!(
                    id = %record.id,
                    attempt = updated.retry_count,
                    error = %e,
                    "sync attempt failed, will retry"
                );
                report.retried += 1;
            }
            Err(e) => {
                self.queue.mark_failed(&record.id, &e.to_string())?;
                tracing::error!(
                    id = %record.id,
                    entity = %record.entity,
                    error = %e,
                    "sync record parked after exhausting retries"
                );
                report.parked += 1;
            }
        }
        Ok(())
    }
}
