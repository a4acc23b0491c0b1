// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable sync queue.
//!
//! Thin layer over [`Store`] that stamps new records, keeps FIFO order and
//! owns the status transitions a drain performs. Every mutation is written
//! through before it returns.

use std::sync::Arc;

use mes_core::clock::Timestamper;
use mes_core::{
    ClockSource, Entity, OperationKind, RecordId, StatusCounts, Store, SyncRecord, SyncStatus,
};
use serde_json::Value;
use tokio::sync::Notify;

/// FIFO queue of pending mutations backed by the local store.
pub struct SyncQueue {
    store: Arc<Store>,
    timestamper: Timestamper,
    enqueued: Arc<Notify>,
}

impl SyncQueue {
    /// Creates a queue over `store` using the system clock.
    pub fn new(store: Arc<Store>) -> Self {
        SyncQueue {
            store,
            timestamper: Timestamper::default(),
            enqueued: Arc::new(Notify::new()),
        }
    }

    /// Creates a queue that stamps records from `clock`.
    pub fn with_clock(store: Arc<Store>, clock: Arc<dyn ClockSource>) -> Self {
        SyncQueue {
            store,
            timestamper: Timestamper::new(clock),
            enqueued: Arc::new(Notify::new()),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Appends a new pending record and returns its id.
    ///
    /// The record is durable when this returns. Any running trigger manager
    /// is woken so an online client drains right away.
    pub fn enqueue(
        &self,
        operation: OperationKind,
        entity: Entity,
        payload: Value,
    ) -> mes_core::Result<RecordId> {
        let record = SyncRecord::new(self.timestamper.next(), operation, entity, payload);
        self.store.put_record(&record)?;
        tracing::debug!(
            id = %record.id,
            operation = %record.operation,
            entity = %record.entity,
            "enqueued sync record"
        );
        self.enqueued.notify_one();
        Ok(record.id)
    }

    /// Signal fired after every successful enqueue.
    pub(crate) fn enqueue_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.enqueued)
    }

    /// Returns pending records, oldest first.
    pub fn pending_records(&self) -> mes_core::Result<Vec<SyncRecord>> {
        self.store.records_by_status(SyncStatus::Pending)
    }

    /// Returns records parked after exhausting their retries, oldest first.
    pub fn failed_records(&self) -> mes_core::Result<Vec<SyncRecord>> {
        self.store.records_by_status(SyncStatus::Failed)
    }

    /// Returns records in `status`, or every record when `None`.
    pub fn records(&self, status: Option<SyncStatus>) -> mes_core::Result<Vec<SyncRecord>> {
        match status {
            Some(status) => self.store.records_by_status(status),
            None => self.store.all_records(),
        }
    }

    pub fn get(&self, id: &RecordId) -> mes_core::Result<Option<SyncRecord>> {
        self.store.get_record(id)
    }

    pub fn status_counts(&self) -> mes_core::Result<StatusCounts> {
        self.store.status_counts()
    }

    /// Claims a pending record for delivery.
    ///
    /// Returns false if the record is gone or no longer pending.
    pub fn mark_syncing(&self, id: &RecordId) -> mes_core::Result<bool> {
        self.store
            .transition_status(id, SyncStatus::Pending, SyncStatus::Syncing)
    }

    /// Returns a claimed record to pending without touching its retry
    /// count. Returns false if the record is gone or no longer syncing.
    pub fn release_claim(&self, id: &RecordId) -> mes_core::Result<bool> {
        self.store
            .transition_status(id, SyncStatus::Syncing, SyncStatus::Pending)
    }

    /// Removes a delivered record.
    pub fn mark_success(&self, id: &RecordId) -> mes_core::Result<()> {
        if !self.store.delete_record(id)? {
            tracing::warn!(%id, "delivered record was already removed");
        }
        Ok(())
    }

    /// Returns a record to pending after a failed attempt.
    pub fn mark_retry(&self, id: &RecordId, error: &str) -> mes_core::Result<SyncRecord> {
        self.store.update_record(id, |record| {
            record.status = SyncStatus::Pending;
            record.retry_count += 1;
            record.last_error = Some(error.to_string());
        })
    }

    /// Parks a record that has exhausted its retries.
    pub fn mark_failed(&self, id: &RecordId, error: &str) -> mes_core::Result<SyncRecord> {
        self.store.update_record(id, |record| {
            record.status = SyncStatus::Failed;
            record.retry_count += 1;
            record.last_error = Some(error.to_string());
        })
    }

    /// Returns records left `Syncing` by an interrupted process to pending.
    ///
    /// Every `Syncing` record is reset, including ones a live drain in
    /// another process still holds. Callers must own the store exclusively.
    pub fn recover_interrupted(&self) -> mes_core::Result<usize> {
        let n = self
            .store
            .reset_status(SyncStatus::Syncing, SyncStatus::Pending)?;
        if n > 0 {
            tracing::info!(count = n, "recovered interrupted sync records");
        }
        Ok(n)
    }
}
