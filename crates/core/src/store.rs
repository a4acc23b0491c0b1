// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed local durable store.
//!
//! The [`Store`] holds the sync queue (typed [`SyncRecord`] rows, indexed by
//! status and timestamp) and a set of last-write-wins cache collections that
//! mirror remote entities for offline rendering.
//!
//! Every operation runs in its own transaction on a single connection, so a
//! read-modify-write of one record is atomic with respect to other callers
//! sharing the store.

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use crate::clock::{ClockSource, SystemClock};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::record::{OperationKind, RecordId, SyncRecord, SyncStatus};

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 2;

/// Version 1: sync queue and work order cache.
const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS sync_queue (
    id TEXT PRIMARY KEY,
    timestamp INTEGER NOT NULL,
    operation TEXT NOT NULL,
    entity TEXT NOT NULL,
    resource TEXT,
    payload TEXT NOT NULL,
    retry_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    last_error TEXT
);

CREATE TABLE IF NOT EXISTS work_orders (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;

/// Version 2: production/procedure caches and queue indexes.
const SCHEMA_V2: &str = r#"
CREATE TABLE IF NOT EXISTS production_data (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS procedure_data (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sync_queue_status ON sync_queue(status);
CREATE INDEX IF NOT EXISTS idx_sync_queue_timestamp ON sync_queue(timestamp);
"#;

/// Additive migrations; entry `n` upgrades a store from version `n` to `n + 1`.
const MIGRATIONS: [&str; SCHEMA_VERSION as usize] = [SCHEMA_V1, SCHEMA_V2];

const RECORD_COLUMNS: &str =
    "id, timestamp, operation, entity, resource, payload, retry_count, status, last_error";

/// Cache collections mirroring remote entities.
///
/// The sync queue is not listed here; it has its own typed accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    WorkOrders,
    ProductionData,
    ProcedureData,
}

impl Collection {
    /// Returns the backing table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::WorkOrders => "work_orders",
            Collection::ProductionData => "production_data",
            Collection::ProcedureData => "procedure_data",
        }
    }

    pub fn all() -> [Collection; 3] {
        [
            Collection::WorkOrders,
            Collection::ProductionData,
            Collection::ProcedureData,
        ]
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of queued records per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub syncing: usize,
    pub success: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.syncing + self.success + self.failed
    }

    fn slot(&mut self, status: SyncStatus) -> &mut usize {
        match status {
            SyncStatus::Pending => &mut self.pending,
            SyncStatus::Syncing => &mut self.syncing,
            SyncStatus::Success => &mut self.success,
            SyncStatus::Failed => &mut self.failed,
        }
    }
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: FromStr>(value: &str, column: &str) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

fn record_from_row(row: &Row<'_>) -> std::result::Result<SyncRecord, rusqlite::Error> {
    let operation: String = row.get("operation")?;
    let entity: String = row.get("entity")?;
    let resource: Option<String> = row.get("resource")?;
    let payload: String = row.get("payload")?;
    let status: String = row.get("status")?;

    let entity = Entity::from_parts(&entity, resource.as_deref()).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let payload = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(SyncRecord {
        id: RecordId::from(row.get::<_, String>("id")?),
        timestamp: row.get("timestamp")?,
        operation: parse_db::<OperationKind>(&operation, "operation")?,
        entity,
        payload,
        retry_count: row.get("retry_count")?,
        status: parse_db::<SyncStatus>(&status, "status")?,
        last_error: row.get("last_error")?,
    })
}

fn write_err(e: rusqlite::Error) -> Error {
    Error::StorageWrite(e.to_string())
}

/// Run schema creation and all pending migrations on a connection.
///
/// Migrations are additive and applied once: a store at version `n` runs
/// every migration after `n`, then records [`SCHEMA_VERSION`].
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let current: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if current >= SCHEMA_VERSION {
        if current > SCHEMA_VERSION {
            tracing::warn!(
                "store schema version {} is newer than supported version {}",
                current,
                SCHEMA_VERSION
            );
        }
        return Ok(());
    }

    let tx = conn.transaction()?;
    for sql in MIGRATIONS.iter().skip(current.max(0) as usize) {
        tx.execute_batch(sql)?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    tracing::info!("upgraded store schema from version {} to {}", current, SCHEMA_VERSION);
    Ok(())
}

/// Local durable store.
pub struct Store {
    conn: Mutex<Connection>,
    clock: Box<dyn ClockSource>,
}

impl Store {
    /// Opens (or creates) the store at the given path.
    ///
    /// Idempotent: reopening an up-to-date store changes nothing.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::StorageUnavailable(format!("{}: {e}", parent.display())))?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::StorageUnavailable(format!("{}: {e}", path.display())))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        Self::init(conn)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        Self::init(conn)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        run_migrations(&mut conn).map_err(|e| Error::StorageUnavailable(e.to_string()))?;
        Ok(Store {
            conn: Mutex::new(conn),
            clock: Box::new(SystemClock),
        })
    }

    /// Replaces the clock used for cache `updated_at` stamps.
    pub fn with_clock(mut self, clock: impl ClockSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the schema version recorded in the store.
    pub fn schema_version(&self) -> Result<i32> {
        Ok(self
            .conn()
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cache collections
    // ─────────────────────────────────────────────────────────────────────────

    /// Upserts a cached value by key.
    pub fn put<T: Serialize>(&self, collection: Collection, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let sql = format!(
            "INSERT INTO {} (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            collection.as_str()
        );
        self.conn()
            .execute(&sql, params![key, json, self.clock.now_ms()])
            .map_err(write_err)?;
        Ok(())
    }

    /// Reads a cached value; `None` if the key is absent.
    pub fn get<T: DeserializeOwned>(&self, collection: Collection, key: &str) -> Result<Option<T>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?1", collection.as_str());
        let value: Option<String> = self
            .conn()
            .query_row(&sql, params![key], |row| row.get(0))
            .optional()?;
        value
            .map(|v| serde_json::from_str(&v).map_err(Error::from))
            .transpose()
    }

    /// Reads every cached value in a collection, ordered by key.
    pub fn get_all<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let sql = format!("SELECT value FROM {} ORDER BY key", collection.as_str());
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.iter()
            .map(|v| serde_json::from_str(v).map_err(Error::from))
            .collect()
    }

    /// Deletes a cached value. Returns true if it existed.
    pub fn delete(&self, collection: Collection, key: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", collection.as_str());
        let n = self.conn().execute(&sql, params![key]).map_err(write_err)?;
        Ok(n > 0)
    }

    /// Removes every value from a collection. Returns the number removed.
    pub fn clear(&self, collection: Collection) -> Result<usize> {
        let sql = format!("DELETE FROM {}", collection.as_str());
        self.conn().execute(&sql, []).map_err(write_err)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sync queue
    // ─────────────────────────────────────────────────────────────────────────

    /// Upserts a sync record by id.
    ///
    /// An update keeps the row's insertion position, which breaks ties
    /// between records sharing a timestamp.
    pub fn put_record(&self, record: &SyncRecord) -> Result<()> {
        let payload = serde_json::to_string(&record.payload)?;
        self.conn()
            .execute(
                "INSERT INTO sync_queue
                    (id, timestamp, operation, entity, resource, payload, retry_count, status, last_error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    timestamp = excluded.timestamp,
                    operation = excluded.operation,
                    entity = excluded.entity,
                    resource = excluded.resource,
                    payload = excluded.payload,
                    retry_count = excluded.retry_count,
                    status = excluded.status,
                    last_error = excluded.last_error",
                params![
                    record.id.as_str(),
                    record.timestamp,
                    record.operation.as_str(),
                    record.entity.tag(),
                    record.entity.resource_override(),
                    payload,
                    record.retry_count,
                    record.status.as_str(),
                    record.last_error,
                ],
            )
            .map_err(write_err)?;
        Ok(())
    }

    /// Reads one sync record; `None` if absent.
    pub fn get_record(&self, id: &RecordId) -> Result<Option<SyncRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM sync_queue WHERE id = ?1");
        Ok(self
            .conn()
            .query_row(&sql, params![id.as_str()], record_from_row)
            .optional()?)
    }

    /// Reads every sync record, oldest first.
    pub fn all_records(&self) -> Result<Vec<SyncRecord>> {
        let sql =
            format!("SELECT {RECORD_COLUMNS} FROM sync_queue ORDER BY timestamp ASC, rowid ASC");
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Reads the sync records with the given status, oldest first.
    pub fn records_by_status(&self, status: SyncStatus) -> Result<Vec<SyncRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM sync_queue WHERE status = ?1
             ORDER BY timestamp ASC, rowid ASC"
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![status.as_str()], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Deletes a sync record. Returns true if it existed.
    pub fn delete_record(&self, id: &RecordId) -> Result<bool> {
        let n = self
            .conn()
            .execute("DELETE FROM sync_queue WHERE id = ?1", params![id.as_str()])
            .map_err(write_err)?;
        Ok(n > 0)
    }

    /// Removes every sync record. Returns the number removed.
    pub fn clear_records(&self) -> Result<usize> {
        self.conn()
            .execute("DELETE FROM sync_queue", [])
            .map_err(write_err)
    }

    /// Applies `f` to a record and writes it back in a single transaction.
    ///
    /// Returns the updated record, or [`Error::RecordNotFound`].
    pub fn update_record<F>(&self, id: &RecordId, f: F) -> Result<SyncRecord>
    where
        F: FnOnce(&mut SyncRecord),
    {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(write_err)?;

        let sql = format!("SELECT {RECORD_COLUMNS} FROM sync_queue WHERE id = ?1");
        let mut record = tx
            .query_row(&sql, params![id.as_str()], record_from_row)
            .optional()?
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;

        f(&mut record);

        tx.execute(
            "UPDATE sync_queue SET retry_count = ?2, status = ?3, last_error = ?4, payload = ?5
             WHERE id = ?1",
            params![
                id.as_str(),
                record.retry_count,
                record.status.as_str(),
                record.last_error,
                serde_json::to_string(&record.payload)?,
            ],
        )
        .map_err(write_err)?;
        tx.commit().map_err(write_err)?;
        Ok(record)
    }

    /// Moves a record from `from` to `to` only if it is still in `from`.
    ///
    /// Returns false if the record is missing or in another status.
    pub fn transition_status(&self, id: &RecordId, from: SyncStatus, to: SyncStatus) -> Result<bool> {
        let n = self
            .conn()
            .execute(
                "UPDATE sync_queue SET status = ?3 WHERE id = ?1 AND status = ?2",
                params![id.as_str(), from.as_str(), to.as_str()],
            )
            .map_err(write_err)?;
        Ok(n > 0)
    }

    /// Moves every record in `from` to `to`. Returns the number moved.
    pub fn reset_status(&self, from: SyncStatus, to: SyncStatus) -> Result<usize> {
        self.conn()
            .execute(
                "UPDATE sync_queue SET status = ?2 WHERE status = ?1",
                params![from.as_str(), to.as_str()],
            )
            .map_err(write_err)
    }

    /// Counts queued records per status.
    pub fn status_counts(&self) -> Result<StatusCounts> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM sync_queue GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| {
                let status: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((parse_db::<SyncStatus>(&status, "status")?, count))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            *counts.slot(status) = count as usize;
        }
        Ok(counts)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
