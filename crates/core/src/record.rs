// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending mutation records held in the sync queue.
//!
//! A [`SyncRecord`] moves through the following states:
//!
//! ```text
//! Pending ──► Syncing ──► (removed)      dispatch succeeded
//!    ▲           │
//!    └───────────┤                        failed, retries left
//!                ▼
//!              Failed                     failed, ceiling reached (parked)
//! ```

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::entity::Entity;
use crate::error::{Error, Result};

/// Length of the random suffix appended to record ids.
const ID_SUFFIX_LEN: usize = 9;

/// The kind of mutation a record performs remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    /// Returns true if the remote call addresses an existing entity by id.
    pub fn targets_existing(&self) -> bool {
        matches!(self, OperationKind::Update | OperationKind::Delete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(OperationKind::Create),
            "update" => Ok(OperationKind::Update),
            "delete" => Ok(OperationKind::Delete),
            _ => Err(Error::InvalidOperationKind(s.to_string())),
        }
    }
}

/// Delivery status of a queued record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Waiting to be dispatched. The only status a drain picks up.
    Pending,
    /// Claimed by a drain; the remote call is in flight.
    Syncing,
    /// Delivered. Records are deleted on success, so this is rarely stored.
    Success,
    /// Parked after exhausting retries; kept for inspection.
    Failed,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
        }
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> [SyncStatus; 4] {
        [
            SyncStatus::Pending,
            SyncStatus::Syncing,
            SyncStatus::Success,
            SyncStatus::Failed,
        ]
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncStatus::Pending),
            "syncing" => Ok(SyncStatus::Syncing),
            "success" => Ok(SyncStatus::Success),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Unique identifier of a queued record: `{timestamp}-{random suffix}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh id for a record created at `timestamp`.
    pub fn generate(timestamp: i64) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        RecordId(format!("{timestamp}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

/// One pending create/update/delete against one remote entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub id: RecordId,
    /// Creation time in epoch millis; the queue's FIFO key.
    pub timestamp: i64,
    pub operation: OperationKind,
    pub entity: Entity,
    /// Entity-specific data for the remote call. Opaque to the queue.
    pub payload: Value,
    pub retry_count: u32,
    pub status: SyncStatus,
    pub last_error: Option<String>,
}

impl SyncRecord {
    /// Creates a new pending record with a generated id.
    pub fn new(timestamp: i64, operation: OperationKind, entity: Entity, payload: Value) -> Self {
        SyncRecord {
            id: RecordId::generate(timestamp),
            timestamp,
            operation,
            entity,
            payload,
            retry_count: 0,
            status: SyncStatus::Pending,
            last_error: None,
        }
    }

    /// Returns true if a drain may pick this record up.
    pub fn is_pending(&self) -> bool {
        self.status == SyncStatus::Pending
    }

    /// Extracts the remote entity id from the payload's `id` field.
    ///
    /// Accepts a non-empty string or an integer; anything else is `None`.
    pub fn payload_id(&self) -> Option<String> {
        match self.payload.get("id")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
