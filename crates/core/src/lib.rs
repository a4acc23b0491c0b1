// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! mes-core: Durable storage and record model for offline MES data entry.
//!
//! This crate provides the SQLite-backed local store, the pending mutation
//! record ([`SyncRecord`]) and the entity tags used by the `mes-sync` engine
//! and the `mes-sync` CLI.

pub mod clock;
pub mod entity;
pub mod error;
pub mod record;
pub mod store;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use entity::Entity;
pub use error::{Error, Result};
pub use record::{OperationKind, RecordId, SyncRecord, SyncStatus};
pub use store::{Collection, StatusCounts, Store, SCHEMA_VERSION};
