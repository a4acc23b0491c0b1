// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! mes-sync: Offline-first delivery of queued shop-floor mutations.
//!
//! Records written while offline are kept in the local store and pushed to
//! the MES REST API once connectivity allows.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  notify  ┌──────────────┐  drain  ┌─────────────┐
//! │  SyncQueue  │─────────►│TriggerManager│────────►│ SyncEngine  │
//! │  (Store)    │◄─────────│ enqueue/net/ │         │ single-     │
//! └─────────────┘  status  │ periodic     │         │ flight      │
//!        ▲                 └──────────────┘         └──────┬──────┘
//!        │                                                 │
//!        └──────────── mark success/retry/failed ──────────┤
//!                                                          ▼
//!                                                   ┌─────────────┐
//!                                                   │ Dispatcher  │──► Remote
//!                                                   └─────────────┘   (trait)
//! ```
//!
//! # Features
//!
//! - Durable FIFO queue over the `mes-core` SQLite store
//! - Per-record retry ceiling; exhausted records are parked as `Failed`
//! - Drains triggered on enqueue, on reconnect, and on a periodic timer
//! - At most one drain in flight per process
//! - Observers notified when a drain starts and stops
//! - Injectable remote trait for testing

mod config;
mod dispatcher;
mod engine;
mod error;
mod network;
mod observers;
mod queue;
mod trigger;

pub use config::SyncConfig;
pub use dispatcher::{
    DispatchError, DispatchResult, Dispatcher, HttpRemote, Method, Remote, RemoteRequest,
};
pub use engine::{DrainOutcome, DrainReport, SkipReason, SyncEngine, DEFAULT_MAX_RETRIES};
pub use error::{Error, Result};
pub use network::NetworkState;
pub use observers::{StatusObservers, Subscription};
pub use queue::SyncQueue;
pub use trigger::{spawn_drain, TriggerManager, TriggerReason};

#[cfg(test)]
mod test_helpers;


#[cfg(test)]
mod dispatcher_tests;
