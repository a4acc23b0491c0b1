// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for sync tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use mes_core::{ManualClock, Store};

use crate::SyncQueue;

/// Fixed epoch used by test clocks.
pub const T0: i64 = 1_700_000_000_000;

/// Queue over an in-memory store with a manual clock.
pub fn memory_queue() -> (Arc<SyncQueue>, Arc<ManualClock>) {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(T0));
    let queue = Arc::new(SyncQueue::with_clock(store, clock.clone()));
    (queue, clock)
}

/// Polls `cond` until it holds, yielding to the runtime between checks.
///
/// Panics after `timeout` of (possibly virtual) time.
pub async fn wait_until<F>(timeout: Duration, mut cond: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {:?}",
            timeout
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
