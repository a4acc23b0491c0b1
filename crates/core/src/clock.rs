// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wall clock access and queue timestamp generation.
//!
//! Queue records are ordered by their creation timestamp (epoch millis).
//! [`Timestamper`] hands out strictly increasing timestamps so that two
//! records enqueued within the same millisecond still have a defined order.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for getting the current wall clock time.
///
/// This allows injecting a manual clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> i64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a manual clock reading `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        ManualClock { now: AtomicI64::new(now_ms) }
    }

    /// Sets the current reading.
    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Produces strictly increasing millisecond timestamps.
///
/// If the wall clock has not advanced (or went backwards) since the last
/// reading, the previous timestamp plus one is returned instead.
pub struct Timestamper {
    clock: Arc<dyn ClockSource>,
    last: Mutex<i64>,
}

impl Timestamper {
    /// Creates a timestamper over the given clock.
    pub fn new(clock: Arc<dyn ClockSource>) -> Self {
        Timestamper { clock, last: Mutex::new(i64::MIN) }
    }

    /// Returns the next timestamp.
    pub fn next(&self) -> i64 {
        let physical = self.clock.now_ms();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let ts = if physical > *last { physical } else { *last + 1 };
        *last = ts;
        ts
    }
}

impl Default for Timestamper {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
