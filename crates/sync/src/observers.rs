// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync status observers.
//!
//! Listeners are told `true` when a drain starts and `false` when it stops.
//! [`StatusObservers::subscribe`] returns a [`Subscription`]; dropping it
//! deregisters the listener, so no callback outlives its owner.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;

type Listener = Arc<dyn Fn(bool) + Send + Sync>;

struct Registry {
    listeners: Mutex<BTreeMap<u64, Listener>>,
    next_id: AtomicU64,
    state: watch::Sender<bool>,
}

/// Registry of "sync in progress" listeners.
#[derive(Clone)]
pub struct StatusObservers {
    registry: Arc<Registry>,
}

impl StatusObservers {
    pub fn new() -> Self {
        let (state, _rx) = watch::channel(false);
        StatusObservers {
            registry: Arc::new(Registry {
                listeners: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(0),
                state,
            }),
        }
    }

    /// Registers a listener until the returned subscription is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Returns a receiver tracking the syncing flag.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.registry.state.subscribe()
    }

    /// Returns the last published syncing flag.
    pub fn is_syncing(&self) -> bool {
        *self.registry.state.borrow()
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Publishes a syncing transition to every listener.
    pub(crate) fn publish(&self, syncing: bool) {
        self.registry.state.send_replace(syncing);

        // Call outside the lock so listeners may (un)subscribe
        let listeners: Vec<Listener> = self
            .registry
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(syncing);
        }
    }
}

impl Default for StatusObservers {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a registered listener. Deregisters on drop.
pub struct Subscription {
    id: u64,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Deregisters the listener now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .listeners
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&self.id);
        }
    }
}
