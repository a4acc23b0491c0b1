// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Online/offline signal shared between the host and the sync engine.
//!
//! Connectivity detection lives outside this crate; the host reports what it
//! observes with [`NetworkState::set_online`] and the trigger manager reacts
//! to offline→online transitions.

use std::sync::Arc;

use tokio::sync::watch;

/// Shared online flag with change notification.
#[derive(Clone)]
pub struct NetworkState {
    tx: Arc<watch::Sender<bool>>,
}

impl NetworkState {
    /// Creates a network state with the given initial reading.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        NetworkState { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records a connectivity reading. Returns true if it changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!("network is now {}", if online { "online" } else { "offline" });
        }
        changed
    }

    /// Returns a receiver that observes every change.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for NetworkState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for NetworkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkState")
            .field("online", &self.is_online())
            .finish()
    }
}
