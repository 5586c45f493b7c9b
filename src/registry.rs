//! Connection registry — the set of live peer output channels.
//!
//! DESIGN
//! ======
//! Each accepted connection registers an outbound `mpsc::Sender<Command>`
//! keyed by a fresh `ConnectionId`. Broadcast walks the set under a read
//! lock and clones the command into every channel except the originator's;
//! membership changes take the write lock. Delivery to distinct channels is
//! independent, so one slow or dead peer never stalls the rest.
//!
//! ERROR HANDLING
//! ==============
//! A channel that refuses a send (closed, or full because its writer task
//! has stalled) is treated as a dead connection: it is unregistered after
//! the broadcast pass, and delivery to every other channel still happens.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::command::Command;

/// Identity of one registered connection.
pub type ConnectionId = Uuid;

/// Thread-safe set of currently connected peer output channels.
#[derive(Default)]
pub struct Registry {
    channels: RwLock<HashMap<ConnectionId, mpsc::Sender<Command>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self { channels: RwLock::new(HashMap::new()) }
    }

    /// Add an outbound channel for a newly accepted peer. The peer becomes
    /// a broadcast recipient as soon as this returns.
    pub async fn register(&self, tx: mpsc::Sender<Command>) -> ConnectionId {
        let id = Uuid::new_v4();
        let mut channels = self.channels.write().await;
        channels.insert(id, tx);
        info!(conn_id = %id, connections = channels.len(), "registry: peer registered");
        id
    }

    /// Remove a channel. Idempotent: a connection may be removed by its own
    /// handler on disconnect and again by a failed broadcast racing it.
    pub async fn unregister(&self, id: ConnectionId) {
        let mut channels = self.channels.write().await;
        if channels.remove(&id).is_some() {
            info!(conn_id = %id, connections = channels.len(), "registry: peer unregistered");
        }
    }

    /// Deliver `command` to every registered channel except `exclude` (the
    /// originator, which already applied it to its own replica).
    pub async fn broadcast(&self, command: &Command, exclude: Option<ConnectionId>) {
        let mut dead = Vec::new();
        {
            let channels = self.channels.read().await;
            for (id, tx) in channels.iter() {
                if exclude == Some(*id) {
                    continue;
                }
                if tx.try_send(command.clone()).is_err() {
                    dead.push(*id);
                }
            }
        }

        // Failed channels are dropped outside the read lock.
        for id in dead {
            warn!(conn_id = %id, "registry: dropping unresponsive peer");
            self.unregister(id).await;
        }
    }

    /// Number of currently registered connections.
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Identifiers of the currently registered connections.
    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        self.channels.read().await.keys().copied().collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
