//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the registry of connected clients: each WebSocket connection owns
//! the receiving half of a bounded channel, and relays push into the
//! sending halves.

use std::collections::HashMap;
use std::sync::Arc;

use frames::Record;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Per-client relay channel capacity.
pub const RELAY_CAPACITY: usize = 256;

/// Shared application state. Clone is required by Axum; the client map is
/// behind an `Arc`.
#[derive(Clone, Default)]
pub struct AppState {
    /// Connected clients: `client_id` -> sender for relayed records.
    pub clients: Arc<RwLock<HashMap<Uuid, mpsc::Sender<Record>>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client and return the receiver its connection drains.
    pub async fn register(&self, client_id: Uuid) -> mpsc::Receiver<Record> {
        let (tx, rx) = mpsc::channel(RELAY_CAPACITY);
        self.clients.write().await.insert(client_id, tx);
        rx
    }

    pub async fn unregister(&self, client_id: Uuid) {
        self.clients.write().await.remove(&client_id);
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Push `record` to every connected client except `exclude`. Returns how
    /// many clients accepted it.
    pub async fn relay(&self, record: &Record, exclude: Option<Uuid>) -> usize {
        let clients = self.clients.read().await;
        let mut delivered = 0;
        for (client_id, tx) in clients.iter() {
            if exclude == Some(*client_id) {
                continue;
            }
            // Best-effort: a full or closed channel skips that client.
            if tx.try_send(record.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
