//! Store event bus
//!
//! Stores publish on every mutation; the UI (and the composition root's
//! dispatcher) subscribe to re-project state. This replaces the implicit
//! subscriber notification the original reactive stores relied on.

use tokio::sync::broadcast;
use tracing::debug;

/// Default channel capacity (events)
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Events published by the stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The canonical task list was replaced from the server
    TasksRefreshed,
    /// The active filter set changed
    FiltersChanged,
    /// Session identity changed (login, logout, invalidation)
    SessionChanged,
    /// A toast message was shown
    ToastShown,
    /// The toast was cleared (timer or explicit reset)
    ToastCleared,
}

/// Broadcast bus shared by all stores
///
/// Emission is fire-and-forget: no subscribers is fine, and a full channel
/// drops the oldest events rather than blocking a store method.
#[derive(Clone)]
pub struct StoreBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl StoreBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: StoreEvent) {
        debug!(?event, "publish");
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StoreBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
