//! Change notification for store deltas.
//!
//! Mutating calls already return their deltas. A caller that wants a push
//! channel hands a `ChangeNotifier` to the store and subscribes to it.

use tokio::sync::broadcast;

use crate::db::Deltas;

/// Origin of a batch of deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// `insert` or `update` on this device.
    Local,
    /// `merge` of journals from any device.
    Merge,
}

/// One non-empty delta set produced by a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub source: ChangeSource,
    pub deltas: Deltas,
}

/// Pub/sub notifier broadcasting store deltas to all subscribers.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    /// Create a new ChangeNotifier with a buffer of 100 events.
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self { tx }
    }

    /// Subscribe to receive change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all subscribers.
    pub fn notify(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}
