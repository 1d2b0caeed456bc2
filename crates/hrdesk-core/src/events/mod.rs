//! Session lifecycle events emitted by HRDesk operations.
//!
//! Events are dispatched through the [`EventBus`] and consumed by the
//! application shell (screen lock on revocation, redirects, status
//! displays). Publishing never fails: an event with no subscribers is
//! simply dropped.

pub mod session;

use tokio::sync::broadcast;
use tracing::trace;

pub use session::{RevocationReason, SessionEvent};

/// Capacity of the in-process event channel. Lagging subscribers lose the
/// oldest events rather than blocking publishers.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// In-process broadcast bus for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to all future session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            trace!("session event dropped: no subscribers");
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
