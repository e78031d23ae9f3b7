//! Outbound event channel consumed by the oracle bridge and other observers.

use surety_types::{EventEnvelope, SuretyEvent};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Events buffered for a slow reader before new ones are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Receiving half of the event channel.
///
/// The channel is bounded: a reader that falls more than its capacity behind
/// loses the newest events.
pub type EventStream = mpsc::Receiver<EventEnvelope>;

/// Clonable handle the engines append committed events to.
#[derive(Clone, Debug)]
pub struct EventOutbox {
    sender: mpsc::Sender<EventEnvelope>,
}

impl EventOutbox {
    /// Create a connected outbox and stream with [`DEFAULT_EVENT_CAPACITY`].
    pub fn channel() -> (Self, EventStream) {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Create a connected outbox and stream buffering up to `capacity` events.
    ///
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> (Self, EventStream) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Append an event. Never fails the caller; a full or closed stream is logged.
    pub fn emit(&self, event: SuretyEvent) {
        let envelope = EventEnvelope::new(event);
        debug!(event_id = %envelope.id, "Emitting event");
        match self.sender.try_send(envelope) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(event_id = %dropped.id, "Event stream full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                warn!(event_id = %dropped.id, "Event stream closed; event dropped");
            }
        }
    }
}
