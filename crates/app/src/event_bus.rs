//! In-process event bus backed by a tokio broadcast channel.
//!
//! Carries the outward fan-out of hub events: every event read from the hub
//! feed is published here before any filtering, and HTTP subscribers (SSE)
//! receive it verbatim.

use std::future::Future;

use tokio::sync::broadcast;

use firebridge_domain::event::HubEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
pub struct InProcessEventBus {
    sender: broadcast::Sender<HubEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: HubEvent) -> impl Future<Output = ()> + Send {
        // Fails only when there are zero receivers.
        let _ = self.sender.send(event);
        async {}
    }
}
