//! Event bus port — fan-out of hub events to external subscribers.

use std::future::Future;

use firebridge_domain::event::HubEvent;

/// Publishes hub events to interested subscribers.
///
/// Publishing is best effort: having no subscribers is not an error.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: HubEvent) -> impl Future<Output = ()> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: HubEvent) -> impl Future<Output = ()> + Send {
        (**self).publish(event)
    }
}
