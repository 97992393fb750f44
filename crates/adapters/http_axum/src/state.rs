//! Shared application state for axum handlers.

use std::sync::Arc;

use firebridge_app::event_bus::InProcessEventBus;
use firebridge_app::ports::HubDispatcher;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so `H` itself does not need to be
/// `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<H> {
    /// Hub client used by the state proxy.
    pub hub: Arc<H>,
    /// Broadcast bus carrying every hub event, for SSE subscribers.
    pub event_bus: Arc<InProcessEventBus>,
    /// Whether the document store side is running.
    pub store_enabled: bool,
}

impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            event_bus: Arc::clone(&self.event_bus),
            store_enabled: self.store_enabled,
        }
    }
}

impl<H> AppState<H>
where
    H: HubDispatcher + Send + Sync + 'static,
{
    pub fn new(hub: Arc<H>, event_bus: Arc<InProcessEventBus>, store_enabled: bool) -> Self {
        Self {
            hub,
            event_bus,
            store_enabled,
        }
    }
}
