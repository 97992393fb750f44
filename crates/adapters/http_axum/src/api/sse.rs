//! Server-Sent Events (SSE) stream of hub events.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use firebridge_app::ports::HubDispatcher;

use crate::state::AppState;

/// `GET /api/events/stream`: SSE stream of every hub `state_changed` event.
///
/// Each frame carries the event type `state_changed` and the event payload
/// (`entity_id`, `new_state`) as JSON, exactly as read from the hub. The
/// stream continues until the client disconnects or the bus is closed.
pub async fn stream<H>(
    State(state): State<AppState<H>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    H: HubDispatcher + Send + Sync + 'static,
{
    let event_rx = state.event_bus.subscribe();
    tracing::debug!(
        subscribers = state.event_bus.subscriber_count(),
        "SSE client connected"
    );

    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().event("state_changed").data(json))),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize hub event for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some events were dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
