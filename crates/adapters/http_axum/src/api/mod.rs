//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod commands;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod states;

use axum::Router;
use axum::routing::{get, post};

use firebridge_app::ports::HubDispatcher;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<H>() -> Router<AppState<H>>
where
    H: HubDispatcher + Send + Sync + 'static,
{
    Router::new()
        .route("/states", get(states::list::<H>))
        .route("/state", post(commands::set_state::<H>))
        .route("/service", post(commands::call_service::<H>))
        .route("/events/stream", get(sse::stream::<H>))
}
