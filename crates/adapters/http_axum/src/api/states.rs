//! Hub state proxy.

use axum::Json;
use axum::extract::State;

use firebridge_app::ports::HubDispatcher;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/states`: the hub's full state listing, passed through as-is.
pub async fn list<H>(State(state): State<AppState<H>>) -> Result<Json<serde_json::Value>, ApiError>
where
    H: HubDispatcher + Send + Sync + 'static,
{
    let states = state.hub.list_states().await?;
    Ok(Json(states))
}
