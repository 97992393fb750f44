//! Manual hub commands.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use firebridge_app::ports::{HubDispatcher, ServiceCall};
use firebridge_domain::error::BridgeError;
use firebridge_domain::id::EntityId;
use firebridge_domain::identity::DeviceRef;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `POST /api/state`.
#[derive(Deserialize)]
pub struct SetStateRequest {
    pub entity_id: String,
    pub state: bool,
}

/// Request body for `POST /api/service`.
#[derive(Deserialize)]
pub struct ServiceRequest {
    /// `<domain>/<service>`, e.g. `light/turn_on`.
    pub service: String,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize)]
pub struct CommandResponse {
    success: bool,
    service: String,
    response: serde_json::Value,
}

/// `POST /api/state`: switch a device on or off.
///
/// Always sends the explicit `turn_on` / `turn_off` service, never `toggle`.
pub async fn set_state<H>(
    State(state): State<AppState<H>>,
    Json(request): Json<SetStateRequest>,
) -> Result<Json<CommandResponse>, ApiError>
where
    H: HubDispatcher + Send + Sync + 'static,
{
    let entity_id = EntityId::parse(request.entity_id).map_err(BridgeError::from)?;
    let device = DeviceRef::from_entity_id(entity_id).map_err(BridgeError::from)?;

    let ack = state.hub.set_state(&device, request.state).await?;
    tracing::info!(entity_id = %device, service = %ack.service, "manual command sent");

    Ok(Json(CommandResponse {
        success: true,
        service: format!("{}/{}", device.domain(), ack.service),
        response: ack.response,
    }))
}

/// `POST /api/service`: forward a service call to the hub.
///
/// A top-level `entity_id` is merged into the service data.
pub async fn call_service<H>(
    State(state): State<AppState<H>>,
    Json(request): Json<ServiceRequest>,
) -> Result<Json<CommandResponse>, ApiError>
where
    H: HubDispatcher + Send + Sync + 'static,
{
    let mut data = request.data;
    if let Some(entity_id) = request.entity_id {
        data.insert("entity_id".to_string(), entity_id.into());
    }
    let call = ServiceCall::parse(&request.service, data)?;

    let response = state.hub.call_service(&call).await?;
    tracing::info!(service = %call, "service call forwarded");

    Ok(Json(CommandResponse {
        success: true,
        service: call.to_string(),
        response,
    }))
}
