//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use firebridge_domain::error::BridgeError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`BridgeError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BridgeError::InvalidEntityId(_) | BridgeError::InvalidService(_) => {
                StatusCode::BAD_REQUEST
            }
            BridgeError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            BridgeError::RemoteQuery { .. }
            | BridgeError::RemoteCommand { .. }
            | BridgeError::RemoteListing(_)
            | BridgeError::RemoteService { .. }
            | BridgeError::StoreWrite { .. } => {
                StatusCode::BAD_GATEWAY
            }
        };

        let mut message = self.0.to_string();
        if let Some(source) = std::error::Error::source(&self.0) {
            message = format!("{message}: {source}");
        }
        if status == StatusCode::BAD_GATEWAY {
            tracing::error!(error = %message, "upstream error");
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firebridge_domain::error::{EntityIdError, UnknownEntityError};
    use firebridge_domain::id::EntityId;

    #[test]
    fn should_map_listing_failure_to_bad_gateway() {
        let response = ApiError::from(BridgeError::RemoteListing("timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn should_map_unknown_entity_to_not_found() {
        let err = UnknownEntityError::Hub(EntityId::parse("switch.ghost").unwrap());
        let response = ApiError::from(BridgeError::from(err)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn should_map_invalid_service_to_bad_request() {
        let response =
            ApiError::from(BridgeError::InvalidService("turn_on".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn should_map_invalid_entity_id_to_bad_request() {
        let response =
            ApiError::from(BridgeError::from(EntityIdError::Empty)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
