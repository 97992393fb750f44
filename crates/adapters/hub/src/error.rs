//! Hub adapter error types.

use firebridge_domain::error::{BridgeError, UnknownEntityError};
use firebridge_domain::id::EntityId;

/// Errors specific to the hub adapter.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The reqwest client returned an error (connection, timeout, TLS).
    #[error("HTTP transport error")]
    Transport(#[from] reqwest::Error),

    /// The hub answered with a non-success status.
    #[error("hub returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The hub does not know the entity (HTTP 404).
    #[error("hub has no entity {0}")]
    NotFound(EntityId),

    /// The configured base URL is not a valid URL.
    #[error("invalid hub URL")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL uses a scheme other than http(s).
    #[error("unsupported hub URL scheme {0:?}")]
    UnsupportedScheme(String),

    /// WebSocket connect, read or write failed.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The hub rejected the access token (`auth_invalid`).
    #[error("hub rejected the access token: {0}")]
    AuthRejected(String),

    /// The hub sent an unexpected message during the handshake.
    #[error("unexpected hub message during handshake: {0}")]
    Protocol(String),

    /// A payload could not be parsed as JSON.
    #[error("failed to parse hub payload")]
    Payload(#[from] serde_json::Error),
}

impl HubError {
    /// Convert a failed state query into a [`BridgeError`].
    pub fn into_query(self, entity_id: &EntityId) -> BridgeError {
        match self {
            Self::NotFound(id) => BridgeError::UnknownEntity(UnknownEntityError::Hub(id)),
            other => BridgeError::RemoteQuery {
                entity_id: entity_id.clone(),
                source: Box::new(other),
            },
        }
    }

    /// Convert a failed service call into a [`BridgeError`].
    pub fn into_command(self, entity_id: &EntityId, service: &'static str) -> BridgeError {
        match self {
            Self::NotFound(id) => BridgeError::UnknownEntity(UnknownEntityError::Hub(id)),
            other => BridgeError::RemoteCommand {
                entity_id: entity_id.clone(),
                service,
                source: Box::new(other),
            },
        }
    }

    /// Whether reconnecting could help. Authentication failures are fatal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::AuthRejected(_) | Self::InvalidUrl(_) | Self::UnsupportedScheme(_)
        )
    }
}

impl From<HubError> for BridgeError {
    fn from(err: HubError) -> Self {
        BridgeError::RemoteListing(Box::new(err))
    }
}
