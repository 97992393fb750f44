//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! at the port boundary, attaching the entity or document context the engine
//! needs for logging.

use crate::id::{DocumentKey, EntityId};

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error surfaced to the synchronization engine.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Reading the current state of an entity from the hub failed.
    #[error("failed to query hub state of {entity_id}")]
    RemoteQuery {
        entity_id: EntityId,
        #[source]
        source: BoxError,
    },

    /// Issuing a command to the hub failed.
    #[error("failed to call {service} on {entity_id}")]
    RemoteCommand {
        entity_id: EntityId,
        service: &'static str,
        #[source]
        source: BoxError,
    },

    /// Listing all hub states failed.
    #[error("failed to list hub states")]
    RemoteListing(#[source] BoxError),

    /// A forwarded hub service call failed.
    #[error("failed to call hub service {service}")]
    RemoteService {
        service: String,
        #[source]
        source: BoxError,
    },

    /// A service name that is not `<domain>/<service>`.
    #[error("invalid service name {0:?}")]
    InvalidService(String),

    /// Upserting a device document into the store failed.
    #[error("failed to write document {key}")]
    StoreWrite {
        key: DocumentKey,
        #[source]
        source: BoxError,
    },

    /// A document or hub entity could not be resolved to a device.
    #[error("unknown entity")]
    UnknownEntity(#[from] UnknownEntityError),

    /// A malformed or ineligible entity id.
    #[error("invalid entity id")]
    InvalidEntityId(#[from] EntityIdError),
}

/// Reasons an entity id string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityIdError {
    #[error("entity id must not be empty")]
    Empty,

    #[error("entity id {0:?} has no domain separator")]
    MissingSeparator(String),

    #[error("entity id {0:?} has an empty domain or name")]
    EmptyPart(String),

    #[error("domain {0:?} is not synchronized")]
    IneligibleDomain(String),
}

/// Identity resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnknownEntityError {
    /// No entity id field, alias or domain hint on the document.
    #[error("cannot resolve an entity for document {0}")]
    Document(DocumentKey),

    /// The hub does not know the entity.
    #[error("hub has no entity {0}")]
    Hub(EntityId),
}
