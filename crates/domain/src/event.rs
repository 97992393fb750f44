//! Events flowing into the bridge from both sides.
//!
//! - [`HubEvent`] — a `state_changed` notification from the hub feed.
//! - [`DocumentChange`] — an added / modified / removed record from the
//!   document store change feed.

use serde::{Deserialize, Serialize};

use crate::document::DocumentRecord;
use crate::id::{DocumentKey, EntityId};

/// Payload of a hub `state_changed` event.
///
/// `new_state` is kept as raw JSON so the event can be mirrored outward
/// exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    /// Raw entity id as sent by the hub; may not be well-formed.
    pub entity_id: String,
    /// New state object, absent when the entity was removed.
    #[serde(default)]
    pub new_state: Option<serde_json::Value>,
}

impl HubEvent {
    /// Build an event carrying only a state string.
    #[must_use]
    pub fn with_state(entity_id: impl Into<String>, state: &str) -> Self {
        let entity_id = entity_id.into();
        Self {
            new_state: Some(serde_json::json!({
                "entity_id": entity_id,
                "state": state,
            })),
            entity_id,
        }
    }

    /// The raw `new_state.state` string, if any.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.new_state
            .as_ref()
            .and_then(|s| s.get("state"))
            .and_then(serde_json::Value::as_str)
    }

    /// Parse the entity id.
    ///
    /// # Errors
    ///
    /// Returns [`EntityIdError`](crate::error::EntityIdError) for malformed ids.
    pub fn parsed_entity_id(&self) -> Result<EntityId, crate::error::EntityIdError> {
        EntityId::parse(self.entity_id.clone())
    }
}

/// Kind of change reported by the document store feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Modified => f.write_str("modified"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// A single change record from the document store feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub key: DocumentKey,
    pub data: DocumentRecord,
}

impl DocumentChange {
    /// Build a change record.
    #[must_use]
    pub fn new(kind: ChangeKind, key: DocumentKey, data: DocumentRecord) -> Self {
        Self { kind, key, data }
    }
}
