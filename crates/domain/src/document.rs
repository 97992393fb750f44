//! Device documents as stored in the remote document store.

use serde::{Deserialize, Serialize};

use crate::id::{EntityId, SyncDomain};
use crate::identity::DeviceRef;
use crate::time::Timestamp;

/// Decoded content of a device document.
///
/// Every field is optional: documents created by client applications may
/// predate the bridge and lack `entity_id` / `domain`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Desired (or last observed) on/off state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<bool>,
    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<Timestamp>,
}

impl DocumentRecord {
    /// The desired on/off state, if the document carries one.
    #[must_use]
    pub fn desired_state(&self) -> Option<bool> {
        self.state
    }
}

/// Fields the bridge merges into a device document.
///
/// Always carries `entity_id` and `domain` so the store → hub direction can
/// resolve the device exactly. The store assigns `updatedAt` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceUpdate {
    pub entity_id: EntityId,
    pub domain: SyncDomain,
    pub state: bool,
}

impl DeviceUpdate {
    /// Build the update for a device and its observed state.
    #[must_use]
    pub fn new(device: &DeviceRef, state: bool) -> Self {
        Self {
            entity_id: device.entity_id().clone(),
            domain: device.domain(),
            state,
        }
    }

    /// Names of the fields this update writes (used as a merge mask).
    #[must_use]
    pub fn field_names() -> [&'static str; 3] {
        ["entity_id", "domain", "state"]
    }
}
