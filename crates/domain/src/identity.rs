//! Device identity — mapping between hub entity ids and document keys.
//!
//! The forward mapping ([`document_key`]) strips the domain prefix and turns
//! underscores into hyphens: `light.living_room` → `living-room`. It is a
//! storage-location convenience only and is **not injective**:
//! `switch.a_b` and `switch.a-b` both map to `a-b`, and `switch.lamp` and
//! `light.lamp` both map to `lamp`. Identity in the store → hub direction is
//! therefore resolved from the `entity_id` field persisted on every document
//! the bridge writes (see [`IdentityMapper::resolve`]). Two colliding
//! devices still share one document in the hub → store direction; the last
//! write wins and the sync engine logs a warning when the writer changes.

use std::collections::HashMap;

use crate::document::DocumentRecord;
use crate::error::{EntityIdError, UnknownEntityError};
use crate::id::{DocumentKey, EntityId, SyncDomain};

/// A sync-eligible device: an entity id whose domain is mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceRef {
    entity_id: EntityId,
    domain: SyncDomain,
}

impl DeviceRef {
    /// Wrap an entity id if its domain is sync-eligible.
    ///
    /// # Errors
    ///
    /// Returns [`EntityIdError::IneligibleDomain`] for other domains.
    pub fn from_entity_id(entity_id: EntityId) -> Result<Self, EntityIdError> {
        let domain = entity_id.domain().parse::<SyncDomain>()?;
        Ok(Self { entity_id, domain })
    }

    #[must_use]
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    #[must_use]
    pub fn domain(&self) -> SyncDomain {
        self.domain
    }

    /// Storage key of this device's document.
    ///
    /// The domain is dropped, so a switch and a light with the same name
    /// share a key.
    #[must_use]
    pub fn document_key(&self) -> DocumentKey {
        DocumentKey::new(self.entity_id.name().replace('_', "-"))
    }
}

impl std::fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.entity_id.fmt(f)
    }
}

/// Derive the document key for an entity id.
///
/// Returns `None` when the entity is not in a sync-eligible domain.
#[must_use]
pub fn document_key(entity_id: &EntityId) -> Option<DocumentKey> {
    DeviceRef::from_entity_id(entity_id.clone())
        .ok()
        .map(|device| device.document_key())
}

/// Resolves the hub device behind a changed document.
///
/// Resolution order:
/// 1. the explicit `entity_id` field on the document,
/// 2. the configured alias table (fixed key → entity id mapping),
/// 3. the `domain` field combined with the key, hyphens turned back into
///    underscores.
#[derive(Debug, Clone, Default)]
pub struct IdentityMapper {
    aliases: HashMap<DocumentKey, DeviceRef>,
}

impl IdentityMapper {
    /// Create a mapper with no aliases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixed mapping from a document key to a device.
    #[must_use]
    pub fn with_alias(mut self, key: DocumentKey, device: DeviceRef) -> Self {
        self.aliases.insert(key, device);
        self
    }

    /// Number of registered aliases.
    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Resolve the device for a document.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEntityError::Document`] if no rule applies, or if the
    /// document names an entity outside the sync-eligible domains.
    pub fn resolve(
        &self,
        key: &DocumentKey,
        record: &DocumentRecord,
    ) -> Result<DeviceRef, UnknownEntityError> {
        let unknown = || UnknownEntityError::Document(key.clone());

        if let Some(raw) = record.entity_id.as_deref() {
            return EntityId::parse(raw)
                .and_then(DeviceRef::from_entity_id)
                .map_err(|_| unknown());
        }

        if let Some(device) = self.aliases.get(key) {
            return Ok(device.clone());
        }

        let domain = record
            .domain
            .as_deref()
            .and_then(|d| d.parse::<SyncDomain>().ok())
            .ok_or_else(unknown)?;
        let candidate = format!("{domain}.{}", key.as_str().replace('-', "_"));
        EntityId::parse(candidate)
            .and_then(DeviceRef::from_entity_id)
            .map_err(|_| unknown())
    }
}
