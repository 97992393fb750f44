//! Typed identifiers: hub entity ids, document keys and sync-eligible domains.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EntityIdError;

/// Hub entity identifier in `<domain>.<name>` form (e.g. `light.living_room`).
///
/// Parsing only checks the shape; whether the entity takes part in
/// synchronization is decided by [`EntityId::sync_domain`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Parse and validate an entity id.
    ///
    /// # Errors
    ///
    /// Returns [`EntityIdError`] if the value is empty, has no `.` separator,
    /// or has an empty domain or name part.
    pub fn parse(value: impl Into<String>) -> Result<Self, EntityIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EntityIdError::Empty);
        }
        let Some((domain, name)) = value.split_once('.') else {
            return Err(EntityIdError::MissingSeparator(value));
        };
        if domain.is_empty() || name.is_empty() {
            return Err(EntityIdError::EmptyPart(value));
        }
        Ok(Self(value))
    }

    /// The part before the first `.` (e.g. `light`).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or("", |(domain, _)| domain)
    }

    /// The part after the first `.` (e.g. `living_room`).
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, name)| name)
    }

    /// The sync-eligible domain of this entity, if any.
    #[must_use]
    pub fn sync_domain(&self) -> Option<SyncDomain> {
        self.domain().parse().ok()
    }

    /// Borrow the raw string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Key of a device document inside the store collection (e.g. `living-room`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Wrap a raw document key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the raw string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device kinds the bridge mirrors between hub and store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDomain {
    Switch,
    Light,
}

impl SyncDomain {
    /// Every sync-eligible domain.
    pub const ALL: [Self; 2] = [Self::Switch, Self::Light];

    /// Lowercase hub domain name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for SyncDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDomain {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "switch" => Ok(Self::Switch),
            "light" => Ok(Self::Light),
            other => Err(EntityIdError::IneligibleDomain(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_split_domain_and_name() {
        let id = EntityId::parse("light.living_room").unwrap();
        assert_eq!(id.domain(), "light");
        assert_eq!(id.name(), "living_room");
        assert_eq!(id.sync_domain(), Some(SyncDomain::Light));
    }

    #[test]
    fn should_keep_dots_after_the_first_in_name() {
        let id = EntityId::parse("sensor.a.b").unwrap();
        assert_eq!(id.domain(), "sensor");
        assert_eq!(id.name(), "a.b");
    }

    #[test]
    fn should_report_no_sync_domain_for_sensor() {
        let id = EntityId::parse("sensor.temperature").unwrap();
        assert_eq!(id.sync_domain(), None);
    }

    #[test]
    fn should_reject_empty_entity_id() {
        assert!(matches!(EntityId::parse(""), Err(EntityIdError::Empty)));
    }

    #[test]
    fn should_reject_entity_id_without_separator() {
        assert!(matches!(
            EntityId::parse("lamp1"),
            Err(EntityIdError::MissingSeparator(_))
        ));
    }

    #[test]
    fn should_reject_entity_id_with_empty_part() {
        assert!(matches!(
            EntityId::parse("switch."),
            Err(EntityIdError::EmptyPart(_))
        ));
        assert!(matches!(
            EntityId::parse(".lamp1"),
            Err(EntityIdError::EmptyPart(_))
        ));
    }

    #[test]
    fn should_deserialize_entity_id_from_json_string() {
        let id: EntityId = serde_json::from_str("\"switch.lamp1\"").unwrap();
        assert_eq!(id.as_str(), "switch.lamp1");
        assert!(serde_json::from_str::<EntityId>("\"lamp1\"").is_err());
    }

    #[test]
    fn should_parse_sync_domains() {
        assert_eq!("switch".parse::<SyncDomain>().unwrap(), SyncDomain::Switch);
        assert_eq!("light".parse::<SyncDomain>().unwrap(), SyncDomain::Light);
        assert!("sensor".parse::<SyncDomain>().is_err());
    }
}
