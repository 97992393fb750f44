//! Entity state — the operational state of a hub entity.

use serde::{Deserialize, Serialize};

/// Discrete operational state of a hub entity.
///
/// The hub reports states as free-form strings; anything that is not one of
/// the known values maps to [`Unknown`](Self::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    On,
    Off,
    #[default]
    Unknown,
    Unavailable,
}

impl EntityState {
    /// Parse a raw hub state string.
    #[must_use]
    pub fn from_hub(raw: &str) -> Self {
        match raw {
            "on" => Self::On,
            "off" => Self::Off,
            "unavailable" => Self::Unavailable,
            _ => Self::Unknown,
        }
    }

    /// Boolean view used for synchronization: only `on` counts as on.
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for EntityState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Unknown => f.write_str("unknown"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Current state of one entity as read back from the hub.
#[derive(Debug, Clone, PartialEq)]
pub struct StateReading {
    /// Parsed state.
    pub state: EntityState,
    /// The full JSON object returned by the hub.
    pub raw: serde_json::Value,
}

impl StateReading {
    /// Boolean view of [`state`](Self::state).
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_known_hub_states() {
        assert_eq!(EntityState::from_hub("on"), EntityState::On);
        assert_eq!(EntityState::from_hub("off"), EntityState::Off);
        assert_eq!(EntityState::from_hub("unavailable"), EntityState::Unavailable);
    }

    #[test]
    fn should_map_unrecognised_state_to_unknown() {
        assert_eq!(EntityState::from_hub("ON"), EntityState::Unknown);
        assert_eq!(EntityState::from_hub("42.5"), EntityState::Unknown);
    }

    #[test]
    fn should_only_treat_on_as_on() {
        assert!(EntityState::On.is_on());
        assert!(!EntityState::Off.is_on());
        assert!(!EntityState::Unknown.is_on());
        assert!(!EntityState::Unavailable.is_on());
    }

    #[test]
    fn should_convert_from_bool() {
        assert_eq!(EntityState::from(true), EntityState::On);
        assert_eq!(EntityState::from(false), EntityState::Off);
    }

    #[test]
    fn should_display_lowercase_variant_name() {
        assert_eq!(EntityState::On.to_string(), "on");
        assert_eq!(EntityState::Unavailable.to_string(), "unavailable");
    }
}
