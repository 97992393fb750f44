//! Echo memory — the last state the engine propagated per entity.
//!
//! The hub re-emits a `state_changed` event for every command the engine
//! issues. Remembering the last value the engine itself pushed lets Path A
//! recognise those events as echoes and drop them.
//!
//! Entries are created on the first relevant event for an entity, overwritten
//! by every propagation and never removed; the map is bounded by the device
//! set. It lives only in memory, so a restart re-syncs each entity on its
//! first event.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use firebridge_domain::id::EntityId;

/// Per-entity table of the last synchronized on/off value.
///
/// A single mutex guards the whole map; every operation is one short
/// critical section, which makes the compare-and-set in
/// [`propagate_if_changed`](Self::propagate_if_changed) atomic.
#[derive(Debug, Default)]
pub struct SyncMemory {
    states: Mutex<HashMap<EntityId, bool>>,
}

impl SyncMemory {
    /// Create an empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `is_on` for `entity_id` unless it equals the remembered value.
    ///
    /// Returns `true` when the caller should propagate (no entry yet, or a
    /// different value), `false` when the value is an echo or a no-op.
    pub fn propagate_if_changed(&self, entity_id: &EntityId, is_on: bool) -> bool {
        let mut states = self.lock();
        if states.get(entity_id) == Some(&is_on) {
            return false;
        }
        states.insert(entity_id.clone(), is_on);
        true
    }

    /// Overwrite the remembered value unconditionally.
    pub fn record(&self, entity_id: &EntityId, is_on: bool) {
        self.lock().insert(entity_id.clone(), is_on);
    }

    /// The remembered value, if any.
    #[must_use]
    pub fn get(&self, entity_id: &EntityId) -> Option<bool> {
        self.lock().get(entity_id).copied()
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EntityId, bool>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn lamp() -> EntityId {
        EntityId::parse("switch.lamp1").unwrap()
    }

    #[test]
    fn should_propagate_first_value_for_entity() {
        let memory = SyncMemory::new();
        assert!(memory.propagate_if_changed(&lamp(), true));
        assert_eq!(memory.get(&lamp()), Some(true));
    }

    #[test]
    fn should_suppress_repeated_value() {
        let memory = SyncMemory::new();
        assert!(memory.propagate_if_changed(&lamp(), false));
        assert!(!memory.propagate_if_changed(&lamp(), false));
        assert_eq!(memory.get(&lamp()), Some(false));
    }

    #[test]
    fn should_propagate_changed_value() {
        let memory = SyncMemory::new();
        memory.propagate_if_changed(&lamp(), false);
        assert!(memory.propagate_if_changed(&lamp(), true));
        assert_eq!(memory.get(&lamp()), Some(true));
    }

    #[test]
    fn should_suppress_after_record() {
        let memory = SyncMemory::new();
        memory.record(&lamp(), true);
        assert!(!memory.propagate_if_changed(&lamp(), true));
    }

    #[test]
    fn should_track_entities_independently() {
        let memory = SyncMemory::new();
        let light = EntityId::parse("light.living_room").unwrap();
        memory.record(&lamp(), true);
        assert!(memory.propagate_if_changed(&light, true));
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn should_forget_everything_on_clear() {
        let memory = SyncMemory::new();
        memory.record(&lamp(), true);
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.get(&lamp()), None);
    }

    #[test]
    fn should_let_exactly_one_concurrent_writer_propagate() {
        let memory = Arc::new(SyncMemory::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memory = Arc::clone(&memory);
                std::thread::spawn(move || memory.propagate_if_changed(&lamp(), true))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|propagated| *propagated)
            .count();
        assert_eq!(winners, 1);
    }
}
