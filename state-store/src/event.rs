//! Change events for keyed values
//!
//! When a watched key changes, a `ChangeEvent` is emitted carrying the
//! entity, the key and whether the value was replaced or dropped.

use std::time::Instant;

/// What happened to the watched value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A new or different value was stored
    Updated,
    /// The value was removed, explicitly or with its entity
    Removed,
}

/// A change event emitted when a watched key changes
///
/// Events carry the key, not the value. Use `StateStore::get()` to read the
/// current value after receiving an event.
#[derive(Debug, Clone)]
pub struct ChangeEvent<Id, K> {
    pub entity_id: Id,
    pub key: K,
    pub kind: ChangeKind,
    /// When the change was detected
    pub timestamp: Instant,
}

impl<Id, K> ChangeEvent<Id, K> {
    pub fn new(entity_id: Id, key: K, kind: ChangeKind) -> Self {
        Self {
            entity_id,
            key,
            kind,
            timestamp: Instant::now(),
        }
    }

    pub fn is_removal(&self) -> bool {
        self.kind == ChangeKind::Removed
    }
}

impl<Id: PartialEq, K: PartialEq> PartialEq for ChangeEvent<Id, K> {
    fn eq(&self, other: &Self) -> bool {
        // Timestamp not included in equality
        self.entity_id == other.entity_id && self.key == other.key && self.kind == other.kind
    }
}
