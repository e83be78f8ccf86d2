//! Keyed value storage and change detection
//!
//! - `PropertyBag<K, V>`: the values of a single entity
//! - `StateStore<Id, K, V>`: entities with their bags, watch set and
//!   change channel

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{mpsc, Arc, Mutex, RwLock};

use crate::event::{ChangeEvent, ChangeKind};
use crate::iter::ChangeIterator;

// ============================================================================
// PropertyBag - keyed values of a single entity
// ============================================================================

/// Values of one entity, with change detection via `PartialEq`
///
/// ```rust
/// use state_store::PropertyBag;
///
/// let mut bag = PropertyBag::<u32, i64>::new();
/// assert!(bag.set(1, 50));
/// assert!(!bag.set(1, 50));
/// assert!(bag.set(1, 75));
/// assert_eq!(bag.get(&1), Some(75));
/// ```
#[derive(Debug, Clone)]
pub struct PropertyBag<K, V> {
    values: HashMap<K, V>,
}

impl<K, V> PropertyBag<K, V>
where
    K: Eq + Hash,
    V: Clone + PartialEq,
{
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.values.get(key).cloned()
    }

    /// Store a value, returning whether it differs from the previous one
    pub fn set(&mut self, key: K, value: V) -> bool {
        if self.values.get(&key) == Some(&value) {
            return false;
        }
        self.values.insert(key, value);
        true
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.values.keys()
    }
}

impl<K, V> Default for PropertyBag<K, V>
where
    K: Eq + Hash,
    V: Clone + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// StateStore<Id, K, V> - shared snapshot of many entities
// ============================================================================

/// Shared snapshot of keyed values per entity
///
/// Clones share the same storage. Readers always see a whole value; a
/// writer replaces a value under the write lock, so a partially applied
/// update is never observable.
///
/// ```rust
/// use state_store::StateStore;
/// use std::time::Duration;
///
/// let store = StateStore::<&str, u32, i64>::new();
/// store.watch("camera", 0x402);
///
/// assert!(store.set(&"camera", 0x402, 400));
/// assert_eq!(store.get(&"camera", &0x402), Some(400));
///
/// let event = store.iter().recv_timeout(Duration::from_millis(10)).unwrap();
/// assert_eq!(event.key, 0x402);
/// ```
pub struct StateStore<Id, K, V>
where
    Id: Clone + Eq + Hash + Send + Sync + 'static,
    K: Copy + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    entities: Arc<RwLock<HashMap<Id, PropertyBag<K, V>>>>,
    watched: Arc<RwLock<HashSet<(Id, K)>>>,
    event_tx: mpsc::Sender<ChangeEvent<Id, K>>,
    event_rx: Arc<Mutex<mpsc::Receiver<ChangeEvent<Id, K>>>>,
}

impl<Id, K, V> StateStore<Id, K, V>
where
    Id: Clone + Eq + Hash + Send + Sync + 'static,
    K: Copy + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::channel();

        Self {
            entities: Arc::new(RwLock::new(HashMap::new())),
            watched: Arc::new(RwLock::new(HashSet::new())),
            event_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    /// Returns `None` if the entity doesn't exist or the key isn't set.
    pub fn get(&self, entity_id: &Id, key: &K) -> Option<V> {
        let entities = self.entities.read().ok()?;
        entities.get(entity_id)?.get(key)
    }

    /// Store a value, returning whether it changed
    ///
    /// A change of a watched key emits a [`ChangeKind::Updated`] event.
    pub fn set(&self, entity_id: &Id, key: K, value: V) -> bool {
        let changed = {
            let mut entities = match self.entities.write() {
                Ok(e) => e,
                Err(_) => return false,
            };
            let bag = entities.entry(entity_id.clone()).or_default();
            bag.set(key, value)
        };

        if changed {
            self.maybe_emit(entity_id, key, ChangeKind::Updated);
        }
        changed
    }

    /// Drop one value, emitting [`ChangeKind::Removed`] if it was watched
    pub fn remove(&self, entity_id: &Id, key: &K) -> Option<V> {
        let removed = {
            let mut entities = self.entities.write().ok()?;
            entities.get_mut(entity_id)?.remove(key)
        };

        if removed.is_some() {
            self.maybe_emit(entity_id, *key, ChangeKind::Removed);
        }
        removed
    }

    /// Copy of every value currently held for an entity
    pub fn snapshot(&self, entity_id: &Id) -> HashMap<K, V> {
        self.entities
            .read()
            .ok()
            .and_then(|e| e.get(entity_id).map(|bag| bag.values.clone()))
            .unwrap_or_default()
    }

    pub fn keys(&self, entity_id: &Id) -> Vec<K> {
        self.entities
            .read()
            .ok()
            .and_then(|e| e.get(entity_id).map(|bag| bag.keys().copied().collect()))
            .unwrap_or_default()
    }

    /// Register interest in a key of an entity
    ///
    /// After watching, changes to this key appear in `iter()`.
    pub fn watch(&self, entity_id: Id, key: K) {
        if let Ok(mut watched) = self.watched.write() {
            watched.insert((entity_id, key));
        }
    }

    pub fn unwatch(&self, entity_id: &Id, key: K) {
        if let Ok(mut watched) = self.watched.write() {
            watched.remove(&(entity_id.clone(), key));
        }
    }

    pub fn is_watched(&self, entity_id: &Id, key: K) -> bool {
        self.watched
            .read()
            .map(|w| w.contains(&(entity_id.clone(), key)))
            .unwrap_or(false)
    }

    /// Blocking iterator over change events of watched keys
    pub fn iter(&self) -> ChangeIterator<Id, K> {
        ChangeIterator::new(Arc::clone(&self.event_rx))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }

    pub fn entity_ids(&self) -> Vec<Id> {
        self.entities
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove an entity and all its values
    ///
    /// Watched keys that held a value emit [`ChangeKind::Removed`]; watch
    /// registrations themselves are kept.
    pub fn remove_entity(&self, entity_id: &Id) -> bool {
        let removed = match self.entities.write() {
            Ok(mut e) => e.remove(entity_id),
            Err(_) => return false,
        };

        match removed {
            Some(bag) => {
                for key in bag.keys() {
                    self.maybe_emit(entity_id, *key, ChangeKind::Removed);
                }
                true
            }
            None => false,
        }
    }

    /// Clear all entities and watch registrations
    pub fn clear(&self) {
        if let Ok(mut entities) = self.entities.write() {
            entities.clear();
        }
        if let Ok(mut watched) = self.watched.write() {
            watched.clear();
        }
    }

    /// Sender for injecting events from outside the store
    pub fn event_sender(&self) -> mpsc::Sender<ChangeEvent<Id, K>> {
        self.event_tx.clone()
    }

    fn maybe_emit(&self, entity_id: &Id, key: K, kind: ChangeKind) {
        if self.is_watched(entity_id, key) {
            let _ = self
                .event_tx
                .send(ChangeEvent::new(entity_id.clone(), key, kind));
        }
    }
}

impl<Id, K, V> Default for StateStore<Id, K, V>
where
    Id: Clone + Eq + Hash + Send + Sync + 'static,
    K: Copy + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id, K, V> Clone for StateStore<Id, K, V>
where
    Id: Clone + Eq + Hash + Send + Sync + 'static,
    K: Copy + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
            watched: Arc::clone(&self.watched),
            event_tx: self.event_tx.clone(),
            event_rx: Arc::clone(&self.event_rx),
        }
    }
}

impl<Id, K, V> std::fmt::Debug for StateStore<Id, K, V>
where
    Id: Clone + Eq + Hash + Send + Sync + 'static,
    K: Copy + Eq + Hash + Send + Sync + 'static,
    V: Clone + PartialEq + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("entity_count", &self.entity_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    type Store = StateStore<String, u32, String>;

    const ISO: u32 = 0x402;
    const AV: u32 = 0x405;

    fn camera() -> String {
        "camera-1".to_string()
    }

    #[test]
    fn test_property_bag_change_detection() {
        let mut bag = PropertyBag::<u32, i32>::new();
        assert!(bag.is_empty());
        assert!(bag.set(ISO, 400));
        assert!(!bag.set(ISO, 400));
        assert!(bag.set(ISO, 800));
        assert_eq!(bag.get(&ISO), Some(800));
        assert_eq!(bag.remove(&ISO), Some(800));
        assert!(!bag.contains(&ISO));
    }

    #[test]
    fn test_state_store_basic() {
        let store = Store::new();
        assert!(store.is_empty());
        assert!(store.get(&camera(), &ISO).is_none());

        assert!(store.set(&camera(), ISO, "400".into()));
        assert_eq!(store.entity_count(), 1);
        assert_eq!(store.get(&camera(), &ISO), Some("400".to_string()));
    }

    #[test]
    fn test_watch_unwatch() {
        let store = Store::new();
        assert!(!store.is_watched(&camera(), ISO));
        store.watch(camera(), ISO);
        assert!(store.is_watched(&camera(), ISO));
        store.unwatch(&camera(), ISO);
        assert!(!store.is_watched(&camera(), ISO));
    }

    #[test]
    fn test_change_event_only_for_watched_keys() {
        let store = Store::new();
        store.watch(camera(), ISO);

        store.set(&camera(), AV, "5.6".into());
        store.set(&camera(), ISO, "400".into());

        let iter = store.iter();
        let event = iter.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(event.key, ISO);
        assert_eq!(event.kind, ChangeKind::Updated);
        assert!(iter.recv_timeout(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_no_event_when_same_value() {
        let store = Store::new();
        store.watch(camera(), ISO);
        store.set(&camera(), ISO, "400".into());

        let iter = store.iter();
        assert!(iter.recv_timeout(Duration::from_millis(100)).is_some());

        assert!(!store.set(&camera(), ISO, "400".into()));
        assert!(iter.recv_timeout(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_remove_entity_reports_watched_keys() {
        let store = Store::new();
        store.watch(camera(), ISO);
        store.set(&camera(), ISO, "400".into());
        store.set(&camera(), AV, "5.6".into());
        let iter = store.iter();
        let _ = iter.try_iter().count();

        assert!(store.remove_entity(&camera()));
        let events: Vec<_> = iter.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_removal());
        assert!(store.snapshot(&camera()).is_empty());
        assert!(!store.remove_entity(&camera()));
    }

    #[test]
    fn test_snapshot_copies_values() {
        let store = Store::new();
        store.set(&camera(), ISO, "400".into());
        store.set(&camera(), AV, "5.6".into());

        let snapshot = store.snapshot(&camera());
        assert_eq!(snapshot.len(), 2);
        store.set(&camera(), ISO, "800".into());
        assert_eq!(snapshot[&ISO], "400");
    }

    #[test]
    fn test_clone_shares_state() {
        let store = Store::new();
        let cloned = store.clone();
        store.set(&camera(), ISO, "400".into());
        assert_eq!(cloned.get(&camera(), &ISO), Some("400".to_string()));
    }
}
