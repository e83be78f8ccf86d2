//! Keyed state snapshot with change detection
//!
//! A small, dependency-free store of values keyed by entity and key. Writes
//! are compared against the previous value; only real changes to watched
//! keys produce a [`ChangeEvent`], consumed through a blocking
//! [`ChangeIterator`].
//!
//! # Iteration Patterns
//!
//! ```rust,ignore
//! // Blocking iteration (waits for events)
//! for event in store.iter() {
//!     println!("{:?} changed on {:?}", event.key, event.entity_id);
//! }
//!
//! // Non-blocking (processes available events)
//! for event in store.iter().try_iter() {
//!     println!("Event: {:?}", event);
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! StateStore<Id, K, V>
//!     │
//!     ├── entities: HashMap<Id, PropertyBag<K, V>>
//!     │
//!     ├── watched: HashSet<(Id, K)>
//!     │
//!     └── event_channel: mpsc::channel<ChangeEvent<Id, K>>
//!             │
//!             └── ChangeIterator<Id, K>
//! ```

pub mod event;
pub mod iter;
pub mod store;

pub use event::{ChangeEvent, ChangeKind};
pub use iter::{ChangeIterator, TimeoutIter, TryIter};
pub use store::{PropertyBag, StateStore};

pub mod prelude {
    pub use crate::event::{ChangeEvent, ChangeKind};
    pub use crate::iter::ChangeIterator;
    pub use crate::store::{PropertyBag, StateStore};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_full_workflow() {
        let store = StateStore::<u32, u32, i64>::new();

        store.set(&1, 0x402, 400);
        store.set(&2, 0x402, 800);
        assert_eq!(store.entity_count(), 2);

        store.watch(1, 0x402);
        store.set(&1, 0x402, 1600);

        let event = store.iter().recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(event.entity_id, 1);
        assert_eq!(event.key, 0x402);
        assert_eq!(store.get(&1, &0x402), Some(1600));
    }

    #[test]
    fn test_concurrent_writers_never_tear_values() {
        let store = StateStore::<u32, u32, Vec<u8>>::new();
        let writers: Vec<_> = (0..4u8)
            .map(|n| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.set(&1, 7, vec![n; 64]);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let value = store.get(&1, &7).unwrap();
        assert!(value.iter().all(|b| *b == value[0]));
    }
}
