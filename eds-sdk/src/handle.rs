//! Generational handle arena
//!
//! One slot table per reference category. A slot remembers its parent, the
//! device-side id of the object, and a retain count. Releasing the last
//! retain frees the slot, bumps its generation and releases the parent, so
//! a child keeps its whole ancestry alive.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use eds_api::{DeviceInfo, ObjectRef, RefKind, WrongKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    /// Handle was released, or issued by another arena
    #[error("{0} is no longer valid")]
    Stale(ObjectRef),

    #[error(transparent)]
    WrongKind(#[from] WrongKind),
}

pub type Result<T> = std::result::Result<T, HandleError>;

/// Data a handle carries besides its identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleData {
    None,
    /// Cameras connected when the list was taken
    CameraList(Vec<DeviceInfo>),
    Camera(DeviceInfo),
}

#[derive(Debug)]
struct Entry {
    parent: Option<ObjectRef>,
    /// Camera the object lives on, itself for cameras
    camera: Option<ObjectRef>,
    device_id: u32,
    retains: u32,
    data: HandleData,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Default)]
struct Table {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

#[derive(Debug, Default)]
struct ArenaInner {
    tables: [Table; 5],
    by_device_id: HashMap<(ObjectRef, RefKind, u32), ObjectRef>,
}

impl ArenaInner {
    fn entry(&self, handle: ObjectRef) -> Result<&Entry> {
        self.tables[handle.kind().index()]
            .slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(HandleError::Stale(handle))
    }

    fn entry_mut(&mut self, handle: ObjectRef) -> Result<&mut Entry> {
        self.tables[handle.kind().index()]
            .slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(HandleError::Stale(handle))
    }

    fn allocate(&mut self, kind: RefKind, entry: Entry) -> ObjectRef {
        let table = &mut self.tables[kind.index()];
        let index = match table.free.pop() {
            Some(index) => index,
            None => {
                table.slots.push(Slot::default());
                (table.slots.len() - 1) as u32
            }
        };
        let slot = &mut table.slots[index as usize];
        slot.entry = Some(entry);
        ObjectRef::new(kind, index, slot.generation)
    }

    /// Drop one retain; returns the parent to release next when freed
    fn release_one(&mut self, handle: ObjectRef) -> Result<(u32, Option<ObjectRef>)> {
        let entry = self.entry_mut(handle)?;
        entry.retains -= 1;
        if entry.retains > 0 {
            return Ok((entry.retains, None));
        }

        let table = &mut self.tables[handle.kind().index()];
        let slot = &mut table.slots[handle.index() as usize];
        let freed = slot.entry.take();
        slot.generation = slot.generation.wrapping_add(1);
        table.free.push(handle.index());

        let parent = freed.and_then(|entry| {
            if let Some(camera) = entry.camera {
                let key = (camera, handle.kind(), entry.device_id);
                if self.by_device_id.get(&key) == Some(&handle) {
                    self.by_device_id.remove(&key);
                }
            }
            entry.parent
        });
        Ok((0, parent))
    }
}

/// Shared table of every live handle
#[derive(Debug, Default)]
pub struct HandleArena {
    inner: RwLock<ArenaInner>,
}

impl HandleArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a handle with one retain
    ///
    /// Objects below a camera are unique per device id: issuing the same
    /// object again retains and returns the existing handle. A new handle
    /// retains its parent.
    pub fn insert(
        &self,
        kind: RefKind,
        parent: Option<ObjectRef>,
        device_id: u32,
        data: HandleData,
    ) -> Result<ObjectRef> {
        let mut inner = self.inner.write();

        let camera = match parent {
            Some(parent) => inner.entry(parent)?.camera,
            None => None,
        };

        if let Some(camera) = camera {
            if let Some(&existing) = inner.by_device_id.get(&(camera, kind, device_id)) {
                inner.entry_mut(existing)?.retains += 1;
                return Ok(existing);
            }
        }

        if let Some(parent) = parent {
            inner.entry_mut(parent)?.retains += 1;
        }

        let handle = inner.allocate(
            kind,
            Entry {
                parent,
                camera,
                device_id,
                retains: 1,
                data,
            },
        );

        if kind == RefKind::Camera {
            inner.entry_mut(handle)?.camera = Some(handle);
        } else if let Some(camera) = camera {
            inner.by_device_id.insert((camera, kind, device_id), handle);
        }
        Ok(handle)
    }

    /// Add a retain, returning the new count
    pub fn retain(&self, handle: ObjectRef) -> Result<u32> {
        let mut inner = self.inner.write();
        let entry = inner.entry_mut(handle)?;
        entry.retains += 1;
        Ok(entry.retains)
    }

    /// Drop a retain, returning the remaining count
    ///
    /// At zero the handle turns stale and its parent is released in turn.
    pub fn release(&self, handle: ObjectRef) -> Result<u32> {
        self.release_collecting(handle).map(|(remaining, _)| remaining)
    }

    /// Like [`Self::release`], also returning every handle the release freed
    ///
    /// The freed list starts with `handle` itself when its count reached zero,
    /// followed by the ancestors the cascade freed, nearest first.
    pub fn release_collecting(&self, handle: ObjectRef) -> Result<(u32, Vec<ObjectRef>)> {
        let mut inner = self.inner.write();
        let (remaining, mut next) = inner.release_one(handle)?;
        let mut freed = Vec::new();
        if remaining == 0 {
            freed.push(handle);
        }
        while let Some(parent) = next {
            next = match inner.release_one(parent) {
                Ok((0, grandparent)) => {
                    freed.push(parent);
                    grandparent
                }
                _ => None,
            };
        }
        Ok((remaining, freed))
    }

    pub fn is_alive(&self, handle: ObjectRef) -> bool {
        self.inner.read().entry(handle).is_ok()
    }

    /// Fail unless the handle is alive and of the expected kind
    pub fn check(&self, handle: ObjectRef, kind: RefKind) -> Result<()> {
        if handle.kind() != kind {
            return Err(WrongKind {
                expected: kind,
                actual: handle,
            }
            .into());
        }
        self.inner.read().entry(handle).map(|_| ())
    }

    pub fn parent(&self, handle: ObjectRef) -> Result<Option<ObjectRef>> {
        Ok(self.inner.read().entry(handle)?.parent)
    }

    pub fn camera_of(&self, handle: ObjectRef) -> Result<Option<ObjectRef>> {
        Ok(self.inner.read().entry(handle)?.camera)
    }

    pub fn device_id(&self, handle: ObjectRef) -> Result<u32> {
        Ok(self.inner.read().entry(handle)?.device_id)
    }

    pub fn retains(&self, handle: ObjectRef) -> Result<u32> {
        Ok(self.inner.read().entry(handle)?.retains)
    }

    pub fn data(&self, handle: ObjectRef) -> Result<HandleData> {
        Ok(self.inner.read().entry(handle)?.data.clone())
    }

    /// Live handle of a device object on a camera, without retaining it
    pub fn lookup(&self, camera: ObjectRef, kind: RefKind, device_id: u32) -> Option<ObjectRef> {
        self.inner
            .read()
            .by_device_id
            .get(&(camera, kind, device_id))
            .copied()
    }

    /// Number of live handles of one kind
    pub fn live(&self, kind: RefKind) -> usize {
        self.inner.read().tables[kind.index()]
            .slots
            .iter()
            .filter(|slot| slot.entry.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(arena: &HandleArena) -> ObjectRef {
        arena
            .insert(RefKind::Camera, None, 0, HandleData::None)
            .unwrap()
    }

    #[test]
    fn test_release_makes_handle_stale() {
        let arena = HandleArena::new();
        let cam = camera(&arena);
        assert_eq!(arena.release(cam).unwrap(), 0);
        assert_eq!(arena.retains(cam), Err(HandleError::Stale(cam)));

        let reused = camera(&arena);
        assert_eq!(reused.index(), cam.index());
        assert_ne!(reused.generation(), cam.generation());
        assert!(!arena.is_alive(cam));
    }

    #[test]
    fn test_child_keeps_parent_alive() {
        let arena = HandleArena::new();
        let cam = camera(&arena);
        let volume = arena
            .insert(RefKind::Volume, Some(cam), 0x10, HandleData::None)
            .unwrap();
        let item = arena
            .insert(RefKind::DirectoryItem, Some(volume), 0x20, HandleData::None)
            .unwrap();

        assert_eq!(arena.release(cam).unwrap(), 1);
        assert_eq!(arena.release(volume).unwrap(), 1);
        assert!(arena.is_alive(cam));

        arena.release(item).unwrap();
        assert!(!arena.is_alive(volume));
        assert!(!arena.is_alive(cam));
    }

    #[test]
    fn test_release_reports_the_freed_chain() {
        let arena = HandleArena::new();
        let cam = camera(&arena);
        let volume = arena
            .insert(RefKind::Volume, Some(cam), 0x10, HandleData::None)
            .unwrap();
        let item = arena
            .insert(RefKind::DirectoryItem, Some(volume), 0x20, HandleData::None)
            .unwrap();
        arena.release(volume).unwrap();

        assert_eq!(arena.release_collecting(cam).unwrap(), (1, vec![]));
        assert_eq!(
            arena.release_collecting(item).unwrap(),
            (0, vec![item, volume, cam])
        );
    }

    #[test]
    fn test_same_device_object_shares_a_handle() {
        let arena = HandleArena::new();
        let cam = camera(&arena);
        let first = arena
            .insert(RefKind::DirectoryItem, Some(cam), 7, HandleData::None)
            .unwrap();
        let second = arena
            .insert(RefKind::DirectoryItem, Some(cam), 7, HandleData::None)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(arena.retains(first).unwrap(), 2);
        assert_eq!(arena.lookup(cam, RefKind::DirectoryItem, 7), Some(first));
        assert_eq!(arena.camera_of(first).unwrap(), Some(cam));
    }

    proptest::proptest! {
        #[test]
        fn test_balanced_retains_free_the_whole_chain(extra in 0u32..16, items in 1u32..8) {
            let arena = HandleArena::new();
            let cam = camera(&arena);
            let volume = arena
                .insert(RefKind::Volume, Some(cam), 1, HandleData::None)
                .unwrap();
            let children: Vec<_> = (0..items)
                .map(|id| {
                    arena
                        .insert(RefKind::DirectoryItem, Some(volume), 100 + id, HandleData::None)
                        .unwrap()
                })
                .collect();

            for _ in 0..extra {
                arena.retain(volume).unwrap();
            }
            for _ in 0..extra {
                arena.release(volume).unwrap();
            }
            arena.release(volume).unwrap();
            arena.release(cam).unwrap();
            proptest::prop_assert!(arena.is_alive(cam));

            for child in children {
                arena.release(child).unwrap();
            }
            proptest::prop_assert_eq!(arena.live(RefKind::DirectoryItem), 0);
            proptest::prop_assert_eq!(arena.live(RefKind::Volume), 0);
            proptest::prop_assert!(!arena.is_alive(cam));
        }
    }

    #[test]
    fn test_check_reports_wrong_kind() {
        let arena = HandleArena::new();
        let cam = camera(&arena);
        let err = arena.check(cam, RefKind::Volume).unwrap_err();
        assert!(matches!(err, HandleError::WrongKind(_)));
        assert!(arena.check(cam, RefKind::Camera).is_ok());
    }
}
