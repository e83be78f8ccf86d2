//! Property registry over the shared device-state snapshot
//!
//! The registry owns no device connection. It validates requests against
//! the fixed property table and the descriptors the device reported, and
//! keeps the last confirmed value of every property per reference. A set
//! is split into [`PropertyRegistry::prepare_set`] (validate and encode)
//! and [`PropertyRegistry::commit`] (apply once the device acknowledged),
//! so a refused write never touches the snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, trace};

use eds_api::{ObjectRef, PropertyId, PropertySpec, RefKind};
use eds_codec::{decode, encode, DataType, PropertyDesc, TaggedValue};
use state_store::{ChangeIterator, StateStore};

use crate::error::{Result, StateError};

/// Change iterator over the snapshot
pub type PropertyChanges = ChangeIterator<ObjectRef, PropertyId>;

/// Validation and snapshot for every property of every reference
///
/// Clones share the same snapshot and descriptor cache.
#[derive(Clone, Default)]
pub struct PropertyRegistry {
    store: StateStore<ObjectRef, PropertyId, TaggedValue>,
    descs: Arc<RwLock<HashMap<(ObjectRef, PropertyId), PropertyDesc>>>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve a raw identifier reported for a reference of `kind`
    ///
    /// The `Unknown` sentinel and unlisted values fail with
    /// [`StateError::Unresolved`] carrying the raw value.
    pub fn resolve(&self, kind: RefKind, raw: u32) -> Result<(PropertyId, PropertySpec)> {
        let id = PropertyId::from_wire(raw).ok_or(StateError::Unresolved(raw))?;
        let spec = spec_for(kind, id)?;
        Ok((id, spec))
    }

    /// Shape and access of `id` on `target`
    pub fn spec(&self, target: ObjectRef, id: PropertyId) -> Result<PropertySpec> {
        spec_for(target.kind(), id)
    }

    // ========================================================================
    // Get / set
    // ========================================================================

    /// Last confirmed value of a property
    ///
    /// Fails with `AccessDenied` for write-only properties and `NotCached`
    /// when the device has not reported a value yet.
    pub fn get(&self, target: ObjectRef, id: PropertyId) -> Result<TaggedValue> {
        self.readable_spec(target, id)?;
        self.store
            .get(&target, &id)
            .ok_or(StateError::NotCached { property: id })
    }

    /// Check that `id` may be read from `target`
    pub fn readable_spec(&self, target: ObjectRef, id: PropertyId) -> Result<PropertySpec> {
        let spec = self.spec(target, id)?;
        if !spec.access.is_readable() {
            return Err(StateError::AccessDenied {
                property: id,
                access: spec.access,
            });
        }
        Ok(spec)
    }

    /// Validate a write and encode its payload
    ///
    /// Checks, in order: applicability, access mode, tag, and membership in
    /// the cached descriptor when one is present. Nothing is stored.
    pub fn prepare_set(
        &self,
        target: ObjectRef,
        id: PropertyId,
        value: &TaggedValue,
    ) -> Result<Bytes> {
        let spec = self.spec(target, id)?;

        if !spec.access.is_writable() {
            return Err(StateError::AccessDenied {
                property: id,
                access: spec.access,
            });
        }

        let actual = value.data_type();
        if actual != spec.data_type {
            return Err(StateError::TypeMismatch {
                property: id,
                expected: spec.data_type,
                actual,
            });
        }

        if let (Some(desc), Some(raw)) = (self.describe(target, id), value.raw_word()) {
            if !desc.is_empty() && !desc.contains(raw) {
                return Err(StateError::InvalidValue { property: id, raw });
            }
        }

        Ok(encode(value)?)
    }

    /// Apply a value the device acknowledged, returning whether it changed
    pub fn commit(&self, target: ObjectRef, id: PropertyId, value: TaggedValue) -> bool {
        let changed = self.store.set(&target, id, value);
        trace!(%target, property = %id, changed, "committed property");
        changed
    }

    /// Decode a payload read from the device and store it
    ///
    /// The device-reported tag must match the declared shape.
    pub fn apply_device_value(
        &self,
        target: ObjectRef,
        id: PropertyId,
        data_type: DataType,
        payload: &[u8],
    ) -> Result<TaggedValue> {
        let spec = self.spec(target, id)?;
        if data_type != spec.data_type {
            return Err(StateError::TypeMismatch {
                property: id,
                expected: spec.data_type,
                actual: data_type,
            });
        }

        let value = decode(data_type, payload)?;
        self.commit(target, id, value.clone());
        Ok(value)
    }

    /// Cached value without access checks
    pub fn cached(&self, target: ObjectRef, id: PropertyId) -> Option<TaggedValue> {
        self.store.get(&target, &id)
    }

    /// Drop one cached value so the next read goes to the device
    pub fn forget(&self, target: ObjectRef, id: PropertyId) {
        self.store.remove(&target, &id);
    }

    /// Drop every cached value and descriptor of a reference
    pub fn invalidate(&self, target: ObjectRef) {
        self.invalidate_values(target);
        self.invalidate_descs(target);
    }

    /// Drop every cached value of a reference, keeping its descriptors
    pub fn invalidate_values(&self, target: ObjectRef) {
        self.store.remove_entity(&target);
        debug!(%target, "invalidated property snapshot");
    }

    // ========================================================================
    // Descriptors
    // ========================================================================

    /// Legal value set of a property, if the device described one
    ///
    /// `None` is a valid answer: the identifier is `Unknown`, the property is
    /// not enumerable, or no descriptor has been stored yet.
    pub fn describe(&self, target: ObjectRef, id: PropertyId) -> Option<PropertyDesc> {
        let spec = id.spec()?;
        if !spec.describable || !spec.applies_to(target.kind()) {
            return None;
        }
        self.descs.read().get(&(target, id)).cloned()
    }

    /// Whether a descriptor can exist for this property on this target
    pub fn is_describable(&self, target: ObjectRef, id: PropertyId) -> bool {
        id.spec()
            .map(|spec| spec.describable && spec.applies_to(target.kind()))
            .unwrap_or(false)
    }

    pub fn store_desc(&self, target: ObjectRef, id: PropertyId, desc: PropertyDesc) -> Result<()> {
        let spec = self.spec(target, id)?;
        if !spec.describable {
            return Err(StateError::NotSupported {
                property: id,
                kind: target.kind(),
            });
        }
        self.descs.write().insert((target, id), desc);
        Ok(())
    }

    pub fn invalidate_descs(&self, target: ObjectRef) {
        self.descs.write().retain(|(owner, _), _| *owner != target);
    }

    // ========================================================================
    // Watching
    // ========================================================================

    /// Report changes of `id` on `target` through [`Self::changes`]
    pub fn watch(&self, target: ObjectRef, id: PropertyId) {
        self.store.watch(target, id);
    }

    pub fn unwatch(&self, target: ObjectRef, id: PropertyId) {
        self.store.unwatch(&target, id);
    }

    pub fn changes(&self) -> PropertyChanges {
        self.store.iter()
    }

    /// Copy of every cached value of a reference
    pub fn snapshot(&self, target: ObjectRef) -> HashMap<PropertyId, TaggedValue> {
        self.store.snapshot(&target)
    }
}

impl std::fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("references", &self.store.entity_count())
            .field("descriptors", &self.descs.read().len())
            .finish()
    }
}

fn spec_for(kind: RefKind, id: PropertyId) -> Result<PropertySpec> {
    let spec = id.spec().ok_or(StateError::Unresolved(id.wire()))?;
    if !spec.applies_to(kind) {
        return Err(StateError::NotSupported { property: id, kind });
    }
    Ok(spec)
}
