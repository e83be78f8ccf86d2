//! Property registry for tethered cameras
//!
//! Maps property identifiers to their shape and access rules, enforces them
//! on every get and set, and keeps the live device-state snapshot shared by
//! all sessions of the same camera.
//!
//! # Architecture
//!
//! ```text
//! set_property ──▶ prepare_set ──▶ transport write ──▶ commit ──▶ StateStore
//!                  (access, tag,                       (only after   │
//!                   descriptor)                         the ack)     ▼
//! PropertyChanged ─────────────▶ apply_device_value ─────────▶ ChangeIterator
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use eds_api::{ObjectRef, PropertyId, RefKind};
//! use eds_codec::TaggedValue;
//! use eds_state::{PropertyRegistry, StateError};
//!
//! let registry = PropertyRegistry::new();
//! let camera = ObjectRef::new(RefKind::Camera, 0, 0);
//!
//! let payload = registry
//!     .prepare_set(camera, PropertyId::IsoSpeed, &TaggedValue::UInt32(0x58))
//!     .unwrap();
//! assert_eq!(payload.len(), 4);
//!
//! // Read-only properties are refused before anything is sent
//! let err = registry
//!     .prepare_set(camera, PropertyId::BatteryLevel, &TaggedValue::UInt32(80))
//!     .unwrap_err();
//! assert!(matches!(err, StateError::AccessDenied { .. }));
//! ```

pub mod error;
pub mod registry;

pub use error::{Result, StateError};
pub use registry::{PropertyChanges, PropertyRegistry};
