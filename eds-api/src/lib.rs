//! Identifier space for tethered camera control
//!
//! Property identifiers, command codes, event codes and value sets keep the
//! exact 32-bit values the camera uses on the wire. Every table is a closed
//! enum generated with the same shape: `ALL`, `wire()`, `from_wire()` and a
//! `TryFrom` conversion that reports the unknown raw value.
//!
//! ```rust
//! use eds_api::{PropertyId, RefKind};
//! use eds_codec::DataType;
//!
//! let spec = PropertyId::IsoSpeed.spec().unwrap();
//! assert_eq!(spec.data_type, DataType::UInt32);
//! assert!(spec.applies_to(RefKind::Camera));
//!
//! // The "unknown" sentinel never resolves to a shape
//! assert!(PropertyId::Unknown.spec().is_none());
//! ```

#[macro_use]
mod macros;

pub mod command;
pub mod event;
pub mod handle;
pub mod info;
pub mod property;
pub mod quality;
pub mod values;

pub use command::{
    CameraCommand, DriveLens, DrivePowerZoom, EvfAf, RemoteShootingMode, ShutterButton,
    StatusCommand,
};
pub use event::{EventChannel, ObjectEventKind, PropertyEventKind, StateEventKind};
pub use handle::{
    CameraListRef, CameraRef, DirItemRef, EvfImageRef, ObjectRef, RefKind, VolumeRef, WrongKind,
};
pub use info::{Capacity, DeviceInfo, DirItemInfo, VolumeInfo};
pub use property::{PropertyId, PropertySpec, Targets};
pub use quality::{ImageFormat, ImageQuality};
pub use values::*;

pub use eds_codec::{Access, DataType, PropertyDesc, TaggedValue};

/// Longest name the camera reports for files, volumes and devices
pub const MAX_NAME: usize = 256;

/// Default chunk size for object transfers
pub const TRANSFER_BLOCK_SIZE: usize = 512;

/// Raw value that has no member in the table it was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{value:#x} is not a known {kind}")]
pub struct UnknownWireValue {
    pub kind: &'static str,
    pub value: i64,
}
