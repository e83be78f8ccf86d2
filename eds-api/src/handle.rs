//! Opaque object handles
//!
//! A handle is an arena slot index plus the generation of the slot when the
//! handle was issued. Once the slot is released and reused the generation
//! moves on, so stale handles are detected instead of aliasing a new object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of object a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RefKind {
    CameraList,
    Camera,
    Volume,
    DirectoryItem,
    EvfImage,
}

impl RefKind {
    pub const ALL: [RefKind; 5] = [
        RefKind::CameraList,
        RefKind::Camera,
        RefKind::Volume,
        RefKind::DirectoryItem,
        RefKind::EvfImage,
    ];

    pub const fn index(self) -> usize {
        match self {
            RefKind::CameraList => 0,
            RefKind::Camera => 1,
            RefKind::Volume => 2,
            RefKind::DirectoryItem => 3,
            RefKind::EvfImage => 4,
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefKind::CameraList => "camera-list",
            RefKind::Camera => "camera",
            RefKind::Volume => "volume",
            RefKind::DirectoryItem => "directory-item",
            RefKind::EvfImage => "evf-image",
        };
        f.write_str(name)
    }
}

/// Untyped handle to any object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    kind: RefKind,
    index: u32,
    generation: u32,
}

impl ObjectRef {
    pub const fn new(kind: RefKind, index: u32, generation: u32) -> Self {
        Self {
            kind,
            index,
            generation,
        }
    }

    pub const fn kind(&self) -> RefKind {
        self.kind
    }

    pub const fn index(&self) -> u32 {
        self.index
    }

    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}.{}", self.kind, self.index, self.generation)
    }
}

/// Handle was issued for a different category than the one expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected a {expected} handle, got {actual}")]
pub struct WrongKind {
    pub expected: RefKind,
    pub actual: ObjectRef,
}

/// Macro to generate a handle wrapper fixed to one category
macro_rules! typed_ref {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(ObjectRef);

        impl $name {
            pub const KIND: RefKind = RefKind::$kind;

            pub const fn as_object(&self) -> ObjectRef {
                self.0
            }
        }

        impl From<$name> for ObjectRef {
            fn from(value: $name) -> ObjectRef {
                value.0
            }
        }

        impl TryFrom<ObjectRef> for $name {
            type Error = WrongKind;

            fn try_from(value: ObjectRef) -> Result<Self, Self::Error> {
                if value.kind() == RefKind::$kind {
                    Ok($name(value))
                } else {
                    Err(WrongKind {
                        expected: RefKind::$kind,
                        actual: value,
                    })
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

typed_ref!(
    /// Snapshot of the cameras connected when the list was taken
    CameraListRef => CameraList
);
typed_ref!(CameraRef => Camera);
typed_ref!(VolumeRef => Volume);
typed_ref!(
    /// File or folder on a volume
    DirItemRef => DirectoryItem
);
typed_ref!(
    /// One live-view frame together with its metadata
    EvfImageRef => EvfImage
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_conversion_checks_kind() {
        let raw = ObjectRef::new(RefKind::Camera, 3, 1);
        let camera = CameraRef::try_from(raw).unwrap();
        assert_eq!(camera.as_object(), raw);

        let err = VolumeRef::try_from(raw).unwrap_err();
        assert_eq!(err.expected, RefKind::Volume);
    }

    #[test]
    fn test_display() {
        let raw = ObjectRef::new(RefKind::DirectoryItem, 7, 2);
        assert_eq!(raw.to_string(), "directory-item#7.2");
    }

    #[test]
    fn test_generations_distinguish_handles() {
        let a = ObjectRef::new(RefKind::Volume, 0, 0);
        let b = ObjectRef::new(RefKind::Volume, 0, 1);
        assert_ne!(a, b);
    }
}
