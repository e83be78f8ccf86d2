//! Error types for eds-state

use eds_api::{Access, DataType, PropertyId, RefKind};
use eds_codec::CodecError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

/// Errors returned by registry lookups and validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Property does not apply to this reference category
    #[error("{property} is not supported on a {kind} reference")]
    NotSupported { property: PropertyId, kind: RefKind },

    #[error("{property} is {access}")]
    AccessDenied {
        property: PropertyId,
        access: Access,
    },

    #[error("{property} expects {expected}, got {actual}")]
    TypeMismatch {
        property: PropertyId,
        expected: DataType,
        actual: DataType,
    },

    /// Value is absent from the legal set the device described
    #[error("{raw:#x} is not a legal value for {property}")]
    InvalidValue { property: PropertyId, raw: i32 },

    /// Identifier has no known shape; re-query the whole property set
    #[error("property id {0:#x} cannot be resolved")]
    Unresolved(u32),

    /// Snapshot holds no value yet
    #[error("no value cached for {property}")]
    NotCached { property: PropertyId },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl StateError {
    /// Whether the caller should re-read the full property set
    pub fn requires_requery(&self) -> bool {
        matches!(self, StateError::Unresolved(_))
    }
}
