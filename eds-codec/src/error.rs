use thiserror::Error;

use crate::data_type::DataType;

/// Errors raised while encoding or decoding tagged values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Payload length disagrees with the size implied by the tag
    #[error("{tag} payload must be {expected} bytes, got {actual}")]
    LengthMismatch {
        tag: DataType,
        expected: usize,
        actual: usize,
    },

    /// Payload is too short to hold the count prefix of a variable tag
    #[error("{tag} payload is missing its element count")]
    MissingCount { tag: DataType },

    /// Value shape does not match the requested tag
    #[error("a {actual} value cannot be encoded as {tag}")]
    TagMismatch { tag: DataType, actual: DataType },

    #[error("{tag} payload is not valid UTF-8")]
    InvalidUtf8 { tag: DataType },

    #[error("{tag} holds {count} elements, capacity is {capacity}")]
    CapacityExceeded {
        tag: DataType,
        count: usize,
        capacity: usize,
    },

    #[error("unknown data type tag {0}")]
    UnknownTag(u32),

    /// The Unknown tag has no payload layout
    #[error("data type {0} has no payload representation")]
    Unrepresentable(DataType),

    #[error("rational {numerator}/0 has no numeric value")]
    ZeroDenominator { numerator: i32 },

    /// Descriptor declares a value count outside `0..=128`
    #[error("property descriptor declares {count} values")]
    DescriptorOverflow { count: i64 },

    #[error("property descriptor record must be {expected} bytes, got {actual}")]
    DescriptorLength { expected: usize, actual: usize },
}

impl CodecError {
    /// Whether the failure is a shape disagreement between tag and payload
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            CodecError::LengthMismatch { .. }
                | CodecError::MissingCount { .. }
                | CodecError::TagMismatch { .. }
                | CodecError::InvalidUtf8 { .. }
                | CodecError::UnknownTag(_)
                | CodecError::Unrepresentable(_)
        )
    }
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
