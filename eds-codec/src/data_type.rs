//! Runtime type tags for property payloads

use serde::{Deserialize, Serialize};

/// Type tag carried alongside every property payload
///
/// The discriminants are the wire values reported by the device and must
/// not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum DataType {
    Unknown = 0,
    Bool = 1,
    String = 2,
    Int8 = 3,
    Int16 = 4,
    UInt8 = 6,
    UInt16 = 7,
    Int32 = 8,
    UInt32 = 9,
    Int64 = 10,
    UInt64 = 11,
    Float = 12,
    Double = 13,
    ByteBlock = 14,
    Rational = 20,
    Point = 21,
    Rect = 22,
    Time = 23,
    BoolArray = 30,
    Int8Array = 31,
    Int16Array = 32,
    Int32Array = 33,
    UInt8Array = 34,
    UInt16Array = 35,
    UInt32Array = 36,
    RationalArray = 37,
    FocusInfo = 101,
    PictureStyleDesc = 102,
}

impl DataType {
    /// Every tag, in wire order
    pub const ALL: [DataType; 28] = [
        DataType::Unknown,
        DataType::Bool,
        DataType::String,
        DataType::Int8,
        DataType::Int16,
        DataType::UInt8,
        DataType::UInt16,
        DataType::Int32,
        DataType::UInt32,
        DataType::Int64,
        DataType::UInt64,
        DataType::Float,
        DataType::Double,
        DataType::ByteBlock,
        DataType::Rational,
        DataType::Point,
        DataType::Rect,
        DataType::Time,
        DataType::BoolArray,
        DataType::Int8Array,
        DataType::Int16Array,
        DataType::Int32Array,
        DataType::UInt8Array,
        DataType::UInt16Array,
        DataType::UInt32Array,
        DataType::RationalArray,
        DataType::FocusInfo,
        DataType::PictureStyleDesc,
    ];

    /// Wire value of this tag
    pub const fn wire(self) -> u32 {
        self as u32
    }

    /// Resolve a wire value, `None` for values outside the tag space
    pub fn from_wire(value: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.wire() == value)
    }

    /// Encoded size for tags whose payload never varies in length
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            DataType::Bool => Some(4),
            DataType::Int8 | DataType::UInt8 => Some(1),
            DataType::Int16 | DataType::UInt16 => Some(2),
            DataType::Int32 | DataType::UInt32 | DataType::Float => Some(4),
            DataType::Int64 | DataType::UInt64 | DataType::Double => Some(8),
            DataType::Rational | DataType::Point => Some(8),
            DataType::Rect => Some(16),
            DataType::Time => Some(28),
            DataType::PictureStyleDesc => Some(32),
            _ => None,
        }
    }

    /// Size of one element for count-prefixed tags
    pub const fn element_size(self) -> Option<usize> {
        match self {
            DataType::String | DataType::ByteBlock => Some(1),
            DataType::BoolArray => Some(4),
            DataType::Int8Array | DataType::UInt8Array => Some(1),
            DataType::Int16Array | DataType::UInt16Array => Some(2),
            DataType::Int32Array | DataType::UInt32Array => Some(4),
            DataType::RationalArray => Some(8),
            DataType::FocusInfo => Some(crate::value::FocusPoint::ENCODED_LEN),
            _ => None,
        }
    }

    /// Whether the payload is an element array with a count prefix
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            DataType::BoolArray
                | DataType::Int8Array
                | DataType::Int16Array
                | DataType::Int32Array
                | DataType::UInt8Array
                | DataType::UInt16Array
                | DataType::UInt32Array
                | DataType::RationalArray
        )
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl TryFrom<u32> for DataType {
    type Error = crate::CodecError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_wire(value).ok_or(crate::CodecError::UnknownTag(value))
    }
}
