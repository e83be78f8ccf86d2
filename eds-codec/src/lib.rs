//! Tagged property values and their wire codec
//!
//! Camera properties are dynamically typed: the device reports a
//! [`DataType`] tag next to every payload. This crate models the payload as
//! the closed enum [`TaggedValue`] and converts it to and from the fixed
//! little-endian wire layout documented in [`codec`].
//!
//! # Quick Start
//!
//! ```rust
//! use eds_codec::{decode, encode, DataType, Rational, TaggedValue};
//!
//! let value = TaggedValue::Rational(Rational::new(1, 250));
//! let bytes = encode(&value).unwrap();
//! assert_eq!(decode(DataType::Rational, &bytes).unwrap(), value);
//!
//! // A tag that disagrees with the payload is an error, never a reinterpretation
//! assert!(decode(DataType::Time, &bytes).is_err());
//! ```

pub mod codec;
pub mod data_type;
pub mod desc;
pub mod error;
pub mod value;

pub use codec::{decode, encode, encode_as};
pub use data_type::DataType;
pub use desc::{Access, PropertyDesc, PROPERTY_DESC_CAPACITY, PROPERTY_DESC_ENCODED_LEN};
pub use error::{CodecError, Result};
pub use value::{
    FocusInfo, FocusPoint, PictureStyleDesc, Point, Rational, Rect, Size, TaggedValue, Time,
    FOCUS_POINT_CAPACITY,
};
