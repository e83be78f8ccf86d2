//! The tagged value model
//!
//! [`TaggedValue`] is a closed sum type over every payload shape the device
//! can report. Each variant maps to exactly one [`DataType`], so a value
//! can never disagree with its own tag.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::data_type::DataType;
use crate::error::{CodecError, Result};

/// Maximum number of focus points a [`FocusInfo`] record may carry
pub const FOCUS_POINT_CAPACITY: usize = 1053;

/// Signed numerator over an unsigned denominator
///
/// A zero denominator is representable so that device payloads decode
/// losslessly, but it has no numeric value: [`Rational::to_f64`] rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: i32,
    pub denominator: u32,
}

impl Rational {
    pub const fn new(numerator: i32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Numeric value of the ratio
    pub fn to_f64(&self) -> Result<f64> {
        if self.denominator == 0 {
            return Err(CodecError::ZeroDenominator {
                numerator: self.numerator,
            });
        }
        Ok(f64::from(self.numerator) / f64::from(self.denominator))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// Origin point plus extent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub point: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            point: Point { x, y },
            size: Size { width, height },
        }
    }
}

/// Calendar timestamp as the camera reports it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Time {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub milliseconds: u32,
}

impl Time {
    /// Convert to a chrono timestamp, `None` if the fields are not a valid date
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        let year = i32::try_from(self.year).ok()?;
        NaiveDate::from_ymd_opt(year, self.month, self.day)?.and_hms_milli_opt(
            self.hour,
            self.minute,
            self.second,
            self.milliseconds,
        )
    }

    pub fn from_datetime(value: &NaiveDateTime) -> Self {
        Self {
            year: value.year().max(0) as u32,
            month: value.month(),
            day: value.day(),
            hour: value.hour(),
            minute: value.minute(),
            second: value.second(),
            milliseconds: (value.nanosecond() / 1_000_000).min(999),
        }
    }
}

/// One autofocus point within a [`FocusInfo`] map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FocusPoint {
    pub valid: bool,
    pub selected: bool,
    pub just_focus: u32,
    pub rect: Rect,
    pub reserved: u32,
}

impl FocusPoint {
    pub const ENCODED_LEN: usize = 32;
}

/// Autofocus point map
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FocusInfo {
    pub image_rect: Rect,
    pub points: Vec<FocusPoint>,
    pub execute_mode: u32,
}

impl FocusInfo {
    /// Points that are both valid and in focus
    pub fn focused_points(&self) -> impl Iterator<Item = &FocusPoint> {
        self.points.iter().filter(|p| p.valid && p.just_focus != 0)
    }
}

/// Parameters of one picture style preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PictureStyleDesc {
    pub contrast: i32,
    pub sharpness: u32,
    pub saturation: i32,
    pub color_tone: i32,
    pub filter_effect: u32,
    pub toning_effect: u32,
    pub sharp_fineness: u32,
    pub sharp_threshold: u32,
}

/// A property payload paired with its runtime type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TaggedValue {
    Bool(bool),
    String(String),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    ByteBlock(Vec<u8>),
    Rational(Rational),
    Point(Point),
    Rect(Rect),
    Time(Time),
    BoolArray(Vec<bool>),
    Int8Array(Vec<i8>),
    Int16Array(Vec<i16>),
    Int32Array(Vec<i32>),
    UInt8Array(Vec<u8>),
    UInt16Array(Vec<u16>),
    UInt32Array(Vec<u32>),
    RationalArray(Vec<Rational>),
    FocusInfo(Box<FocusInfo>),
    PictureStyleDesc(PictureStyleDesc),
}

impl TaggedValue {
    /// The tag this value encodes under
    pub fn data_type(&self) -> DataType {
        match self {
            TaggedValue::Bool(_) => DataType::Bool,
            TaggedValue::String(_) => DataType::String,
            TaggedValue::Int8(_) => DataType::Int8,
            TaggedValue::Int16(_) => DataType::Int16,
            TaggedValue::Int32(_) => DataType::Int32,
            TaggedValue::Int64(_) => DataType::Int64,
            TaggedValue::UInt8(_) => DataType::UInt8,
            TaggedValue::UInt16(_) => DataType::UInt16,
            TaggedValue::UInt32(_) => DataType::UInt32,
            TaggedValue::UInt64(_) => DataType::UInt64,
            TaggedValue::Float(_) => DataType::Float,
            TaggedValue::Double(_) => DataType::Double,
            TaggedValue::ByteBlock(_) => DataType::ByteBlock,
            TaggedValue::Rational(_) => DataType::Rational,
            TaggedValue::Point(_) => DataType::Point,
            TaggedValue::Rect(_) => DataType::Rect,
            TaggedValue::Time(_) => DataType::Time,
            TaggedValue::BoolArray(_) => DataType::BoolArray,
            TaggedValue::Int8Array(_) => DataType::Int8Array,
            TaggedValue::Int16Array(_) => DataType::Int16Array,
            TaggedValue::Int32Array(_) => DataType::Int32Array,
            TaggedValue::UInt8Array(_) => DataType::UInt8Array,
            TaggedValue::UInt16Array(_) => DataType::UInt16Array,
            TaggedValue::UInt32Array(_) => DataType::UInt32Array,
            TaggedValue::RationalArray(_) => DataType::RationalArray,
            TaggedValue::FocusInfo(_) => DataType::FocusInfo,
            TaggedValue::PictureStyleDesc(_) => DataType::PictureStyleDesc,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            TaggedValue::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            TaggedValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TaggedValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TaggedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The 32-bit raw pattern of a scalar integer
    ///
    /// This is the representation used by property descriptors, which list
    /// legal values as signed 32-bit words regardless of the property's
    /// declared tag. Wider and non-integer tags have no raw form.
    pub fn raw_word(&self) -> Option<i32> {
        match self {
            TaggedValue::Int8(v) => Some(i32::from(*v)),
            TaggedValue::Int16(v) => Some(i32::from(*v)),
            TaggedValue::Int32(v) => Some(*v),
            TaggedValue::UInt8(v) => Some(i32::from(*v)),
            TaggedValue::UInt16(v) => Some(i32::from(*v)),
            TaggedValue::UInt32(v) => Some(*v as i32),
            _ => None,
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for TaggedValue {
                fn from(value: $ty) -> Self {
                    TaggedValue::$variant(value)
                }
            }
        )+
    };
}

impl_from_scalar! {
    bool => Bool,
    String => String,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    Rational => Rational,
    Point => Point,
    Rect => Rect,
    Time => Time,
    PictureStyleDesc => PictureStyleDesc,
}

impl From<&str> for TaggedValue {
    fn from(value: &str) -> Self {
        TaggedValue::String(value.to_string())
    }
}

impl From<FocusInfo> for TaggedValue {
    fn from(value: FocusInfo) -> Self {
        TaggedValue::FocusInfo(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_zero_denominator_rejected() {
        let r = Rational::new(5, 0);
        assert!(matches!(
            r.to_f64(),
            Err(CodecError::ZeroDenominator { numerator: 5 })
        ));
    }

    #[test]
    fn test_rational_value() {
        assert_eq!(Rational::new(-1, 4).to_f64().unwrap(), -0.25);
    }

    #[test]
    fn test_time_chrono_conversion() {
        let time = Time {
            year: 2024,
            month: 2,
            day: 29,
            hour: 13,
            minute: 5,
            second: 59,
            milliseconds: 250,
        };
        let dt = time.to_datetime().unwrap();
        assert_eq!(Time::from_datetime(&dt), time);
    }

    #[test]
    fn test_time_invalid_date() {
        let time = Time {
            year: 2023,
            month: 2,
            day: 30,
            ..Time::default()
        };
        assert!(time.to_datetime().is_none());
    }

    #[test]
    fn test_value_reports_its_tag() {
        assert_eq!(TaggedValue::from(400u32).data_type(), DataType::UInt32);
        assert_eq!(TaggedValue::from("EOS").data_type(), DataType::String);
        assert_eq!(
            TaggedValue::from(FocusInfo::default()).data_type(),
            DataType::FocusInfo
        );
    }

    #[test]
    fn test_raw_word_is_bit_pattern() {
        assert_eq!(TaggedValue::UInt32(0xffff_ffff).raw_word(), Some(-1));
        assert_eq!(TaggedValue::Int16(-3).raw_word(), Some(-3));
        assert_eq!(TaggedValue::UInt64(1).raw_word(), None);
    }

    #[test]
    fn test_focused_points() {
        let info = FocusInfo {
            points: vec![
                FocusPoint {
                    valid: true,
                    just_focus: 1,
                    ..FocusPoint::default()
                },
                FocusPoint {
                    valid: false,
                    just_focus: 1,
                    ..FocusPoint::default()
                },
            ],
            ..FocusInfo::default()
        };
        assert_eq!(info.focused_points().count(), 1);
    }
}
