//! Wire encoding for tagged values
//!
//! All payloads are little-endian with no padding. Fields are written in
//! declaration order. Variable-length payloads start with a `u32` element
//! count and are followed by exactly that many elements:
//!
//! | Tag                  | Layout                                                 |
//! |----------------------|--------------------------------------------------------|
//! | `Bool`               | `u32`, zero is false                                   |
//! | integers             | native width                                           |
//! | `Float` / `Double`   | IEEE-754 `f32` / `f64`                                 |
//! | `String`             | `u32` byte count, UTF-8 bytes                          |
//! | `ByteBlock`          | `u32` byte count, bytes                                |
//! | `Rational`           | `i32` numerator, `u32` denominator                     |
//! | `Point`              | `i32` x, `i32` y                                       |
//! | `Rect`               | `i32` x, `i32` y, `i32` width, `i32` height            |
//! | `Time`               | seven `u32` fields, year first                         |
//! | `*Array`             | `u32` count, elements in their scalar layout           |
//! | `FocusInfo`          | `Rect`, `u32` count, 32-byte points, `u32` execute mode|
//! | `PictureStyleDesc`   | eight 32-bit fields                                    |

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::data_type::DataType;
use crate::error::{CodecError, Result};
use crate::value::{
    FocusInfo, FocusPoint, PictureStyleDesc, Point, Rational, Rect, TaggedValue, Time,
    FOCUS_POINT_CAPACITY,
};

const COUNT_LEN: usize = 4;
const FOCUS_INFO_OVERHEAD: usize = 16 + COUNT_LEN + 4;

/// Encode a value under its own tag
pub fn encode(value: &TaggedValue) -> Result<Bytes> {
    let tag = value.data_type();
    let mut buf = BytesMut::with_capacity(tag.fixed_size().unwrap_or(64));

    match value {
        TaggedValue::Bool(v) => buf.put_u32_le(u32::from(*v)),
        TaggedValue::String(v) => put_counted(&mut buf, tag, v.as_bytes())?,
        TaggedValue::Int8(v) => buf.put_i8(*v),
        TaggedValue::Int16(v) => buf.put_i16_le(*v),
        TaggedValue::Int32(v) => buf.put_i32_le(*v),
        TaggedValue::Int64(v) => buf.put_i64_le(*v),
        TaggedValue::UInt8(v) => buf.put_u8(*v),
        TaggedValue::UInt16(v) => buf.put_u16_le(*v),
        TaggedValue::UInt32(v) => buf.put_u32_le(*v),
        TaggedValue::UInt64(v) => buf.put_u64_le(*v),
        TaggedValue::Float(v) => buf.put_f32_le(*v),
        TaggedValue::Double(v) => buf.put_f64_le(*v),
        TaggedValue::ByteBlock(v) => put_counted(&mut buf, tag, v)?,
        TaggedValue::Rational(v) => put_rational(&mut buf, v),
        TaggedValue::Point(v) => put_point(&mut buf, v),
        TaggedValue::Rect(v) => put_rect(&mut buf, v),
        TaggedValue::Time(v) => put_time(&mut buf, v),
        TaggedValue::BoolArray(items) => {
            put_count(&mut buf, tag, items.len())?;
            items.iter().for_each(|v| buf.put_u32_le(u32::from(*v)));
        }
        TaggedValue::Int8Array(items) => {
            put_count(&mut buf, tag, items.len())?;
            items.iter().for_each(|v| buf.put_i8(*v));
        }
        TaggedValue::Int16Array(items) => {
            put_count(&mut buf, tag, items.len())?;
            items.iter().for_each(|v| buf.put_i16_le(*v));
        }
        TaggedValue::Int32Array(items) => {
            put_count(&mut buf, tag, items.len())?;
            items.iter().for_each(|v| buf.put_i32_le(*v));
        }
        TaggedValue::UInt8Array(items) => put_counted(&mut buf, tag, items)?,
        TaggedValue::UInt16Array(items) => {
            put_count(&mut buf, tag, items.len())?;
            items.iter().for_each(|v| buf.put_u16_le(*v));
        }
        TaggedValue::UInt32Array(items) => {
            put_count(&mut buf, tag, items.len())?;
            items.iter().for_each(|v| buf.put_u32_le(*v));
        }
        TaggedValue::RationalArray(items) => {
            put_count(&mut buf, tag, items.len())?;
            items.iter().for_each(|v| put_rational(&mut buf, v));
        }
        TaggedValue::FocusInfo(info) => put_focus_info(&mut buf, info)?,
        TaggedValue::PictureStyleDesc(v) => put_picture_style(&mut buf, v),
    }

    Ok(buf.freeze())
}

/// Encode a value under an explicit tag
///
/// Fails with [`CodecError::TagMismatch`] when the value's shape is not the
/// requested tag. No numeric coercion is attempted.
pub fn encode_as(tag: DataType, value: &TaggedValue) -> Result<Bytes> {
    let actual = value.data_type();
    if actual != tag {
        return Err(CodecError::TagMismatch { tag, actual });
    }
    encode(value)
}

/// Decode a payload under the given tag
pub fn decode(tag: DataType, bytes: &[u8]) -> Result<TaggedValue> {
    if let Some(size) = tag.fixed_size() {
        expect_len(tag, size, bytes.len())?;
    }
    let mut buf = bytes;

    let value = match tag {
        DataType::Unknown => return Err(CodecError::Unrepresentable(tag)),
        DataType::Bool => TaggedValue::Bool(buf.get_u32_le() != 0),
        DataType::String => {
            let raw = take_counted(tag, &mut buf)?;
            let text = std::str::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8 { tag })?;
            TaggedValue::String(text.to_owned())
        }
        DataType::Int8 => TaggedValue::Int8(buf.get_i8()),
        DataType::Int16 => TaggedValue::Int16(buf.get_i16_le()),
        DataType::Int32 => TaggedValue::Int32(buf.get_i32_le()),
        DataType::Int64 => TaggedValue::Int64(buf.get_i64_le()),
        DataType::UInt8 => TaggedValue::UInt8(buf.get_u8()),
        DataType::UInt16 => TaggedValue::UInt16(buf.get_u16_le()),
        DataType::UInt32 => TaggedValue::UInt32(buf.get_u32_le()),
        DataType::UInt64 => TaggedValue::UInt64(buf.get_u64_le()),
        DataType::Float => TaggedValue::Float(buf.get_f32_le()),
        DataType::Double => TaggedValue::Double(buf.get_f64_le()),
        DataType::ByteBlock => TaggedValue::ByteBlock(take_counted(tag, &mut buf)?.to_vec()),
        DataType::Rational => TaggedValue::Rational(get_rational(&mut buf)),
        DataType::Point => TaggedValue::Point(get_point(&mut buf)),
        DataType::Rect => TaggedValue::Rect(get_rect(&mut buf)),
        DataType::Time => TaggedValue::Time(get_time(&mut buf)),
        DataType::BoolArray => {
            let count = read_count(tag, &mut buf)?;
            TaggedValue::BoolArray((0..count).map(|_| buf.get_u32_le() != 0).collect())
        }
        DataType::Int8Array => {
            let count = read_count(tag, &mut buf)?;
            TaggedValue::Int8Array((0..count).map(|_| buf.get_i8()).collect())
        }
        DataType::Int16Array => {
            let count = read_count(tag, &mut buf)?;
            TaggedValue::Int16Array((0..count).map(|_| buf.get_i16_le()).collect())
        }
        DataType::Int32Array => {
            let count = read_count(tag, &mut buf)?;
            TaggedValue::Int32Array((0..count).map(|_| buf.get_i32_le()).collect())
        }
        DataType::UInt8Array => TaggedValue::UInt8Array(take_counted(tag, &mut buf)?.to_vec()),
        DataType::UInt16Array => {
            let count = read_count(tag, &mut buf)?;
            TaggedValue::UInt16Array((0..count).map(|_| buf.get_u16_le()).collect())
        }
        DataType::UInt32Array => {
            let count = read_count(tag, &mut buf)?;
            TaggedValue::UInt32Array((0..count).map(|_| buf.get_u32_le()).collect())
        }
        DataType::RationalArray => {
            let count = read_count(tag, &mut buf)?;
            TaggedValue::RationalArray((0..count).map(|_| get_rational(&mut buf)).collect())
        }
        DataType::FocusInfo => TaggedValue::FocusInfo(Box::new(get_focus_info(&mut buf)?)),
        DataType::PictureStyleDesc => TaggedValue::PictureStyleDesc(get_picture_style(&mut buf)),
    };

    Ok(value)
}

fn expect_len(tag: DataType, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CodecError::LengthMismatch {
            tag,
            expected,
            actual,
        })
    }
}

fn put_count(buf: &mut BytesMut, tag: DataType, count: usize) -> Result<()> {
    let count32 = u32::try_from(count).map_err(|_| CodecError::CapacityExceeded {
        tag,
        count,
        capacity: u32::MAX as usize,
    })?;
    buf.put_u32_le(count32);
    Ok(())
}

fn put_counted(buf: &mut BytesMut, tag: DataType, bytes: &[u8]) -> Result<()> {
    put_count(buf, tag, bytes.len())?;
    buf.put_slice(bytes);
    Ok(())
}

/// Read the count prefix and check the remaining length against it
fn read_count(tag: DataType, buf: &mut &[u8]) -> Result<usize> {
    let total = buf.remaining();
    if total < COUNT_LEN {
        return Err(CodecError::MissingCount { tag });
    }
    let element = tag.element_size().unwrap_or(1);
    let count = buf.get_u32_le() as usize;
    let expected = count
        .checked_mul(element)
        .and_then(|n| n.checked_add(COUNT_LEN))
        .unwrap_or(usize::MAX);
    expect_len(tag, expected, total)?;
    Ok(count)
}

fn take_counted<'a>(tag: DataType, buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let count = read_count(tag, buf)?;
    let (head, tail) = buf.split_at(count);
    *buf = tail;
    Ok(head)
}

fn put_rational(buf: &mut BytesMut, v: &Rational) {
    buf.put_i32_le(v.numerator);
    buf.put_u32_le(v.denominator);
}

fn get_rational(buf: &mut &[u8]) -> Rational {
    let numerator = buf.get_i32_le();
    let denominator = buf.get_u32_le();
    Rational::new(numerator, denominator)
}

fn put_point(buf: &mut BytesMut, v: &Point) {
    buf.put_i32_le(v.x);
    buf.put_i32_le(v.y);
}

fn get_point(buf: &mut &[u8]) -> Point {
    let x = buf.get_i32_le();
    let y = buf.get_i32_le();
    Point::new(x, y)
}

fn put_rect(buf: &mut BytesMut, v: &Rect) {
    put_point(buf, &v.point);
    buf.put_i32_le(v.size.width);
    buf.put_i32_le(v.size.height);
}

fn get_rect(buf: &mut &[u8]) -> Rect {
    let point = get_point(buf);
    let width = buf.get_i32_le();
    let height = buf.get_i32_le();
    Rect::new(point.x, point.y, width, height)
}

fn put_time(buf: &mut BytesMut, v: &Time) {
    for field in [
        v.year,
        v.month,
        v.day,
        v.hour,
        v.minute,
        v.second,
        v.milliseconds,
    ] {
        buf.put_u32_le(field);
    }
}

fn get_time(buf: &mut &[u8]) -> Time {
    let mut next = || buf.get_u32_le();
    Time {
        year: next(),
        month: next(),
        day: next(),
        hour: next(),
        minute: next(),
        second: next(),
        milliseconds: next(),
    }
}

fn put_focus_info(buf: &mut BytesMut, info: &FocusInfo) -> Result<()> {
    if info.points.len() > FOCUS_POINT_CAPACITY {
        return Err(CodecError::CapacityExceeded {
            tag: DataType::FocusInfo,
            count: info.points.len(),
            capacity: FOCUS_POINT_CAPACITY,
        });
    }
    put_rect(buf, &info.image_rect);
    put_count(buf, DataType::FocusInfo, info.points.len())?;
    for point in &info.points {
        buf.put_u32_le(u32::from(point.valid));
        buf.put_u32_le(u32::from(point.selected));
        buf.put_u32_le(point.just_focus);
        put_rect(buf, &point.rect);
        buf.put_u32_le(point.reserved);
    }
    buf.put_u32_le(info.execute_mode);
    Ok(())
}

fn get_focus_info(buf: &mut &[u8]) -> Result<FocusInfo> {
    let tag = DataType::FocusInfo;
    let total = buf.remaining();
    if total < FOCUS_INFO_OVERHEAD {
        return Err(CodecError::LengthMismatch {
            tag,
            expected: FOCUS_INFO_OVERHEAD,
            actual: total,
        });
    }

    let image_rect = get_rect(buf);
    let count = buf.get_u32_le() as usize;
    if count > FOCUS_POINT_CAPACITY {
        return Err(CodecError::CapacityExceeded {
            tag,
            count,
            capacity: FOCUS_POINT_CAPACITY,
        });
    }
    expect_len(
        tag,
        FOCUS_INFO_OVERHEAD + count * FocusPoint::ENCODED_LEN,
        total,
    )?;

    let points = (0..count)
        .map(|_| {
            let valid = buf.get_u32_le() != 0;
            let selected = buf.get_u32_le() != 0;
            let just_focus = buf.get_u32_le();
            let rect = get_rect(buf);
            let reserved = buf.get_u32_le();
            FocusPoint {
                valid,
                selected,
                just_focus,
                rect,
                reserved,
            }
        })
        .collect();
    let execute_mode = buf.get_u32_le();

    Ok(FocusInfo {
        image_rect,
        points,
        execute_mode,
    })
}

fn put_picture_style(buf: &mut BytesMut, v: &PictureStyleDesc) {
    buf.put_i32_le(v.contrast);
    buf.put_u32_le(v.sharpness);
    buf.put_i32_le(v.saturation);
    buf.put_i32_le(v.color_tone);
    buf.put_u32_le(v.filter_effect);
    buf.put_u32_le(v.toning_effect);
    buf.put_u32_le(v.sharp_fineness);
    buf.put_u32_le(v.sharp_threshold);
}

fn get_picture_style(buf: &mut &[u8]) -> PictureStyleDesc {
    PictureStyleDesc {
        contrast: buf.get_i32_le(),
        sharpness: buf.get_u32_le(),
        saturation: buf.get_i32_le(),
        color_tone: buf.get_i32_le(),
        filter_effect: buf.get_u32_le(),
        toning_effect: buf.get_u32_le(),
        sharp_fineness: buf.get_u32_le(),
        sharp_threshold: buf.get_u32_le(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint32_layout() {
        let bytes = encode(&TaggedValue::UInt32(400)).unwrap();
        assert_eq!(&bytes[..], &[0x90, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_rect_layout() {
        let bytes = encode(&TaggedValue::Rect(Rect::new(1, 2, 3, 4))).unwrap();
        assert_eq!(
            &bytes[..],
            &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0]
        );
    }

    #[test]
    fn test_string_is_count_prefixed() {
        let bytes = encode(&TaggedValue::from("EOS")).unwrap();
        assert_eq!(&bytes[..], &[3, 0, 0, 0, b'E', b'O', b'S']);
        assert_eq!(
            decode(DataType::String, &bytes).unwrap(),
            TaggedValue::from("EOS")
        );
    }

    #[test]
    fn test_fixed_length_mismatch() {
        let err = decode(DataType::UInt32, &[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            CodecError::LengthMismatch {
                tag: DataType::UInt32,
                expected: 4,
                actual: 3
            }
        );
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_array_count_disagrees_with_payload() {
        let mut raw = vec![3, 0, 0, 0];
        raw.extend_from_slice(&[0; 8]);
        let err = decode(DataType::UInt32Array, &raw).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LengthMismatch {
                expected: 16,
                actual: 12,
                ..
            }
        ));
    }

    #[test]
    fn test_huge_count_does_not_overflow() {
        let raw = [0xff, 0xff, 0xff, 0xff];
        assert!(decode(DataType::RationalArray, &raw).is_err());
    }

    #[test]
    fn test_missing_count() {
        assert_eq!(
            decode(DataType::ByteBlock, &[1, 0]).unwrap_err(),
            CodecError::MissingCount {
                tag: DataType::ByteBlock
            }
        );
    }

    #[test]
    fn test_encode_as_rejects_other_shape() {
        let err = encode_as(DataType::UInt32, &TaggedValue::Int32(400)).unwrap_err();
        assert_eq!(
            err,
            CodecError::TagMismatch {
                tag: DataType::UInt32,
                actual: DataType::Int32
            }
        );
    }

    #[test]
    fn test_unknown_tag_has_no_layout() {
        assert_eq!(
            decode(DataType::Unknown, &[]).unwrap_err(),
            CodecError::Unrepresentable(DataType::Unknown)
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let raw = [2, 0, 0, 0, 0xc3, 0x28];
        assert_eq!(
            decode(DataType::String, &raw).unwrap_err(),
            CodecError::InvalidUtf8 {
                tag: DataType::String
            }
        );
    }

    #[test]
    fn test_focus_info_capacity() {
        let info = FocusInfo {
            points: vec![FocusPoint::default(); FOCUS_POINT_CAPACITY + 1],
            ..FocusInfo::default()
        };
        assert!(matches!(
            encode(&TaggedValue::from(info)),
            Err(CodecError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_focus_info_layout_length() {
        let info = FocusInfo {
            image_rect: Rect::new(0, 0, 6000, 4000),
            points: vec![FocusPoint::default(); 3],
            execute_mode: 1,
        };
        let bytes = encode(&TaggedValue::from(info.clone())).unwrap();
        assert_eq!(bytes.len(), FOCUS_INFO_OVERHEAD + 3 * FocusPoint::ENCODED_LEN);
        assert_eq!(
            decode(DataType::FocusInfo, &bytes).unwrap(),
            TaggedValue::from(info)
        );
    }

    #[test]
    fn test_bool_nonzero_is_true() {
        assert_eq!(
            decode(DataType::Bool, &[7, 0, 0, 0]).unwrap(),
            TaggedValue::Bool(true)
        );
    }
}
