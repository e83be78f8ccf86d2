//! Image quality bit-field
//!
//! An `ImageQuality` word packs one or two image formats. The high half
//! describes the primary image and the low half an optional secondary
//! image (RAW + JPEG combinations):
//!
//! | Bits  | Field                        |
//! |-------|------------------------------|
//! | 24-31 | primary size                 |
//! | 20-23 | primary type                 |
//! | 16-19 | primary compression          |
//! | 8-15  | secondary size (`ff` = none) |
//! | 4-7   | secondary type               |
//! | 0-3   | secondary compression        |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::{CompressQuality, ImageSize, ImageType};

/// Decoded half of an [`ImageQuality`] word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageFormat {
    pub size: Option<ImageSize>,
    pub kind: Option<ImageType>,
    pub compression: Option<CompressQuality>,
}

impl ImageFormat {
    fn from_fields(size: u32, kind: u32, compression: u32) -> Self {
        Self {
            size: ImageSize::from_wire(size),
            kind: ImageType::from_wire(kind),
            compression: CompressQuality::from_wire(compression),
        }
    }
}

/// Raw image quality word as carried by the `ImageQuality` property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageQuality(pub u32);

impl ImageQuality {
    /// RAW
    pub const LR: ImageQuality = ImageQuality(0x0064_ff0f);
    /// RAW + large fine JPEG
    pub const LRLJF: ImageQuality = ImageQuality(0x0064_0013);
    /// RAW + large normal JPEG
    pub const LRLJN: ImageQuality = ImageQuality(0x0064_0012);
    /// Large fine JPEG
    pub const LJF: ImageQuality = ImageQuality(0x0013_ff0f);
    /// Large normal JPEG
    pub const LJN: ImageQuality = ImageQuality(0x0012_ff0f);
    /// Middle fine JPEG
    pub const MJF: ImageQuality = ImageQuality(0x0113_ff0f);
    /// Small fine JPEG
    pub const S1JF: ImageQuality = ImageQuality(0x0e13_ff0f);
    /// Compact RAW
    pub const CR: ImageQuality = ImageQuality(0x0063_ff0f);
    /// Large fine HEIF
    pub const LHF: ImageQuality = ImageQuality(0x0083_ff0f);
    pub const UNKNOWN: ImageQuality = ImageQuality(0xffff_ffff);

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub fn primary(self) -> ImageFormat {
        let word = self.0;
        ImageFormat::from_fields(word >> 24, (word >> 20) & 0xf, (word >> 16) & 0xf)
    }

    /// Secondary image, `None` when the word describes a single image
    pub fn secondary(self) -> Option<ImageFormat> {
        let word = self.0;
        let size = (word >> 8) & 0xff;
        if size == 0xff || self == Self::UNKNOWN {
            return None;
        }
        Some(ImageFormat::from_fields(size, (word >> 4) & 0xf, word & 0xf))
    }

    pub fn has_raw(self) -> bool {
        std::iter::once(self.primary())
            .chain(self.secondary())
            .any(|format| matches!(format.kind, Some(ImageType::Raw | ImageType::Cr2)))
    }
}

impl From<u32> for ImageQuality {
    fn from(value: u32) -> Self {
        ImageQuality(value)
    }
}

impl From<ImageQuality> for u32 {
    fn from(value: ImageQuality) -> u32 {
        value.0
    }
}

impl fmt::Display for ImageQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
