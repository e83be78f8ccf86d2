//! Property identifiers and their fixed shapes
//!
//! Every identifier the workspace supports is listed here with its exact
//! wire value. [`PropertyId::spec`] gives the payload tag, access mode and
//! the reference categories the property applies to. The `Unknown` member
//! is what a device reports when it cannot say which property changed; it
//! never resolves to a spec.

use eds_codec::{Access, DataType};

use crate::handle::RefKind;

wire_enum! {
    /// Property identifier
    pub enum PropertyId: u32 {
        ProductName = 0x0000_0002,
        OwnerName = 0x0000_0004,
        MakerName = 0x0000_0005,
        DateTime = 0x0000_0006,
        FirmwareVersion = 0x0000_0007,
        BatteryLevel = 0x0000_0008,
        SaveTo = 0x0000_000b,
        CurrentStorage = 0x0000_000c,
        CurrentFolder = 0x0000_000d,
        BatteryQuality = 0x0000_0010,
        BodyIdEx = 0x0000_0015,
        HdDirectoryStructure = 0x0000_0020,

        ImageQuality = 0x0000_0100,
        Orientation = 0x0000_0102,
        IccProfile = 0x0000_0103,
        FocusInfo = 0x0000_0104,
        WhiteBalance = 0x0000_0106,
        ColorTemperature = 0x0000_0107,
        WhiteBalanceShift = 0x0000_0108,
        ColorSpace = 0x0000_010d,
        PictureStyle = 0x0000_0114,
        PictureStyleDesc = 0x0000_0115,
        PictureStyleCaption = 0x0000_0200,

        GpsVersionId = 0x0000_0800,
        GpsLatitudeRef = 0x0000_0801,
        GpsLatitude = 0x0000_0802,
        GpsLongitudeRef = 0x0000_0803,
        GpsLongitude = 0x0000_0804,
        GpsAltitudeRef = 0x0000_0805,
        GpsAltitude = 0x0000_0806,
        GpsTimeStamp = 0x0000_0807,
        GpsSatellites = 0x0000_0808,
        GpsStatus = 0x0000_0809,
        GpsMapDatum = 0x0000_0812,
        GpsDateStamp = 0x0000_081d,

        AeMode = 0x0000_0400,
        DriveMode = 0x0000_0401,
        IsoSpeed = 0x0000_0402,
        MeteringMode = 0x0000_0403,
        AfMode = 0x0000_0404,
        Av = 0x0000_0405,
        Tv = 0x0000_0406,
        ExposureCompensation = 0x0000_0407,
        FocalLength = 0x0000_0409,
        AvailableShots = 0x0000_040a,
        Bracket = 0x0000_040b,
        WhiteBalanceBracket = 0x0000_040c,
        LensName = 0x0000_040d,
        AeBracket = 0x0000_040e,
        FeBracket = 0x0000_040f,
        IsoBracket = 0x0000_0410,
        NoiseReduction = 0x0000_0411,
        FlashOn = 0x0000_0412,
        RedEye = 0x0000_0413,
        FlashMode = 0x0000_0414,
        LensStatus = 0x0000_0416,
        Artist = 0x0000_0418,
        Copyright = 0x0000_0419,
        AeModeSelect = 0x0000_0436,
        PowerZoomSpeed = 0x0000_0444,
        ColorFilter = 0x0000_047f,
        DigitalZoomSetting = 0x0000_0477,
        AfLockState = 0x0000_0480,
        BrightnessSetting = 0x0000_0483,

        EvfOutputDevice = 0x0000_0500,
        EvfMode = 0x0000_0501,
        EvfWhiteBalance = 0x0000_0502,
        EvfColorTemperature = 0x0000_0503,
        EvfDepthOfFieldPreview = 0x0000_0504,
        EvfZoom = 0x0000_0507,
        EvfZoomPosition = 0x0000_0508,
        EvfHistogram = 0x0000_050a,
        EvfImagePosition = 0x0000_050b,
        EvfHistogramStatus = 0x0000_050c,
        EvfAfMode = 0x0000_050e,
        Record = 0x0000_0510,
        EvfHistogramY = 0x0000_0515,
        EvfHistogramR = 0x0000_0516,
        EvfHistogramG = 0x0000_0517,
        EvfHistogramB = 0x0000_0518,
        EvfCoordinateSystem = 0x0000_0540,
        EvfZoomRect = 0x0000_0541,
        EvfImageClipRect = 0x0000_0545,
        EvfPowerZoomCurPosition = 0x0000_0550,
        EvfPowerZoomMaxPosition = 0x0000_0551,
        EvfPowerZoomMinPosition = 0x0000_0552,

        UtcTime = 0x0100_0016,
        TimeZone = 0x0100_0017,
        SummerTimeSetting = 0x0100_0018,
        ManualWhiteBalanceData = 0x0100_0204,
        TempStatus = 0x0100_0415,
        MirrorLockUpState = 0x0100_0421,
        FixedMovie = 0x0100_0422,
        MovieParam = 0x0100_0423,
        Aspect = 0x0100_0431,
        ContinuousAfMode = 0x0100_0433,
        MirrorUpSetting = 0x0100_0438,
        MovieServoAf = 0x0100_043e,
        AutoPowerOffSetting = 0x0100_045e,
        AfEyeDetect = 0x0100_0455,
        FocusShiftSetting = 0x0100_0457,
        MovieHfrSetting = 0x0100_045d,
        AfTrackingObject = 0x0100_0468,
        RegisterFocusEdge = 0x0100_046c,
        DriveFocusToEdge = 0x0100_046d,
        FocusPosition = 0x0100_046e,
        StillMovieDivideSetting = 0x0100_0470,
        CardExtension = 0x0100_0471,
        MovieCardExtension = 0x0100_0472,
        StillCurrentMedia = 0x0100_0473,
        MovieCurrentMedia = 0x0100_0474,
        ApertureLockSetting = 0x0100_0476,
        LensIsSetting = 0x0100_04c0,
        ScreenDimmerTime = 0x0100_04c1,
        ScreenOffTime = 0x0100_04c2,
        ViewfinderOffTime = 0x0100_04c3,
        EvfClickWbCoeffs = 0x0100_0506,
        EvfRollingPitching = 0x0100_0544,
        EvfVisibleRect = 0x0100_0546,

        DcZoom = 0x0000_0600,
        DcStrobe = 0x0000_0601,
        LensBarrelStatus = 0x0000_0605,

        /// The device could not identify the property
        Unknown = 0x0000_ffff,
    }
}

const LIMITED_RANGE: u32 = 0x0100_0000;

/// Reference categories a property can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Targets(u8);

impl Targets {
    pub const CAMERA: Targets = Targets(0b001);
    pub const ITEM: Targets = Targets(0b010);
    pub const EVF_IMAGE: Targets = Targets(0b100);

    pub const fn union(self, other: Targets) -> Targets {
        Targets(self.0 | other.0)
    }

    pub const fn contains(self, kind: RefKind) -> bool {
        let bit = match kind {
            RefKind::Camera => Self::CAMERA.0,
            RefKind::DirectoryItem => Self::ITEM.0,
            RefKind::EvfImage => Self::EVF_IMAGE.0,
            RefKind::CameraList | RefKind::Volume => 0,
        };
        self.0 & bit != 0
    }
}

/// Fixed shape and access rules of one property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    pub data_type: DataType,
    pub access: Access,
    pub targets: Targets,
    /// Whether the device reports an enumerable value set for it
    pub describable: bool,
}

impl PropertySpec {
    fn new(data_type: DataType, access: Access) -> Self {
        Self {
            data_type,
            access,
            targets: Targets::CAMERA,
            describable: false,
        }
    }

    fn on(mut self, targets: Targets) -> Self {
        self.targets = targets;
        self
    }

    fn described(mut self) -> Self {
        self.describable = true;
        self
    }

    pub fn applies_to(&self, kind: RefKind) -> bool {
        self.targets.contains(kind)
    }
}

fn read(data_type: DataType) -> PropertySpec {
    PropertySpec::new(data_type, Access::Read)
}

fn read_write(data_type: DataType) -> PropertySpec {
    PropertySpec::new(data_type, Access::ReadWrite)
}

fn write(data_type: DataType) -> PropertySpec {
    PropertySpec::new(data_type, Access::Write)
}

impl PropertyId {
    /// Shape, access and applicability, `None` only for `Unknown`
    pub fn spec(self) -> Option<PropertySpec> {
        use DataType::*;
        use PropertyId as P;

        let image = Targets::CAMERA.union(Targets::ITEM);
        let evf = Targets::CAMERA.union(Targets::EVF_IMAGE);

        let spec = match self {
            P::Unknown => return None,

            P::ProductName | P::MakerName | P::FirmwareVersion => read(String),
            P::CurrentStorage | P::CurrentFolder | P::BodyIdEx => read(String),
            P::HdDirectoryStructure => read(String),
            P::OwnerName | P::Artist | P::Copyright => read_write(String),
            P::DateTime | P::UtcTime => read_write(Time),
            P::BatteryLevel | P::BatteryQuality => read(UInt32),
            P::SaveTo => read_write(UInt32),

            P::ImageQuality | P::WhiteBalance | P::ColorSpace | P::PictureStyle => {
                let data_type = if self == P::WhiteBalance { Int32 } else { UInt32 };
                read_write(data_type).on(image).described()
            }
            P::Orientation => read(UInt32).on(Targets::ITEM),
            P::IccProfile => read(ByteBlock).on(Targets::ITEM),
            P::FocusInfo => read(FocusInfo).on(image),
            P::ColorTemperature => read_write(UInt32).on(image),
            P::WhiteBalanceShift => read_write(Int32Array).on(image),
            P::PictureStyleDesc => read_write(PictureStyleDesc).on(image),
            P::PictureStyleCaption => read(String).on(image),

            P::GpsVersionId => read(UInt8Array).on(Targets::ITEM),
            P::GpsLatitudeRef | P::GpsLongitudeRef => read(String).on(Targets::ITEM),
            P::GpsLatitude | P::GpsLongitude | P::GpsTimeStamp => {
                read(RationalArray).on(Targets::ITEM)
            }
            P::GpsAltitudeRef => read(UInt8).on(Targets::ITEM),
            P::GpsAltitude => read(Rational).on(Targets::ITEM),
            P::GpsSatellites | P::GpsStatus | P::GpsMapDatum | P::GpsDateStamp => {
                read(String).on(Targets::ITEM)
            }

            P::AeMode => read(UInt32).described(),
            P::DriveMode | P::IsoSpeed | P::MeteringMode | P::AfMode => {
                read_write(UInt32).described()
            }
            P::Av | P::Tv | P::ExposureCompensation | P::AeModeSelect => {
                read_write(UInt32).described()
            }
            P::FocalLength => read(RationalArray).on(image),
            P::AvailableShots | P::Bracket | P::NoiseReduction => read(UInt32),
            P::FlashOn | P::RedEye | P::LensStatus | P::AfLockState => read(UInt32),
            P::WhiteBalanceBracket => read(Int32Array),
            P::LensName => read(String).on(image),
            P::AeBracket | P::FeBracket | P::IsoBracket => read(Rational),
            P::FlashMode => read(UInt32Array),
            P::PowerZoomSpeed | P::DigitalZoomSetting | P::BrightnessSetting => {
                read_write(UInt32)
            }
            P::ColorFilter => read_write(UInt32).described(),

            P::EvfOutputDevice | P::EvfMode | P::EvfColorTemperature => read_write(UInt32),
            P::EvfDepthOfFieldPreview | P::Record => read_write(UInt32),
            P::EvfWhiteBalance => read_write(Int32).described(),
            P::EvfAfMode => read_write(UInt32).described(),
            P::EvfZoom => read_write(UInt32).on(evf),
            P::EvfZoomPosition => read_write(Point).on(evf),
            P::EvfHistogram => read(UInt32Array).on(Targets::EVF_IMAGE),
            P::EvfHistogramY | P::EvfHistogramR | P::EvfHistogramG | P::EvfHistogramB => {
                read(UInt32Array).on(Targets::EVF_IMAGE)
            }
            P::EvfImagePosition => read(Point).on(Targets::EVF_IMAGE),
            P::EvfHistogramStatus => read(UInt32).on(Targets::EVF_IMAGE),
            P::EvfCoordinateSystem => read(Point).on(Targets::EVF_IMAGE),
            P::EvfZoomRect | P::EvfImageClipRect => read(Rect).on(Targets::EVF_IMAGE),
            P::EvfPowerZoomCurPosition
            | P::EvfPowerZoomMaxPosition
            | P::EvfPowerZoomMinPosition => read(UInt32),

            P::TimeZone | P::SummerTimeSetting | P::AutoPowerOffSetting => read_write(UInt32),
            P::ManualWhiteBalanceData => write(ByteBlock),
            P::TempStatus | P::MirrorLockUpState | P::FixedMovie | P::MovieParam => {
                read(UInt32)
            }
            P::FocusPosition => read(UInt32),
            P::Aspect => read_write(UInt32).described(),
            P::ContinuousAfMode | P::MirrorUpSetting | P::MovieServoAf => read_write(UInt32),
            P::AfEyeDetect | P::MovieHfrSetting | P::AfTrackingObject => read_write(UInt32),
            P::StillMovieDivideSetting | P::CardExtension | P::MovieCardExtension => {
                read_write(UInt32)
            }
            P::StillCurrentMedia | P::MovieCurrentMedia | P::LensIsSetting => {
                read_write(UInt32)
            }
            P::ScreenDimmerTime | P::ScreenOffTime | P::ViewfinderOffTime => {
                read_write(UInt32)
            }
            P::FocusShiftSetting | P::ApertureLockSetting => read_write(ByteBlock),
            P::RegisterFocusEdge | P::DriveFocusToEdge => write(UInt32),
            P::EvfClickWbCoeffs | P::EvfRollingPitching => read(ByteBlock),
            P::EvfVisibleRect => read(Rect),

            P::DcZoom => read_write(UInt32),
            P::DcStrobe => read_write(UInt32).described(),
            P::LensBarrelStatus => read(UInt32),
        };
        Some(spec)
    }

    /// Whether the identifier is in the extended (limited) range
    pub const fn is_limited(self) -> bool {
        self.wire() & LIMITED_RANGE != 0 && !matches!(self, PropertyId::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_match_identifier_space() {
        assert_eq!(PropertyId::IsoSpeed.wire(), 0x402);
        assert_eq!(PropertyId::EvfMode.wire(), 0x501);
        assert_eq!(PropertyId::GpsDateStamp.wire(), 0x81d);
        assert_eq!(PropertyId::EvfVisibleRect.wire(), 0x0100_0546);
        assert_eq!(PropertyId::Unknown.wire(), 0xffff);
    }

    #[test]
    fn test_wire_values_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for id in PropertyId::ALL {
            assert!(seen.insert(id.wire()), "{id} shares a wire value");
        }
    }

    #[test]
    fn test_unknown_never_resolves() {
        assert!(PropertyId::Unknown.spec().is_none());
        assert_eq!(PropertyId::from_wire(0xffff), Some(PropertyId::Unknown));
    }

    #[test]
    fn test_every_known_identifier_has_a_spec() {
        for id in PropertyId::ALL.iter().filter(|id| **id != PropertyId::Unknown) {
            let spec = id.spec().unwrap();
            assert_ne!(spec.data_type, DataType::Unknown);
        }
    }

    #[test]
    fn test_limited_range() {
        assert!(PropertyId::UtcTime.is_limited());
        assert!(!PropertyId::IsoSpeed.is_limited());
        assert!(!PropertyId::Unknown.is_limited());
    }

    #[test]
    fn test_gps_applies_to_items_only() {
        let spec = PropertyId::GpsLatitude.spec().unwrap();
        assert!(spec.applies_to(RefKind::DirectoryItem));
        assert!(!spec.applies_to(RefKind::Camera));
    }

    #[test]
    fn test_iso_speed_shape() {
        let spec = PropertyId::IsoSpeed.spec().unwrap();
        assert_eq!(spec.data_type, DataType::UInt32);
        assert_eq!(spec.access, Access::ReadWrite);
        assert!(spec.describable);
    }

    #[test]
    fn test_write_only_properties() {
        assert_eq!(
            PropertyId::ManualWhiteBalanceData.spec().unwrap().access,
            Access::Write
        );
    }
}
