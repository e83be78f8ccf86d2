//! Raw value sets of enumerable properties
//!
//! These are the symbolic names for the `UInt32` / `Int32` words that
//! properties such as `SaveTo` or `AeMode` carry. A device may report a
//! value that has no name here; callers keep the raw word in that case.

wire_enum! {
    pub enum SaveTo: u32 {
        Camera = 1,
        Host = 2,
        Both = 3,
    }
}

wire_enum! {
    /// Battery level buckets
    ///
    /// `Error` and `BcLevel` share wire value 0 with `Empty`. They are kept
    /// as separate names; decoding 0 yields `Empty`.
    pub enum BatteryLevel: u32 {
        Empty = 0,
        Low = 9,
        Half = 49,
        Normal = 80,
        Hi = 69,
        Quarter = 19,
        Error = 0,
        BcLevel = 0,
        Ac = 0xFFFF_FFFF,
        Unknown = 0xFFFF_FFFE,
    }
}

wire_enum! {
    pub enum WhiteBalance: i32 {
        Auto = 0,
        Daylight = 1,
        Cloudy = 2,
        Tungsten = 3,
        Fluorescent = 4,
        Strobe = 5,
        WhitePaper = 6,
        Shade = 8,
        ColorTemp = 9,
        PcSet1 = 10,
        PcSet2 = 11,
        PcSet3 = 12,
        WhitePaper2 = 15,
        WhitePaper3 = 16,
        WhitePaper4 = 18,
        WhitePaper5 = 19,
        PcSet4 = 20,
        PcSet5 = 21,
        AwbWhite = 23,
        Click = -1,
        Pasted = -2,
    }
}

wire_enum! {
    pub enum ColorSpace: u32 {
        Srgb = 1,
        AdobeRgb = 2,
        Unknown = 0xFFFF_FFFF,
    }
}

wire_enum! {
    pub enum PictureStyle: u32 {
        Standard = 0x0081,
        Portrait = 0x0082,
        Landscape = 0x0083,
        Neutral = 0x0084,
        Faithful = 0x0085,
        Monochrome = 0x0086,
        Auto = 0x0087,
        FineDetail = 0x0088,
        User1 = 0x0021,
        User2 = 0x0022,
        User3 = 0x0023,
        Pc1 = 0x0041,
        Pc2 = 0x0042,
        Pc3 = 0x0043,
    }
}

wire_enum! {
    /// Shooting mode dial positions
    pub enum AeMode: u32 {
        Program = 0x00,
        Tv = 0x01,
        Av = 0x02,
        Manual = 0x03,
        Bulb = 0x04,
        ADep = 0x05,
        Dep = 0x06,
        Custom = 0x07,
        Lock = 0x08,
        Green = 0x09,
        NightPortrait = 0x0A,
        Sports = 0x0B,
        Portrait = 0x0C,
        Landscape = 0x0D,
        Closeup = 0x0E,
        FlashOff = 0x0F,
        CreativeAuto = 0x13,
        Movie = 0x14,
        PhotoInMovie = 0x15,
        SceneIntelligentAuto = 0x16,
        NightScenes = 0x17,
        BacklitScenes = 0x18,
        Scn = 0x19,
        Children = 0x1A,
        Food = 0x1B,
        CandlelightPortraits = 0x1C,
        CreativeFilter = 0x1D,
        RoughMonoChrome = 0x1E,
        SoftFocus = 0x1F,
        ToyCamera = 0x20,
        Fisheye = 0x21,
        WaterColor = 0x22,
        Miniature = 0x23,
        HdrStandard = 0x24,
        HdrVivid = 0x25,
        HdrBold = 0x26,
        HdrEmbossed = 0x27,
        MovieFantasy = 0x28,
        MovieOld = 0x29,
        MovieMemory = 0x2A,
        MovieDirectMono = 0x2B,
        MovieMini = 0x2C,
        PanningAssist = 0x2D,
        GroupPhoto = 0x2E,
        Myself = 0x32,
        PlusMovieAuto = 0x33,
        SmoothSkin = 0x34,
        Panorama = 0x35,
        Silent = 0x36,
        Flexible = 0x37,
        OilPainting = 0x38,
        Fireworks = 0x39,
        StarPortrait = 0x3A,
        StarNightscape = 0x3B,
        StarTrails = 0x3C,
        StarTimelapseMovie = 0x3D,
        BackgroundBlur = 0x3E,
        VideoBlog = 0x3F,
        Unknown = 0xFFFF_FFFF,
    }
}

impl AeMode {
    /// Whether a bulb exposure can be started in this mode
    pub const fn allows_bulb(self) -> bool {
        matches!(self, AeMode::Bulb | AeMode::Manual)
    }
}

wire_enum! {
    /// Bracketing flags, combinable
    pub enum Bracket: u32 {
        Aeb = 0x01,
        Isob = 0x02,
        Wbb = 0x04,
        Feb = 0x08,
        Unknown = 0xFFFF_FFFF,
    }
}

impl Bracket {
    /// Decode a bracket bitmask into its individual flags
    pub fn flags(raw: u32) -> Vec<Bracket> {
        if raw == Bracket::Unknown.wire() {
            return vec![Bracket::Unknown];
        }
        [Bracket::Aeb, Bracket::Isob, Bracket::Wbb, Bracket::Feb]
            .into_iter()
            .filter(|flag| raw & flag.wire() != 0)
            .collect()
    }
}

wire_enum! {
    /// Live-view output targets, combinable
    pub enum EvfOutputDevice: u32 {
        Tft = 1,
        Pc = 2,
        PcSmall = 8,
    }
}

wire_enum! {
    pub enum EvfZoom: u32 {
        Fit = 1,
        X5 = 5,
        X6 = 6,
        X10 = 10,
        X15 = 15,
    }
}

wire_enum! {
    pub enum EvfAfMode: u32 {
        Quick = 0x00,
        Live = 0x01,
        LiveFace = 0x02,
        LiveMulti = 0x03,
        LiveZone = 0x04,
        LiveSingleExpandCross = 0x05,
        LiveSingleExpandAround = 0x06,
        LiveZoneLargeH = 0x07,
        LiveZoneLargeV = 0x08,
        LiveCatchAf = 0x09,
        LiveSpotAf = 0x0a,
        FlexibleZone1 = 0x0b,
        FlexibleZone2 = 0x0c,
        FlexibleZone3 = 0x0d,
        WholeArea = 0x0e,
        NoTrackingSpot = 0x0f,
        NoTracking1Point = 0x10,
        NoTrackingExpandCross = 0x11,
        NoTrackingExpandAround = 0x12,
    }
}

wire_enum! {
    pub enum EvfDepthOfFieldPreview: u32 {
        Off = 0,
        On = 1,
    }
}

wire_enum! {
    /// Live-view mode switch
    pub enum EvfMode: u32 {
        Disabled = 0,
        Enabled = 1,
    }
}

wire_enum! {
    pub enum DcStrobe: u32 {
        Auto = 0,
        On = 1,
        SlowSynchro = 2,
        Off = 3,
    }
}

wire_enum! {
    pub enum MirrorLockupState: u32 {
        Disable = 0,
        Enable = 1,
        DuringShooting = 2,
    }
}

wire_enum! {
    pub enum StorageType: u32 {
        None = 0,
        Cf = 1,
        Sd = 2,
        Hd = 4,
        CFast = 5,
        CFe = 7,
    }
}

wire_enum! {
    pub enum ImageType: u32 {
        Unknown = 0,
        Jpeg = 1,
        Crw = 2,
        Raw = 4,
        Cr2 = 6,
        Heif = 8,
    }
}

wire_enum! {
    pub enum ImageSize: u32 {
        Large = 0,
        Middle = 1,
        Small = 2,
        Middle1 = 5,
        Middle2 = 6,
        Small1 = 14,
        Small2 = 15,
        Small3 = 16,
        Unknown = 0xFFFF_FFFF,
    }
}

wire_enum! {
    pub enum CompressQuality: u32 {
        Normal = 2,
        Fine = 3,
        Lossless = 4,
        SuperFine = 5,
        Unknown = 0xFFFF_FFFF,
    }
}

wire_enum! {
    /// File format code of a directory item
    pub enum ObjectFormat: u32 {
        Unknown = 0x0000,
        Jpeg = 0x3801,
        Cr2 = 0xB103,
        Mp4 = 0xB982,
        Cr3 = 0xB108,
        Heif = 0xB10B,
    }
}

wire_enum! {
    /// How an image reached the host
    pub enum TransferOption: u32 {
        ByDirectTransfer = 1,
        ByRelease = 2,
        ToDesktop = 0x0000_0100,
    }
}

wire_enum! {
    pub enum ProgressOption: u32 {
        NoReport = 0,
        Done = 1,
        Periodically = 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_battery_aliases_share_wire_value() {
        assert_eq!(BatteryLevel::Error.wire(), BatteryLevel::Empty.wire());
        assert_eq!(BatteryLevel::BcLevel.wire(), 0);
        assert_ne!(BatteryLevel::Error, BatteryLevel::Empty);
        assert_eq!(BatteryLevel::from_wire(0), Some(BatteryLevel::Empty));
    }

    #[test]
    fn test_battery_try_from_zero_is_empty() {
        assert_eq!(BatteryLevel::try_from(0u32), Ok(BatteryLevel::Empty));
        assert_eq!(u32::from(BatteryLevel::Error), 0);
        assert_eq!(u32::from(BatteryLevel::BcLevel), 0);

        let err = BatteryLevel::try_from(7u32).unwrap_err();
        assert_eq!(err.kind, "BatteryLevel");
        assert_eq!(err.value, 7);
    }

    #[rstest]
    #[case(-1, WhiteBalance::Click)]
    #[case(-2, WhiteBalance::Pasted)]
    #[case(23, WhiteBalance::AwbWhite)]
    fn test_white_balance_signed_values(#[case] raw: i32, #[case] expected: WhiteBalance) {
        assert_eq!(WhiteBalance::from_wire(raw), Some(expected));
    }

    #[test]
    fn test_bracket_flags() {
        assert_eq!(Bracket::flags(0x05), vec![Bracket::Aeb, Bracket::Wbb]);
        assert_eq!(Bracket::flags(0xFFFF_FFFF), vec![Bracket::Unknown]);
        assert!(Bracket::flags(0).is_empty());
    }

    #[test]
    fn test_save_to_both_is_union() {
        assert_eq!(
            SaveTo::Both.wire(),
            SaveTo::Camera.wire() | SaveTo::Host.wire()
        );
    }

    #[test]
    fn test_serde_uses_symbolic_names() {
        let json = serde_json::to_string(&AeMode::Manual).unwrap();
        assert_eq!(json, "\"Manual\"");
    }
}
