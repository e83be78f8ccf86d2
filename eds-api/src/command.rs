//! Command codes and their parameter value sets

wire_enum! {
    /// Fire-and-forget camera action
    pub enum CameraCommand: u32 {
        TakePicture = 0x0000_0000,
        ExtendShutDownTimer = 0x0000_0001,
        BulbStart = 0x0000_0002,
        BulbEnd = 0x0000_0003,
        PressShutterButton = 0x0000_0004,
        DoEvfAf = 0x0000_0102,
        DriveLensEvf = 0x0000_0103,
        DoClickWbEvf = 0x0000_0104,
        MovieSelectSwOn = 0x0000_0107,
        MovieSelectSwOff = 0x0000_0108,
        RequestRollPitchLevel = 0x0000_0109,
        DrivePowerZoom = 0x0000_010d,
        SetRemoteShootingMode = 0x0000_010f,
        RequestSensorCleaning = 0x0000_0112,
        SetModeDialDisable = 0x0000_0113,
    }
}

wire_enum! {
    /// Session-mode toggle
    pub enum StatusCommand: u32 {
        UiLock = 0x0000_0000,
        UiUnlock = 0x0000_0001,
        EnterDirectTransfer = 0x0000_0002,
        ExitDirectTransfer = 0x0000_0003,
    }
}

wire_enum! {
    /// Parameter of [`CameraCommand::PressShutterButton`]
    pub enum ShutterButton: u32 {
        Off = 0x0000_0000,
        Halfway = 0x0000_0001,
        Completely = 0x0000_0003,
        HalfwayNonAf = 0x0001_0001,
        CompletelyNonAf = 0x0001_0003,
    }
}

impl ShutterButton {
    /// Position without the autofocus modifier
    pub const fn position(self) -> ShutterButton {
        match self {
            ShutterButton::HalfwayNonAf => ShutterButton::Halfway,
            ShutterButton::CompletelyNonAf => ShutterButton::Completely,
            other => other,
        }
    }

    pub const fn skips_autofocus(self) -> bool {
        matches!(
            self,
            ShutterButton::HalfwayNonAf | ShutterButton::CompletelyNonAf
        )
    }
}

wire_enum! {
    /// Parameter of [`CameraCommand::DoEvfAf`]
    pub enum EvfAf: u32 {
        Off = 0,
        On = 1,
    }
}

wire_enum! {
    /// Parameter of [`CameraCommand::DriveLensEvf`]
    pub enum DriveLens: u32 {
        Near1 = 0x0000_0001,
        Near2 = 0x0000_0002,
        Near3 = 0x0000_0003,
        Far1 = 0x0000_8001,
        Far2 = 0x0000_8002,
        Far3 = 0x0000_8003,
    }
}

wire_enum! {
    /// Parameter of [`CameraCommand::DrivePowerZoom`]
    pub enum DrivePowerZoom: u32 {
        Stop = 0x0000_0000,
        LimitOffWide = 0x0000_0001,
        LimitOffTele = 0x0000_0002,
        LimitOnWide = 0x0000_0011,
        LimitOnTele = 0x0000_0012,
    }
}

wire_enum! {
    /// Parameter of [`CameraCommand::SetRemoteShootingMode`]
    pub enum RemoteShootingMode: u32 {
        Stop = 0,
        Start = 1,
    }
}
