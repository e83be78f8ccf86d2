//! Event codes for the three notification channels
//!
//! Each channel has an `All` member meaning "several or unspecified
//! subjects changed, re-query everything on this channel".

use serde::{Deserialize, Serialize};

wire_enum! {
    pub enum PropertyEventKind: u32 {
        All = 0x0000_0100,
        PropertyChanged = 0x0000_0101,
        PropertyDescChanged = 0x0000_0102,
    }
}

wire_enum! {
    pub enum ObjectEventKind: u32 {
        All = 0x0000_0200,
        VolumeInfoChanged = 0x0000_0201,
        VolumeUpdateItems = 0x0000_0202,
        FolderUpdateItems = 0x0000_0203,
        DirItemCreated = 0x0000_0204,
        DirItemRemoved = 0x0000_0205,
        DirItemInfoChanged = 0x0000_0206,
        DirItemContentChanged = 0x0000_0207,
        /// The camera holds an image for the host. The receiver must download
        /// it or cancel the transfer, otherwise the camera keeps the buffer.
        DirItemRequestTransfer = 0x0000_0208,
        /// Same obligation as `DirItemRequestTransfer`, raised by the direct
        /// transfer button on the body.
        DirItemRequestTransferDt = 0x0000_0209,
        /// A zero parameter cancels every pending direct transfer
        DirItemCancelTransferDt = 0x0000_020a,
        VolumeAdded = 0x0000_020c,
        VolumeRemoved = 0x0000_020d,
    }
}

impl ObjectEventKind {
    /// Whether the subject is a storage volume rather than a directory item
    pub const fn targets_volume(self) -> bool {
        matches!(
            self,
            ObjectEventKind::VolumeInfoChanged
                | ObjectEventKind::VolumeUpdateItems
                | ObjectEventKind::VolumeAdded
                | ObjectEventKind::VolumeRemoved
        )
    }
}

wire_enum! {
    pub enum StateEventKind: u32 {
        All = 0x0000_0300,
        Shutdown = 0x0000_0301,
        JobStatusChanged = 0x0000_0302,
        /// Data is the number of seconds before auto power-off
        WillSoonShutDown = 0x0000_0303,
        ShutDownTimerUpdate = 0x0000_0304,
        CaptureError = 0x0000_0305,
        /// The session can no longer be trusted and should be torn down
        InternalError = 0x0000_0306,
        AfResult = 0x0000_0309,
        BulbExposureTime = 0x0000_0310,
        PowerZoomInfoChanged = 0x0000_0311,
    }
}

/// One of the three independent notification streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventChannel {
    Property,
    Object,
    State,
}

impl EventChannel {
    pub const ALL: [EventChannel; 3] = [
        EventChannel::Property,
        EventChannel::Object,
        EventChannel::State,
    ];

    /// Channel an event code belongs to, from its code range
    pub const fn of_code(code: u32) -> Option<EventChannel> {
        match code & 0xffff_ff00 {
            0x100 => Some(EventChannel::Property),
            0x200 => Some(EventChannel::Object),
            0x300 => Some(EventChannel::State),
            _ => None,
        }
    }

    /// Stable position of the channel, for per-channel tables
    pub const fn index(self) -> usize {
        match self {
            EventChannel::Property => 0,
            EventChannel::Object => 1,
            EventChannel::State => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            EventChannel::Property => "property",
            EventChannel::Object => "object",
            EventChannel::State => "state",
        }
    }
}

impl std::fmt::Display for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
