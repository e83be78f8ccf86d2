//! Device transport seam
//!
//! The SDK never talks to hardware itself. A [`Transport`] carries property
//! reads and writes, commands and object transfers to the camera, and pushes
//! the camera's notifications into the [`EventIngress`] it receives when a
//! session opens. Devices are addressed by their port name.

use bytes::Bytes;
use thiserror::Error;

use eds_api::{
    CameraCommand, Capacity, DataType, DeviceInfo, DirItemInfo, PropertyDesc, PropertyId,
    StatusCommand, VolumeInfo,
};
use eds_event_manager::EventIngress;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("device {0} is not connected")]
    Disconnected(String),

    #[error("device is busy")]
    Busy,

    #[error("operation is not supported by the device")]
    NotSupported,

    /// Device refused the request with a vendor status code
    #[error("device rejected the request with status {0:#x}")]
    Rejected(u32),

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object a property request is addressed to, in device terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyTarget {
    Camera,
    /// Directory item by device object id
    Item(u32),
}

/// Property payload as read from the device, tag included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    pub data_type: DataType,
    pub payload: Bytes,
}

impl RawProperty {
    pub fn new(data_type: DataType, payload: impl Into<Bytes>) -> Self {
        Self {
            data_type,
            payload: payload.into(),
        }
    }
}

/// One live-view frame and the metadata the device attached to it
#[derive(Debug, Clone, Default)]
pub struct EvfFrame {
    pub image: Bytes,
    pub properties: Vec<(PropertyId, RawProperty)>,
}

/// Connection to one or more cameras
///
/// Every call blocks until the device acknowledges. Implementations must
/// deliver notifications of an open session through its [`EventIngress`]
/// in arrival order, from a thread other than the one blocked in a call.
pub trait Transport: Send + Sync {
    /// Cameras currently connected
    fn cameras(&self) -> TransportResult<Vec<DeviceInfo>>;

    fn open_session(&self, device: &str, events: EventIngress) -> TransportResult<()>;

    fn close_session(&self, device: &str) -> TransportResult<()>;

    fn read_property(
        &self,
        device: &str,
        target: PropertyTarget,
        id: PropertyId,
    ) -> TransportResult<RawProperty>;

    fn write_property(
        &self,
        device: &str,
        target: PropertyTarget,
        id: PropertyId,
        payload: &[u8],
    ) -> TransportResult<()>;

    /// Legal value set of an enumerable property
    fn read_property_desc(&self, _device: &str, _id: PropertyId) -> TransportResult<PropertyDesc> {
        Err(TransportError::NotSupported)
    }

    fn send_command(&self, device: &str, command: CameraCommand, param: u32)
        -> TransportResult<()>;

    fn send_status_command(
        &self,
        device: &str,
        command: StatusCommand,
        param: u32,
    ) -> TransportResult<()>;

    fn set_capacity(&self, device: &str, capacity: Capacity) -> TransportResult<()>;

    fn volumes(&self, device: &str) -> TransportResult<Vec<VolumeInfo>>;

    /// Items directly below a volume or folder
    fn children(&self, device: &str, parent: u32) -> TransportResult<Vec<DirItemInfo>>;

    fn item_info(&self, device: &str, object_id: u32) -> TransportResult<DirItemInfo>;

    /// Read part of an object's content, returning the bytes copied
    fn read_object(
        &self,
        device: &str,
        object_id: u32,
        offset: u64,
        buf: &mut [u8],
    ) -> TransportResult<usize>;

    /// Tell the device a requested transfer has been fully downloaded
    fn finish_transfer(&self, device: &str, object_id: u32) -> TransportResult<()>;

    /// Tell the device to drop a requested transfer
    fn cancel_transfer(&self, device: &str, object_id: u32) -> TransportResult<()>;

    fn delete_item(&self, _device: &str, _object_id: u32) -> TransportResult<()> {
        Err(TransportError::NotSupported)
    }

    fn format_volume(&self, _device: &str, _volume_id: u32) -> TransportResult<()> {
        Err(TransportError::NotSupported)
    }

    fn read_evf_frame(&self, _device: &str) -> TransportResult<EvfFrame> {
        Err(TransportError::NotSupported)
    }
}
