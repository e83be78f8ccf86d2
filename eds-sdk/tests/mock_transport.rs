//! Scripted in-memory camera for session tests
//!
//! Properties, storage and live view are plain maps. Every successful
//! property write is echoed back as a `PropertyChanged` notification, the
//! way a real body reports its own state changes.

#![allow(dead_code)]

use std::collections::HashMap;

use parking_lot::Mutex;

use eds_codec::{encode, PropertyDesc, TaggedValue};
use eds_event_manager::{EventIngress, RawFrame};
use eds_sdk::{
    CameraCommand, Capacity, DeviceInfo, DirItemInfo, EvfFrame, ObjectEventKind, PropertyEventKind,
    PropertyId, PropertyTarget, RawProperty, StateEventKind, StatusCommand, Transport,
    TransportError, TransportResult, VolumeInfo,
};

pub const PORT: &str = "usb:001,004";

#[derive(Default)]
pub struct MockState {
    pub properties: HashMap<(PropertyTarget, PropertyId), RawProperty>,
    pub descs: HashMap<PropertyId, PropertyDesc>,
    pub volumes: Vec<VolumeInfo>,
    /// Children per parent object id
    pub children: HashMap<u32, Vec<u32>>,
    pub items: HashMap<u32, (DirItemInfo, Vec<u8>)>,
    pub evf: Option<EvfFrame>,
    pub ingress: Option<EventIngress>,

    pub commands: Vec<(CameraCommand, u32)>,
    pub status_commands: Vec<StatusCommand>,
    pub writes: Vec<(PropertyId, Vec<u8>)>,
    pub property_reads: usize,
    pub finished: Vec<u32>,
    pub cancelled: Vec<u32>,
    pub deleted: Vec<u32>,
    pub capacity: Option<Capacity>,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
}

pub struct MockCamera {
    pub device: DeviceInfo,
    pub state: Mutex<MockState>,
    /// Echo writes back as change notifications
    pub echo_writes: bool,
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            device: DeviceInfo {
                port_name: PORT.to_string(),
                description: "Canon EOS R6".to_string(),
                device_sub_type: 1,
            },
            state: Mutex::new(MockState::default()),
            echo_writes: true,
        }
    }

    pub fn with_property(self, id: PropertyId, value: TaggedValue) -> Self {
        self.put(PropertyTarget::Camera, id, value);
        self
    }

    pub fn put(&self, target: PropertyTarget, id: PropertyId, value: TaggedValue) {
        let raw = RawProperty::new(value.data_type(), encode(&value).unwrap());
        self.state.lock().properties.insert((target, id), raw);
    }

    pub fn with_desc(self, id: PropertyId, desc: PropertyDesc) -> Self {
        self.state.lock().descs.insert(id, desc);
        self
    }

    /// Volume `volume_id` holding one file per `(id, content)`
    pub fn with_files(self, volume_id: u32, files: &[(u32, &[u8])]) -> Self {
        {
            let mut state = self.state.lock();
            state.volumes.push(VolumeInfo {
                object_id: volume_id,
                storage_type: 2,
                access: eds_codec::Access::ReadWrite,
                max_capacity: 64 << 30,
                free_space: 32 << 30,
                label: "SD1".to_string(),
            });
            for (id, content) in files {
                state.children.entry(volume_id).or_default().push(*id);
                state.items.insert(*id, (file_info(*id, content.len()), content.to_vec()));
            }
        }
        self
    }

    pub fn with_evf(self, frame: EvfFrame) -> Self {
        self.state.lock().evf = Some(frame);
        self
    }

    pub fn ingress(&self) -> EventIngress {
        self.state
            .lock()
            .ingress
            .clone()
            .expect("no session open")
    }

    pub fn emit(&self, event: u32, subject: u32, param: u32) {
        // Release the state lock before the ingress can block
        let ingress = self.ingress();
        ingress
            .on_device_event(RawFrame::new(event, subject, param))
            .unwrap();
    }

    pub fn emit_property(&self, kind: PropertyEventKind, id: u32) {
        self.emit(kind.wire(), id, 0);
    }

    pub fn emit_object(&self, kind: ObjectEventKind, object_id: u32) {
        self.emit(kind.wire(), object_id, 0);
    }

    pub fn emit_state(&self, kind: StateEventKind, data: u32) {
        self.emit(kind.wire(), data, 0);
    }

    fn check_port(&self, device: &str) -> TransportResult<()> {
        if device == self.device.port_name {
            Ok(())
        } else {
            Err(TransportError::Disconnected(device.to_string()))
        }
    }
}

pub fn file_info(object_id: u32, size: usize) -> DirItemInfo {
    DirItemInfo {
        object_id,
        size: size as u64,
        is_folder: false,
        group_id: 0,
        option: 0,
        file_name: format!("IMG_{object_id:04}.CR3"),
        format: 0xB108,
        date_time: None,
    }
}

impl Transport for MockCamera {
    fn cameras(&self) -> TransportResult<Vec<DeviceInfo>> {
        Ok(vec![self.device.clone()])
    }

    fn open_session(&self, device: &str, events: EventIngress) -> TransportResult<()> {
        self.check_port(device)?;
        let mut state = self.state.lock();
        state.ingress = Some(events);
        state.sessions_opened += 1;
        Ok(())
    }

    fn close_session(&self, device: &str) -> TransportResult<()> {
        self.check_port(device)?;
        let mut state = self.state.lock();
        state.ingress = None;
        state.sessions_closed += 1;
        Ok(())
    }

    fn read_property(
        &self,
        device: &str,
        target: PropertyTarget,
        id: PropertyId,
    ) -> TransportResult<RawProperty> {
        self.check_port(device)?;
        let mut state = self.state.lock();
        state.property_reads += 1;
        state
            .properties
            .get(&(target, id))
            .cloned()
            .ok_or(TransportError::NotSupported)
    }

    fn write_property(
        &self,
        device: &str,
        target: PropertyTarget,
        id: PropertyId,
        payload: &[u8],
    ) -> TransportResult<()> {
        self.check_port(device)?;
        let data_type = id.spec().ok_or(TransportError::NotSupported)?.data_type;
        let ingress = {
            let mut state = self.state.lock();
            state.writes.push((id, payload.to_vec()));
            state
                .properties
                .insert((target, id), RawProperty::new(data_type, payload.to_vec()));
            state.ingress.clone()
        };

        if let (true, PropertyTarget::Camera, Some(ingress)) = (self.echo_writes, target, ingress) {
            let _ = ingress.on_device_event(RawFrame::new(
                PropertyEventKind::PropertyChanged.wire(),
                id.wire(),
                0,
            ));
        }
        Ok(())
    }

    fn read_property_desc(&self, device: &str, id: PropertyId) -> TransportResult<PropertyDesc> {
        self.check_port(device)?;
        self.state
            .lock()
            .descs
            .get(&id)
            .cloned()
            .ok_or(TransportError::NotSupported)
    }

    fn send_command(&self, device: &str, command: CameraCommand, param: u32) -> TransportResult<()> {
        self.check_port(device)?;
        self.state.lock().commands.push((command, param));
        Ok(())
    }

    fn send_status_command(
        &self,
        device: &str,
        command: StatusCommand,
        _param: u32,
    ) -> TransportResult<()> {
        self.check_port(device)?;
        self.state.lock().status_commands.push(command);
        Ok(())
    }

    fn set_capacity(&self, device: &str, capacity: Capacity) -> TransportResult<()> {
        self.check_port(device)?;
        self.state.lock().capacity = Some(capacity);
        Ok(())
    }

    fn volumes(&self, device: &str) -> TransportResult<Vec<VolumeInfo>> {
        self.check_port(device)?;
        Ok(self.state.lock().volumes.clone())
    }

    fn children(&self, device: &str, parent: u32) -> TransportResult<Vec<DirItemInfo>> {
        self.check_port(device)?;
        let state = self.state.lock();
        Ok(state
            .children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(|id| state.items.get(id).map(|(info, _)| info.clone()))
            .collect())
    }

    fn item_info(&self, device: &str, object_id: u32) -> TransportResult<DirItemInfo> {
        self.check_port(device)?;
        self.state
            .lock()
            .items
            .get(&object_id)
            .map(|(info, _)| info.clone())
            .ok_or(TransportError::Rejected(0x8D))
    }

    fn read_object(
        &self,
        device: &str,
        object_id: u32,
        offset: u64,
        buf: &mut [u8],
    ) -> TransportResult<usize> {
        self.check_port(device)?;
        let state = self.state.lock();
        let (_, content) = state
            .items
            .get(&object_id)
            .ok_or(TransportError::Rejected(0x8D))?;
        let start = (offset as usize).min(content.len());
        let len = buf.len().min(content.len() - start);
        buf[..len].copy_from_slice(&content[start..start + len]);
        Ok(len)
    }

    fn finish_transfer(&self, device: &str, object_id: u32) -> TransportResult<()> {
        self.check_port(device)?;
        self.state.lock().finished.push(object_id);
        Ok(())
    }

    fn cancel_transfer(&self, device: &str, object_id: u32) -> TransportResult<()> {
        self.check_port(device)?;
        self.state.lock().cancelled.push(object_id);
        Ok(())
    }

    fn delete_item(&self, device: &str, object_id: u32) -> TransportResult<()> {
        self.check_port(device)?;
        let mut state = self.state.lock();
        state.items.remove(&object_id);
        state.deleted.push(object_id);
        Ok(())
    }

    fn read_evf_frame(&self, device: &str) -> TransportResult<EvfFrame> {
        self.check_port(device)?;
        self.state
            .lock()
            .evf
            .clone()
            .ok_or(TransportError::Busy)
    }
}
