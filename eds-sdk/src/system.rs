//! EdsSystem - Main entry point for the SDK
//!
//! Owns the handle arena and the property snapshot shared by every session,
//! and enumerates cameras, volumes and directory items through the
//! transport.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use eds_api::{
    CameraListRef, CameraRef, DeviceInfo, DirItemInfo, DirItemRef, ObjectRef, RefKind, VolumeInfo,
    VolumeRef,
};
use eds_state::PropertyRegistry;

use crate::config::SdkConfig;
use crate::error::{Result, SdkError};
use crate::handle::{HandleArena, HandleData, HandleError};
use crate::session::CameraSession;
use crate::transport::Transport;

/// Main system entry point
///
/// EdsSystem is fully synchronous. Every handle it returns carries one
/// retain owned by the caller; give it back with [`EdsSystem::release`].
///
/// # Example
///
/// ```rust,ignore
/// use eds_sdk::{EdsSystem, PropertyId};
///
/// fn main() -> Result<(), eds_sdk::SdkError> {
///     let system = EdsSystem::new(transport)?;
///
///     let list = system.camera_list()?;
///     let camera = system.camera_at(list, 0)?;
///     let session = system.open_session(camera)?;
///
///     let iso = session.get_property(camera, PropertyId::IsoSpeed)?;
///     println!("ISO code: {:?}", iso);
///
///     session.close()?;
///     system.release(camera)?;
///     system.release(list)?;
///     Ok(())
/// }
/// ```
pub struct EdsSystem {
    transport: Arc<dyn Transport>,
    arena: Arc<HandleArena>,
    registry: PropertyRegistry,
    config: SdkConfig,
    /// Camera handle per port name, so every session of a camera shares
    /// one snapshot
    cameras: Mutex<HashMap<String, ObjectRef>>,
}

impl EdsSystem {
    /// Create a system with the default configuration
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_config(transport, SdkConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: SdkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            arena: Arc::new(HandleArena::new()),
            registry: PropertyRegistry::new(),
            config,
            cameras: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// The snapshot shared by every session
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    pub fn arena(&self) -> &Arc<HandleArena> {
        &self.arena
    }

    // ========================================================================
    // Cameras
    // ========================================================================

    /// Snapshot of the cameras connected right now
    pub fn camera_list(&self) -> Result<CameraListRef> {
        let devices = self.transport.cameras()?;
        debug!(count = devices.len(), "enumerated cameras");
        let list = self.arena.insert(
            RefKind::CameraList,
            None,
            0,
            HandleData::CameraList(devices),
        )?;
        Ok(CameraListRef::try_from(list)?)
    }

    /// Number of cameras in a list
    pub fn camera_count(&self, list: CameraListRef) -> Result<usize> {
        Ok(self.devices_of(list)?.len())
    }

    /// Camera at `index` of a list
    ///
    /// A camera that already has a live handle, from this list or an
    /// earlier one, is returned retained instead of issuing a second handle.
    pub fn camera_at(&self, list: CameraListRef, index: usize) -> Result<CameraRef> {
        let devices = self.devices_of(list)?;
        let device = devices
            .get(index)
            .cloned()
            .ok_or(SdkError::NoSuchCamera(index))?;

        let mut cameras = self.cameras.lock();
        if let Some(&existing) = cameras.get(&device.port_name) {
            if self.arena.retain(existing).is_ok() {
                return Ok(CameraRef::try_from(existing)?);
            }
        }

        let camera = self.arena.insert(
            RefKind::Camera,
            Some(list.into()),
            index as u32,
            HandleData::Camera(device.clone()),
        )?;
        cameras.insert(device.port_name, camera);
        Ok(CameraRef::try_from(camera)?)
    }

    /// Every camera of a list
    pub fn cameras(&self, list: CameraListRef) -> Result<Vec<CameraRef>> {
        (0..self.camera_count(list)?)
            .map(|index| self.camera_at(list, index))
            .collect()
    }

    pub fn device_info(&self, camera: CameraRef) -> Result<DeviceInfo> {
        match self.arena.data(camera.into())? {
            HandleData::Camera(info) => Ok(info),
            _ => Err(SdkError::ForeignObject(camera.into())),
        }
    }

    /// Open a session with a camera
    pub fn open_session(&self, camera: CameraRef) -> Result<CameraSession> {
        let device = self.device_info(camera)?;
        info!(port = %device.port_name, "opening session");
        CameraSession::open(
            camera,
            device,
            Arc::clone(&self.transport),
            self.registry.clone(),
            Arc::clone(&self.arena),
            self.config.clone(),
        )
    }

    fn devices_of(&self, list: CameraListRef) -> Result<Vec<DeviceInfo>> {
        match self.arena.data(list.into())? {
            HandleData::CameraList(devices) => Ok(devices),
            _ => Err(SdkError::ForeignObject(list.into())),
        }
    }

    /// Camera handle and port name of the camera an object lives on
    fn device_of(&self, handle: ObjectRef) -> Result<(ObjectRef, String)> {
        let camera = self
            .arena
            .camera_of(handle)?
            .ok_or(SdkError::ForeignObject(handle))?;
        match self.arena.data(camera)? {
            HandleData::Camera(info) => Ok((camera, info.port_name)),
            _ => Err(SdkError::ForeignObject(handle)),
        }
    }

    // ========================================================================
    // Storage
    // ========================================================================

    /// Volumes of a camera with an open session
    pub fn volumes(&self, camera: CameraRef) -> Result<Vec<VolumeRef>> {
        let (camera, port) = self.device_of(camera.into())?;
        self.transport
            .volumes(&port)?
            .into_iter()
            .map(|info| -> Result<VolumeRef> {
                let volume =
                    self.arena
                        .insert(RefKind::Volume, Some(camera), info.object_id, HandleData::None)?;
                Ok(VolumeRef::try_from(volume)?)
            })
            .collect()
    }

    pub fn volume_info(&self, volume: VolumeRef) -> Result<VolumeInfo> {
        let handle = ObjectRef::from(volume);
        let (_, port) = self.device_of(handle)?;
        let object_id = self.arena.device_id(handle)?;
        self.transport
            .volumes(&port)?
            .into_iter()
            .find(|info| info.object_id == object_id)
            .ok_or(SdkError::Handle(HandleError::Stale(handle)))
    }

    /// Items directly below a volume or folder
    pub fn items(&self, parent: impl Into<ObjectRef>) -> Result<Vec<DirItemRef>> {
        let parent = parent.into();
        match parent.kind() {
            RefKind::Volume | RefKind::DirectoryItem => {}
            _ => {
                return Err(eds_api::WrongKind {
                    expected: RefKind::Volume,
                    actual: parent,
                }
                .into())
            }
        }

        let (_, port) = self.device_of(parent)?;
        let parent_id = self.arena.device_id(parent)?;
        self.transport
            .children(&port, parent_id)?
            .into_iter()
            .map(|info| -> Result<DirItemRef> {
                let item = self.arena.insert(
                    RefKind::DirectoryItem,
                    Some(parent),
                    info.object_id,
                    HandleData::None,
                )?;
                Ok(DirItemRef::try_from(item)?)
            })
            .collect()
    }

    pub fn item_info(&self, item: DirItemRef) -> Result<DirItemInfo> {
        let handle = ObjectRef::from(item);
        let (_, port) = self.device_of(handle)?;
        let object_id = self.arena.device_id(handle)?;
        Ok(self.transport.item_info(&port, object_id)?)
    }

    // ========================================================================
    // Reference counting
    // ========================================================================

    /// Add a retain, returning the new count
    pub fn retain(&self, handle: impl Into<ObjectRef>) -> Result<u32> {
        Ok(self.arena.retain(handle.into())?)
    }

    /// Drop a retain, returning the remaining count
    ///
    /// At zero the handle turns stale and its parent is released in turn.
    /// Every handle freed this way loses its cached properties.
    pub fn release(&self, handle: impl Into<ObjectRef>) -> Result<u32> {
        release_handle(&self.arena, &self.registry, handle.into())
    }

    pub fn parent(&self, handle: impl Into<ObjectRef>) -> Result<Option<ObjectRef>> {
        Ok(self.arena.parent(handle.into())?)
    }
}

/// Release a handle and drop the cached properties of everything it freed
pub(crate) fn release_handle(
    arena: &HandleArena,
    registry: &PropertyRegistry,
    handle: ObjectRef,
) -> Result<u32> {
    let (remaining, freed) = arena.release_collecting(handle)?;
    for object in freed {
        registry.invalidate(object);
    }
    Ok(remaining)
}

impl std::fmt::Debug for EdsSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdsSystem")
            .field("cameras", &self.cameras.lock().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
