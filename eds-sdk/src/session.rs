//! CameraSession - one open connection to a camera
//!
//! A session owns the event manager of its camera and keeps the shared
//! property snapshot current from the device's notifications. Commands go
//! through the command state machine before they reach the transport, and
//! the machine only advances once the device acknowledged.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use eds_api::{
    AeMode, CameraCommand, CameraRef, Capacity, DeviceInfo, DirItemRef, EvfDepthOfFieldPreview,
    EvfImageRef, EvfMode, EvfOutputDevice, ImageQuality, ObjectEventKind, ObjectRef,
    PropertyDesc, PropertyEventKind, PropertyId, RefKind, SaveTo, ShutterButton, StateEventKind,
    StatusCommand, VolumeRef, WhiteBalance,
};
use eds_codec::TaggedValue;
use eds_event_manager::{
    EventChannel, EventIterator, EventManager, EventRecord, HandlerResult, ObjectResolver,
    PendingTransfer, Subscription, TracingSink,
};
use eds_state::{PropertyChanges, PropertyRegistry, StateError};
use eds_stream::StreamHandle;

use crate::config::SdkConfig;
use crate::error::{Result, SdkError};
use crate::handle::{HandleArena, HandleData};
use crate::shutter::{CommandError, CommandState, SessionState};
use crate::system::release_handle;
use crate::transport::{PropertyTarget, Transport, TransportError};

/// Maps device object ids reported in events to handles below one camera
///
/// Objects the host has not enumerated yet are issued a handle under the
/// camera; the session owns that retain until it closes.
struct ArenaResolver {
    arena: Arc<HandleArena>,
    camera: ObjectRef,
    adopted: Arc<Mutex<Vec<ObjectRef>>>,
}

impl ObjectResolver for ArenaResolver {
    fn resolve(&self, kind: RefKind, raw: u32) -> Option<ObjectRef> {
        if let Some(existing) = self.arena.lookup(self.camera, kind, raw) {
            return Some(existing);
        }

        match self
            .arena
            .insert(kind, Some(self.camera), raw, HandleData::None)
        {
            Ok(handle) => {
                self.adopted.lock().push(handle);
                Some(handle)
            }
            Err(err) => {
                warn!(camera = %self.camera, %kind, raw, "cannot issue handle: {}", err);
                None
            }
        }
    }
}

/// Session state shared with the internal event handlers
struct SessionInner {
    camera: ObjectRef,
    device: DeviceInfo,
    transport: Arc<dyn Transport>,
    registry: PropertyRegistry,
    arena: Arc<HandleArena>,
    config: SdkConfig,
    commands: Mutex<CommandState>,
    /// Serializes commands so plan and commit see the same state
    command_lock: Mutex<()>,
    /// Serializes property writes
    write_lock: Mutex<()>,
    shutdown_deadline: Mutex<Option<Instant>>,
    adopted: Arc<Mutex<Vec<ObjectRef>>>,
    /// Id of the next live-view frame
    evf_sequence: AtomicU32,
}

impl SessionInner {
    fn port(&self) -> &str {
        &self.device.port_name
    }

    fn state(&self) -> SessionState {
        self.commands.lock().session
    }

    fn require_open(&self) -> Result<()> {
        match self.state() {
            SessionState::Open => Ok(()),
            other => Err(SdkError::SessionNotOpen(other)),
        }
    }

    /// Fail unless `target` is alive and lives on this session's camera
    fn own(&self, target: ObjectRef) -> Result<()> {
        match self.arena.camera_of(target)? {
            Some(camera) if camera == self.camera => Ok(()),
            _ => Err(SdkError::ForeignObject(target)),
        }
    }

    /// Address of a reference for property requests
    fn property_target(&self, target: ObjectRef, id: PropertyId) -> Result<PropertyTarget> {
        match target.kind() {
            RefKind::Camera => Ok(PropertyTarget::Camera),
            RefKind::DirectoryItem => Ok(PropertyTarget::Item(self.arena.device_id(target)?)),
            kind => Err(StateError::NotSupported { property: id, kind }.into()),
        }
    }

    fn read_from_device(&self, target: ObjectRef, id: PropertyId) -> Result<TaggedValue> {
        let device_target = match target.kind() {
            RefKind::EvfImage => return Err(StateError::NotCached { property: id }.into()),
            _ => self.property_target(target, id)?,
        };

        let raw = self.transport.read_property(self.port(), device_target, id)?;
        let value = self
            .registry
            .apply_device_value(target, id, raw.data_type, &raw.payload)?;
        debug!(%target, property = %id, "read property from device");
        Ok(value)
    }

    fn release(&self, handle: ObjectRef) -> Result<u32> {
        release_handle(&self.arena, &self.registry, handle)
    }

    fn set_mode(&self, state: SessionState) {
        self.commands.lock().session = state;
    }

    fn on_property_event(&self, record: &EventRecord) -> HandlerResult {
        let Some(event) = record.as_property() else {
            return Ok(());
        };

        if event.requires_full_requery() {
            debug!(camera = %self.camera, kind = %event.kind, "full property requery");
            if event.kind != PropertyEventKind::PropertyDescChanged {
                self.registry.invalidate_values(self.camera);
            }
            if event.kind != PropertyEventKind::PropertyChanged {
                self.registry.invalidate_descs(self.camera);
            }
            return Ok(());
        }

        let Some(id) = event.property() else {
            return Ok(());
        };

        match event.kind {
            PropertyEventKind::PropertyChanged => {
                if !self.config.refresh_on_property_changed {
                    self.registry.forget(self.camera, id);
                    return Ok(());
                }
                if let Err(err) = self.read_from_device(self.camera, id) {
                    warn!(property = %id, "refresh after change failed: {}", err);
                    self.registry.forget(self.camera, id);
                }
            }
            PropertyEventKind::PropertyDescChanged => {
                if !self.registry.is_describable(self.camera, id) {
                    return Ok(());
                }
                let stored = self
                    .transport
                    .read_property_desc(self.port(), id)
                    .map_err(SdkError::from)
                    .and_then(|desc| Ok(self.registry.store_desc(self.camera, id, desc)?));
                if let Err(err) = stored {
                    warn!(property = %id, "descriptor refresh failed: {}", err);
                    self.registry.invalidate_descs(self.camera);
                }
            }
            PropertyEventKind::All => {}
        }
        Ok(())
    }

    fn on_object_event(&self, record: &EventRecord) -> HandlerResult {
        let Some(event) = record.as_object() else {
            return Ok(());
        };

        if let (ObjectEventKind::DirItemRemoved, Some(item)) = (event.kind, event.object()) {
            self.registry.invalidate(item);
        }
        if event.requests_transfer() {
            info!(camera = %self.camera, object = event.raw_subject, "camera requests a transfer");
        }
        Ok(())
    }

    fn on_state_event(&self, record: &EventRecord) -> HandlerResult {
        let Some(event) = record.as_state() else {
            return Ok(());
        };

        match event.kind {
            StateEventKind::InternalError => {
                error!(camera = %self.camera, code = event.data, "camera reported an internal error");
                self.set_mode(SessionState::Faulted);
            }
            StateEventKind::Shutdown => {
                warn!(camera = %self.camera, "camera disconnected");
                self.set_mode(SessionState::Faulted);
            }
            StateEventKind::WillSoonShutDown | StateEventKind::ShutDownTimerUpdate => {
                if let Some(remaining) = event.remaining() {
                    debug!(camera = %self.camera, seconds = remaining.as_secs(), "auto power-off countdown");
                    *self.shutdown_deadline.lock() = Some(Instant::now() + remaining);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// An open session with one camera
///
/// Obtained from [`EdsSystem::open_session`](crate::EdsSystem::open_session).
/// Dropping the session closes it.
///
/// # Example
///
/// ```rust,ignore
/// let session = system.open_session(camera)?;
///
/// session.set_iso_speed(0x68)?;
/// session.take_picture()?;
///
/// for event in session.events(EventChannel::Object).timeout_iter(Duration::from_secs(5)) {
///     if let Some(item) = event.as_object().filter(|e| e.requests_transfer()).and_then(|e| e.object()) {
///         let mut file = memory_stream(None);
///         session.download(item.try_into()?, &mut file)?;
///     }
/// }
/// session.close()?;
/// ```
pub struct CameraSession {
    camera: CameraRef,
    inner: Arc<SessionInner>,
    events: EventManager,
    /// Internal handlers, registered before any user subscription
    _internal: Vec<Subscription>,
    closed: bool,
}

impl CameraSession {
    pub(crate) fn open(
        camera: CameraRef,
        device: DeviceInfo,
        transport: Arc<dyn Transport>,
        registry: PropertyRegistry,
        arena: Arc<HandleArena>,
        config: SdkConfig,
    ) -> Result<Self> {
        let typed = camera;
        let camera = ObjectRef::from(camera);
        let adopted = Arc::new(Mutex::new(Vec::new()));
        let resolver = ArenaResolver {
            arena: Arc::clone(&arena),
            camera,
            adopted: Arc::clone(&adopted),
        };
        let events = EventManager::new(
            config.events.clone(),
            Arc::new(resolver),
            Arc::new(TracingSink),
        )?;

        let inner = Arc::new(SessionInner {
            camera,
            device,
            transport,
            registry,
            arena,
            config,
            commands: Mutex::new(CommandState::new()),
            command_lock: Mutex::new(()),
            write_lock: Mutex::new(()),
            shutdown_deadline: Mutex::new(None),
            adopted,
            evf_sequence: AtomicU32::new(0),
        });

        let internal = vec![
            {
                let inner = Arc::clone(&inner);
                events.subscribe(EventChannel::Property, move |record| inner.on_property_event(record))
            },
            {
                let inner = Arc::clone(&inner);
                events.subscribe(EventChannel::Object, move |record| inner.on_object_event(record))
            },
            {
                let inner = Arc::clone(&inner);
                events.subscribe(EventChannel::State, move |record| inner.on_state_event(record))
            },
        ];

        inner.arena.retain(camera)?;
        if let Err(err) = inner.transport.open_session(inner.port(), events.ingress()) {
            events.shutdown();
            let _ = inner.release(camera);
            return Err(err.into());
        }

        info!(%camera, port = %inner.port(), "session opened");

        Ok(Self {
            camera: typed,
            inner,
            events,
            _internal: internal,
            closed: false,
        })
    }

    pub fn camera(&self) -> CameraRef {
        self.camera
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.inner.device
    }

    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    /// Shutter, bulb, UI lock and direct-transfer bookkeeping
    pub fn command_state(&self) -> CommandState {
        *self.inner.commands.lock()
    }

    pub fn config(&self) -> &SdkConfig {
        &self.inner.config
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Send a camera command
    ///
    /// The command state machine is consulted first; a refused command
    /// never reaches the device.
    pub fn send_command(&self, command: CameraCommand, param: u32) -> Result<()> {
        let _serial = self.inner.command_lock.lock();
        let next = self.inner.commands.lock().plan(command, param)?;

        if command == CameraCommand::BulbStart {
            self.check_bulb_mode()?;
        }

        self.inner
            .transport
            .send_command(self.inner.port(), command, param)?;
        self.commit_commands(next);

        if command == CameraCommand::ExtendShutDownTimer {
            *self.inner.shutdown_deadline.lock() = None;
        }
        debug!(camera = %self.inner.camera, %command, param, "command sent");
        Ok(())
    }

    pub fn send_status_command(&self, command: StatusCommand, param: u32) -> Result<()> {
        let _serial = self.inner.command_lock.lock();
        let next = self.inner.commands.lock().plan_status(command)?;

        self.inner
            .transport
            .send_status_command(self.inner.port(), command, param)?;
        self.commit_commands(next);

        debug!(camera = %self.inner.camera, %command, param, "status command sent");
        Ok(())
    }

    /// Adopt the planned state unless an event faulted the session meanwhile
    fn commit_commands(&self, next: CommandState) {
        let mut state = self.inner.commands.lock();
        let session = state.session;
        *state = CommandState { session, ..next };
    }

    fn check_bulb_mode(&self) -> Result<()> {
        let mode = self
            .inner
            .registry
            .cached(self.inner.camera, PropertyId::AeMode)
            .and_then(|value| value.as_u32())
            .and_then(AeMode::from_wire);

        match mode {
            Some(mode) if !mode.allows_bulb() => Err(CommandError::NotAllowed {
                command: CameraCommand::BulbStart.name(),
                state: format!("the AE mode is {mode}"),
            }
            .into()),
            _ => Ok(()),
        }
    }

    pub fn take_picture(&self) -> Result<()> {
        self.send_command(CameraCommand::TakePicture, 0)
    }

    pub fn press_shutter(&self, button: ShutterButton) -> Result<()> {
        self.send_command(CameraCommand::PressShutterButton, button.wire())
    }

    pub fn bulb_start(&self) -> Result<()> {
        self.send_command(CameraCommand::BulbStart, 0)
    }

    pub fn bulb_end(&self) -> Result<()> {
        self.send_command(CameraCommand::BulbEnd, 0)
    }

    /// Restart the camera's auto power-off timer
    pub fn extend_shutdown_timer(&self) -> Result<()> {
        self.send_command(CameraCommand::ExtendShutDownTimer, 0)
    }

    pub fn lock_ui(&self) -> Result<()> {
        self.send_status_command(StatusCommand::UiLock, 0)
    }

    pub fn unlock_ui(&self) -> Result<()> {
        self.send_status_command(StatusCommand::UiUnlock, 0)
    }

    /// Time left before auto power-off, once the camera announced it
    pub fn shutdown_remaining(&self) -> Option<Duration> {
        self.inner
            .shutdown_deadline
            .lock()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Current value of a property
    ///
    /// Served from the snapshot when cached, otherwise read from the device
    /// and stored.
    pub fn get_property(&self, target: impl Into<ObjectRef>, id: PropertyId) -> Result<TaggedValue> {
        let target = target.into();
        self.inner.require_open()?;
        self.inner.own(target)?;

        match self.inner.registry.get(target, id) {
            Ok(value) => Ok(value),
            Err(StateError::NotCached { .. }) => self.inner.read_from_device(target, id),
            Err(err) => Err(err.into()),
        }
    }

    /// Write a property
    ///
    /// The snapshot is only updated after the device acknowledged the write.
    pub fn set_property(
        &self,
        target: impl Into<ObjectRef>,
        id: PropertyId,
        value: TaggedValue,
    ) -> Result<()> {
        let target = target.into();
        self.inner.require_open()?;
        self.inner.own(target)?;

        let _guard = self.inner.write_lock.lock();
        let payload = self.inner.registry.prepare_set(target, id, &value)?;
        let device_target = self.inner.property_target(target, id)?;

        self.inner
            .transport
            .write_property(self.inner.port(), device_target, id, &payload)?;
        let changed = self.inner.registry.commit(target, id, value);

        debug!(%target, property = %id, changed, "property written");
        Ok(())
    }

    /// Legal values of an enumerable property
    ///
    /// `None` when the property has no descriptor on this target. Fetched
    /// from the device on first use and cached until it reports a change.
    pub fn describe(&self, target: impl Into<ObjectRef>, id: PropertyId) -> Result<Option<PropertyDesc>> {
        let target = target.into();
        self.inner.own(target)?;

        if !self.inner.registry.is_describable(target, id) {
            return Ok(None);
        }
        if let Some(desc) = self.inner.registry.describe(target, id) {
            return Ok(Some(desc));
        }

        self.inner.require_open()?;
        match self.inner.transport.read_property_desc(self.inner.port(), id) {
            Ok(desc) => {
                self.inner.registry.store_desc(target, id, desc.clone())?;
                Ok(Some(desc))
            }
            Err(TransportError::NotSupported) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Raw legal values of a camera property, empty when unrestricted
    pub fn legal_values(&self, id: PropertyId) -> Result<Vec<i32>> {
        Ok(self
            .describe(self.inner.camera, id)?
            .map(|desc| desc.values().to_vec())
            .unwrap_or_default())
    }

    fn get_u32(&self, id: PropertyId) -> Result<u32> {
        let value = self.get_property(self.inner.camera, id)?;
        value.as_u32().ok_or_else(|| mismatch(id, &value))
    }

    fn set_u32(&self, id: PropertyId, raw: u32) -> Result<()> {
        self.set_property(self.inner.camera, id, TaggedValue::UInt32(raw))
    }

    /// Choose where captured images are stored
    ///
    /// When the host receives images the camera is told it has room for
    /// them, otherwise it refuses to shoot.
    pub fn set_save_to(&self, save_to: SaveTo) -> Result<()> {
        self.set_u32(PropertyId::SaveTo, save_to.wire())?;
        if save_to != SaveTo::Camera {
            self.set_capacity(Capacity::unlimited())?;
        }
        Ok(())
    }

    /// Announce the free space on the host
    pub fn set_capacity(&self, capacity: Capacity) -> Result<()> {
        self.inner.require_open()?;
        self.inner
            .transport
            .set_capacity(self.inner.port(), capacity)?;
        debug!(camera = %self.inner.camera, free_bytes = capacity.free_bytes(), "capacity set");
        Ok(())
    }

    /// Switch live view on or off, leaving depth-of-field preview off
    pub fn set_evf_mode(&self, mode: EvfMode) -> Result<()> {
        self.set_u32(PropertyId::EvfMode, mode.wire())?;
        self.set_u32(
            PropertyId::EvfDepthOfFieldPreview,
            EvfDepthOfFieldPreview::Off.wire(),
        )
    }

    pub fn set_output_device(&self, device: EvfOutputDevice) -> Result<()> {
        self.set_u32(PropertyId::EvfOutputDevice, device.wire())
    }

    pub fn iso_speed(&self) -> Result<u32> {
        self.get_u32(PropertyId::IsoSpeed)
    }

    pub fn set_iso_speed(&self, raw: u32) -> Result<()> {
        self.set_u32(PropertyId::IsoSpeed, raw)
    }

    /// Aperture, as the camera's raw code
    pub fn av(&self) -> Result<u32> {
        self.get_u32(PropertyId::Av)
    }

    pub fn set_av(&self, raw: u32) -> Result<()> {
        self.set_u32(PropertyId::Av, raw)
    }

    /// Shutter speed, as the camera's raw code
    pub fn tv(&self) -> Result<u32> {
        self.get_u32(PropertyId::Tv)
    }

    pub fn set_tv(&self, raw: u32) -> Result<()> {
        self.set_u32(PropertyId::Tv, raw)
    }

    /// White balance, `None` for a value outside the known set
    pub fn white_balance(&self) -> Result<Option<WhiteBalance>> {
        let value = self.get_property(self.inner.camera, PropertyId::WhiteBalance)?;
        let raw = value
            .as_i32()
            .ok_or_else(|| mismatch(PropertyId::WhiteBalance, &value))?;
        Ok(WhiteBalance::from_wire(raw))
    }

    pub fn set_white_balance(&self, white_balance: WhiteBalance) -> Result<()> {
        self.set_property(
            self.inner.camera,
            PropertyId::WhiteBalance,
            TaggedValue::Int32(white_balance.wire()),
        )
    }

    pub fn image_quality(&self) -> Result<ImageQuality> {
        self.get_u32(PropertyId::ImageQuality).map(ImageQuality::from)
    }

    pub fn set_image_quality(&self, quality: ImageQuality) -> Result<()> {
        self.set_u32(PropertyId::ImageQuality, quality.into())
    }

    /// Report changes of a camera property through [`Self::changes`]
    pub fn watch(&self, id: PropertyId) {
        self.inner.registry.watch(self.inner.camera, id);
    }

    pub fn unwatch(&self, id: PropertyId) {
        self.inner.registry.unwatch(self.inner.camera, id);
    }

    /// Blocking iterator over watched property changes
    pub fn changes(&self) -> PropertyChanges {
        self.inner.registry.changes()
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    /// Download an item's content into `stream`
    ///
    /// Returns the number of bytes written. A pending transfer of the item
    /// is completed.
    pub fn download<C>(&self, item: DirItemRef, stream: &mut StreamHandle<C>) -> Result<u64> {
        self.download_with_progress(item, stream, |_| true)
    }

    /// Download with a progress callback
    ///
    /// `progress` receives the completed percentage after every chunk and
    /// returns `false` to cancel; the transfer is then cancelled on the
    /// device and [`SdkError::TransferCancelled`] returned. A download that
    /// fails partway, because the object ended early or `stream` refused
    /// bytes, cancels a pending transfer of the item as well.
    pub fn download_with_progress<C, F>(
        &self,
        item: DirItemRef,
        stream: &mut StreamHandle<C>,
        mut progress: F,
    ) -> Result<u64>
    where
        F: FnMut(u32) -> bool,
    {
        let handle = ObjectRef::from(item);
        self.inner.require_open()?;
        self.inner.own(handle)?;

        let object_id = self.inner.arena.device_id(handle)?;
        let port = self.inner.port();
        let size = self.inner.transport.item_info(port, object_id)?.size;

        let mut buf = vec![0u8; self.inner.config.transfer_block_size];
        let mut offset = 0u64;
        while offset < size {
            let want = usize::try_from(size - offset)
                .unwrap_or(usize::MAX)
                .min(buf.len());
            let copied = self
                .read_chunk(object_id, offset, size, &mut buf[..want])
                .and_then(|read| {
                    stream.write_all(&buf[..read])?;
                    Ok(read)
                });
            let read = match copied {
                Ok(read) => read,
                Err(err) => {
                    self.abandon_transfer(handle, object_id);
                    return Err(err);
                }
            };
            offset += read as u64;

            let percent = (offset * 100 / size) as u32;
            if !progress(percent) {
                self.cancel_device_transfer(handle, object_id)?;
                warn!(item = %handle, offset, size, "download cancelled");
                return Err(SdkError::TransferCancelled(handle));
            }
        }

        self.inner.transport.finish_transfer(port, object_id)?;
        self.events.transfers().complete(handle);
        debug!(item = %handle, size, "download complete");
        Ok(offset)
    }

    fn read_chunk(&self, object_id: u32, offset: u64, size: u64, buf: &mut [u8]) -> Result<usize> {
        let read = self
            .inner
            .transport
            .read_object(self.inner.port(), object_id, offset, buf)?;
        if read == 0 {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("object ended after {offset} of {size} bytes"),
            ))
            .into());
        }
        Ok(read)
    }

    /// Cancel a pending transfer after a failed download
    fn abandon_transfer(&self, item: ObjectRef, object_id: u32) {
        if !self.events.transfers().is_pending(item) {
            return;
        }
        match self.cancel_device_transfer(item, object_id) {
            Ok(()) => warn!(%item, "download failed, transfer cancelled"),
            Err(err) => warn!(%item, "download failed and the transfer could not be cancelled: {}", err),
        }
    }

    fn cancel_device_transfer(&self, item: ObjectRef, object_id: u32) -> Result<()> {
        self.inner
            .transport
            .cancel_transfer(self.inner.port(), object_id)?;
        self.events.transfers().cancel(item);
        Ok(())
    }

    /// Drop a transfer the camera requested without downloading it
    pub fn cancel_transfer(&self, item: DirItemRef) -> Result<()> {
        let handle = ObjectRef::from(item);
        self.inner.require_open()?;
        self.inner.own(handle)?;

        if !self.events.transfers().is_pending(handle) {
            return Err(SdkError::NoPendingTransfer(handle));
        }
        let object_id = self.inner.arena.device_id(handle)?;
        self.cancel_device_transfer(handle, object_id)
    }

    /// Transfers the camera is waiting on, oldest first
    pub fn pending_transfers(&self) -> Vec<PendingTransfer> {
        self.events.transfers().pending()
    }

    /// Fetch one live-view frame into `stream`
    ///
    /// The frame's metadata is stored under the returned handle; release it
    /// through the system when done.
    pub fn download_evf_image<C>(&self, stream: &mut StreamHandle<C>) -> Result<EvfImageRef> {
        self.inner.require_open()?;
        let frame = self.inner.transport.read_evf_frame(self.inner.port())?;
        stream.write_all(&frame.image)?;

        let handle = self.inner.arena.insert(
            RefKind::EvfImage,
            Some(self.inner.camera),
            self.inner.evf_sequence.fetch_add(1, Ordering::Relaxed),
            HandleData::None,
        )?;

        for (id, raw) in &frame.properties {
            if let Err(err) =
                self.inner
                    .registry
                    .apply_device_value(handle, *id, raw.data_type, &raw.payload)
            {
                warn!(property = %id, "dropping live-view metadata: {}", err);
            }
        }

        Ok(EvfImageRef::try_from(handle)?)
    }

    /// Delete a file from the camera's storage
    pub fn delete_item(&self, item: DirItemRef) -> Result<()> {
        let handle = ObjectRef::from(item);
        self.inner.require_open()?;
        self.inner.own(handle)?;

        let object_id = self.inner.arena.device_id(handle)?;
        self.inner.transport.delete_item(self.inner.port(), object_id)?;
        self.inner.registry.invalidate(handle);
        info!(item = %handle, "item deleted");
        Ok(())
    }

    pub fn format_volume(&self, volume: VolumeRef) -> Result<()> {
        let handle = ObjectRef::from(volume);
        self.inner.require_open()?;
        self.inner.own(handle)?;

        let volume_id = self.inner.arena.device_id(handle)?;
        self.inner
            .transport
            .format_volume(self.inner.port(), volume_id)?;
        info!(volume = %handle, "volume formatted");
        Ok(())
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register a handler on one channel
    ///
    /// Handlers run on the channel's worker thread after the session has
    /// applied the event to its own state.
    pub fn subscribe<F>(&self, channel: EventChannel, handler: F) -> Subscription
    where
        F: Fn(&EventRecord) -> HandlerResult + Send + Sync + 'static,
    {
        self.events.subscribe(channel, handler)
    }

    /// Blocking iterator over one channel, starting now
    pub fn events(&self, channel: EventChannel) -> EventIterator {
        self.events.iter(channel)
    }

    pub fn event_manager(&self) -> &EventManager {
        &self.events
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Close the session
    ///
    /// Transfers the camera still holds are cancelled first when
    /// configured. Event delivery stops before the device session closes.
    pub fn close(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.inner.config.cancel_pending_on_close {
            for pending in self.events.transfers().drain() {
                warn!(item = %pending.item, origin = %pending.origin, "cancelling pending transfer on close");
                let cancelled = self
                    .inner
                    .arena
                    .device_id(pending.item)
                    .map_err(SdkError::from)
                    .and_then(|id| Ok(self.inner.transport.cancel_transfer(self.inner.port(), id)?));
                if let Err(err) = cancelled {
                    warn!(item = %pending.item, "cancel on close failed: {}", err);
                }
            }
        }

        self.inner.set_mode(SessionState::Closed);
        self.events.shutdown();
        let result = self.inner.transport.close_session(self.inner.port());

        let adopted: Vec<_> = self.inner.adopted.lock().drain(..).collect();
        for handle in adopted.into_iter().chain([self.inner.camera]) {
            if let Err(err) = self.inner.release(handle) {
                debug!(%handle, "release on close: {}", err);
            }
        }

        info!(camera = %self.inner.camera, "session closed");
        result.map_err(SdkError::from)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            warn!("closing session on drop failed: {}", err);
        }
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("camera", &self.inner.camera)
            .field("port", &self.inner.device.port_name)
            .field("state", &self.state())
            .finish()
    }
}

fn mismatch(id: PropertyId, value: &TaggedValue) -> SdkError {
    let expected = id
        .spec()
        .map(|spec| spec.data_type)
        .unwrap_or_else(|| value.data_type());
    StateError::TypeMismatch {
        property: id,
        expected,
        actual: value.data_type(),
    }
    .into()
}
