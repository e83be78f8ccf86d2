//! # EDS SDK - Tethered camera remote control
//!
//! A sync-first session API over a pluggable device [`Transport`]:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use eds_sdk::{EdsSystem, EventChannel, PropertyId, TaggedValue};
//!
//! fn main() -> Result<(), eds_sdk::SdkError> {
//!     let system = EdsSystem::new(Arc::new(my_transport))?;
//!     let list = system.camera_list()?;
//!     let camera = system.camera_at(list, 0)?;
//!     let session = system.open_session(camera)?;
//!
//!     // Validated against the property table before anything is sent
//!     session.set_property(camera, PropertyId::IsoSpeed, TaggedValue::UInt32(0x68))?;
//!
//!     // Served from the shared snapshot, kept current by device events
//!     let iso = session.iso_speed()?;
//!
//!     let transfers = session.events(EventChannel::Object);
//!     session.take_picture()?;
//!     for event in transfers.timeout_iter(std::time::Duration::from_secs(10)) {
//!         println!("{:?}", event);
//!     }
//!
//!     session.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Key Features
//!
//! - **Typed values**: every property is a [`TaggedValue`] whose tag is
//!   checked against the property table on every get and set
//! - **Shared snapshot**: the last confirmed value of every property, kept
//!   current from `PropertyChanged` notifications
//! - **Three event channels**: property, object and state notifications
//!   delivered in order on their own worker threads
//! - **Guarded commands**: shutter, bulb and direct-transfer sequencing is
//!   checked before a command reaches the device
//! - **Streams**: downloads write into any [`StreamHandle`]
//!
//! ## Architecture
//!
//! ```text
//! eds-sdk (EdsSystem, CameraSession)
//!     ↓
//! eds-event-manager (classification, dispatch, transfer tracking)
//!     ↓
//! eds-state (property registry over state-store)
//!     ↓
//! eds-api (identifiers) + eds-codec (tagged values) + eds-stream
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod logging;
pub mod session;
pub mod shutter;
pub mod system;
pub mod transport;

// Main exports
pub use config::SdkConfig;
pub use error::{ErrorKind, Result, SdkError};
pub use handle::{HandleArena, HandleData, HandleError};
pub use session::CameraSession;
pub use shutter::{CommandError, CommandState, SessionState, ShutterState};
pub use system::EdsSystem;
pub use transport::{
    EvfFrame, PropertyTarget, RawProperty, Transport, TransportError, TransportResult,
};

// Re-export commonly used types from the lower layers
pub use eds_api::*;
pub use eds_codec::{Point, Rational, Rect, Time};
pub use eds_event_manager::{
    EventIngress, EventIterator, EventManagerConfig, EventRecord, HandlerResult, ObjectEvent,
    ObjectSubject, PendingTransfer, PropertyEvent, RawFrame, StateEvent, Subscription,
};
pub use eds_state::{PropertyChanges, PropertyRegistry, StateError};
pub use eds_stream::{
    io_stream, memory_reader, memory_stream, reader_stream, writer_stream, MemoryBuffer,
    SeekOrigin, StreamError, StreamHandle,
};
