//! # EDS Event Manager
//!
//! Classifies device notifications into three independent channels and
//! delivers them to subscribers on background threads.
//!
//! ## Key Features
//!
//! - **Three channels**: property, object and state records never share a
//!   queue, so ordering holds per channel and a slow handler on one channel
//!   does not delay the others
//! - **Owned subscriptions**: subscribing returns a [`Subscription`] that
//!   unsubscribes on drop
//! - **Failure isolation**: a handler that errors or panics is reported to a
//!   [`DiagnosticSink`] and the remaining handlers still run
//! - **Transfer tracking**: pending image transfers are tracked at ingestion,
//!   and a zero-parameter cancel is expanded into the items it cancelled
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use eds_api::{EventChannel, ObjectRef, RefKind};
//! use eds_event_manager::{EventManager, ObjectSubject, RawFrame};
//!
//! let resolver = |kind: RefKind, raw: u32| Some(ObjectRef::new(kind, raw, 0));
//! let manager = EventManager::with_resolver(Arc::new(resolver))?;
//! let objects = manager.iter(EventChannel::Object);
//!
//! let ingress = manager.ingress();
//! ingress.on_device_event(RawFrame::new(0x209, 7, 0))?; // direct transfer request
//! assert_eq!(manager.transfers().len(), 1);
//!
//! ingress.on_device_event(RawFrame::new(0x20a, 0, 0))?; // cancel all
//! let cancel = objects.timeout_iter(Duration::from_secs(1)).nth(1).unwrap();
//! assert_eq!(
//!     cancel.as_object().unwrap().subject,
//!     ObjectSubject::AllPending { cancelled: vec![ObjectRef::new(RefKind::DirectoryItem, 7, 0)] }
//! );
//! # Ok::<(), eds_event_manager::EventError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! transport ──▶ EventIngress ──▶ classify ──▶ TransferTracker ──┬─▶ property worker ──▶ handlers
//!                                                              ├─▶ object worker   ──▶ handlers
//!                                                              └─▶ state worker    ──▶ handlers
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod iter;
pub mod manager;
pub mod record;
pub mod transfer;
pub mod worker;

pub use config::EventManagerConfig;
pub use dispatcher::{
    DiagnosticSink, DispatchReport, Dispatcher, HandlerFailure, HandlerResult, Subscription,
    SubscriptionToken, TracingSink,
};
pub use error::{EventError, Result};
pub use frame::RawFrame;
pub use iter::EventIterator;
pub use manager::{EventIngress, EventManager};
pub use record::{
    EventRecord, NullResolver, ObjectEvent, ObjectResolver, ObjectSubject, PropertyEvent,
    StateEvent,
};
pub use transfer::{PendingTransfer, TransferTracker};

// Re-export commonly used types from dependencies
pub use eds_api::EventChannel;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EventChannel, EventError, EventIngress, EventIterator, EventManager, EventManagerConfig,
        EventRecord, RawFrame, Result, Subscription,
    };
}
