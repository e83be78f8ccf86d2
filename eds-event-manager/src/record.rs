//! Classified event records
//!
//! A [`RawFrame`] is classified into exactly one of three record kinds by
//! the range of its event code. Sentinels the device folds into the numeric
//! space (`All` codes, the `Unknown` property id, a zero cancel parameter)
//! become explicit variants here.

use std::time::Duration;

use eds_api::{
    EventChannel, ObjectEventKind, ObjectRef, PropertyEventKind, PropertyId, RefKind,
    StateEventKind,
};

use crate::error::{EventError, Result};
use crate::frame::RawFrame;

/// Maps a device-side object id to a handle
///
/// Implemented by whoever owns the handle arena. Returning `None` leaves
/// the subject of the event unspecified.
pub trait ObjectResolver: Send + Sync {
    fn resolve(&self, kind: RefKind, raw: u32) -> Option<ObjectRef>;
}

impl<F> ObjectResolver for F
where
    F: Fn(RefKind, u32) -> Option<ObjectRef> + Send + Sync,
{
    fn resolve(&self, kind: RefKind, raw: u32) -> Option<ObjectRef> {
        self(kind, raw)
    }
}

/// Resolver that never maps anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl ObjectResolver for NullResolver {
    fn resolve(&self, _kind: RefKind, _raw: u32) -> Option<ObjectRef> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEvent {
    pub kind: PropertyEventKind,
    /// Identifier exactly as reported, including the `Unknown` sentinel
    pub raw_property: u32,
    pub param: u32,
}

impl PropertyEvent {
    /// The changed property, `None` for the sentinel or an unlisted id
    pub fn property(&self) -> Option<PropertyId> {
        PropertyId::from_wire(self.raw_property).filter(|id| *id != PropertyId::Unknown)
    }

    /// Whether the receiver has to re-read every property
    pub fn requires_full_requery(&self) -> bool {
        self.kind == PropertyEventKind::All || self.property().is_none()
    }
}

/// Subject of an object event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectSubject {
    Object(ObjectRef),
    /// Zero-parameter cancel: every pending direct transfer, listed
    AllPending { cancelled: Vec<ObjectRef> },
    /// Catch-all event, or an id no handle could be found for
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEvent {
    pub kind: ObjectEventKind,
    pub subject: ObjectSubject,
    /// Device-side object id as reported
    pub raw_subject: u32,
}

impl ObjectEvent {
    pub fn object(&self) -> Option<ObjectRef> {
        match self.subject {
            ObjectSubject::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Whether the receiver must download or cancel the subject
    pub fn requests_transfer(&self) -> bool {
        matches!(
            self.kind,
            ObjectEventKind::DirItemRequestTransfer | ObjectEventKind::DirItemRequestTransferDt
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEvent {
    pub kind: StateEventKind,
    pub data: u32,
}

impl StateEvent {
    /// Time left before auto power-off, for the countdown events
    pub fn remaining(&self) -> Option<Duration> {
        match self.kind {
            StateEventKind::WillSoonShutDown | StateEventKind::ShutDownTimerUpdate => {
                Some(Duration::from_secs(u64::from(self.data)))
            }
            _ => None,
        }
    }

    /// The session can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        self.kind == StateEventKind::InternalError
    }

    pub fn job_pending(&self) -> bool {
        self.kind == StateEventKind::JobStatusChanged && self.data != 0
    }
}

/// One classified device notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRecord {
    Property(PropertyEvent),
    Object(ObjectEvent),
    State(StateEvent),
}

impl EventRecord {
    /// Classify a raw frame
    ///
    /// Fails only for event codes outside the three channel tables.
    pub fn from_frame(frame: RawFrame, resolver: &dyn ObjectResolver) -> Result<Self> {
        let unknown = || EventError::UnknownEvent(frame.event);
        let channel = EventChannel::of_code(frame.event).ok_or_else(unknown)?;

        let record = match channel {
            EventChannel::Property => EventRecord::Property(PropertyEvent {
                kind: PropertyEventKind::from_wire(frame.event).ok_or_else(unknown)?,
                raw_property: frame.subject,
                param: frame.param,
            }),
            EventChannel::Object => {
                let kind = ObjectEventKind::from_wire(frame.event).ok_or_else(unknown)?;
                EventRecord::Object(ObjectEvent {
                    kind,
                    subject: object_subject(kind, frame.subject, resolver),
                    raw_subject: frame.subject,
                })
            }
            EventChannel::State => EventRecord::State(StateEvent {
                kind: StateEventKind::from_wire(frame.event).ok_or_else(unknown)?,
                data: frame.subject,
            }),
        };
        Ok(record)
    }

    pub fn channel(&self) -> EventChannel {
        match self {
            EventRecord::Property(_) => EventChannel::Property,
            EventRecord::Object(_) => EventChannel::Object,
            EventRecord::State(_) => EventChannel::State,
        }
    }

    /// Event code on the wire
    pub fn code(&self) -> u32 {
        match self {
            EventRecord::Property(event) => event.kind.wire(),
            EventRecord::Object(event) => event.kind.wire(),
            EventRecord::State(event) => event.kind.wire(),
        }
    }

    /// Whether this is the `All` member of its channel
    pub fn is_catch_all(&self) -> bool {
        match self {
            EventRecord::Property(event) => event.kind == PropertyEventKind::All,
            EventRecord::Object(event) => event.kind == ObjectEventKind::All,
            EventRecord::State(event) => event.kind == StateEventKind::All,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyEvent> {
        match self {
            EventRecord::Property(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectEvent> {
        match self {
            EventRecord::Object(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<&StateEvent> {
        match self {
            EventRecord::State(event) => Some(event),
            _ => None,
        }
    }
}

fn object_subject(kind: ObjectEventKind, raw: u32, resolver: &dyn ObjectResolver) -> ObjectSubject {
    match kind {
        ObjectEventKind::All => ObjectSubject::Unspecified,
        // Filled in by the transfer tracker at ingestion
        ObjectEventKind::DirItemCancelTransferDt if raw == 0 => ObjectSubject::AllPending {
            cancelled: Vec::new(),
        },
        _ => {
            let ref_kind = if kind.targets_volume() {
                RefKind::Volume
            } else {
                RefKind::DirectoryItem
            };
            resolver
                .resolve(ref_kind, raw)
                .map(ObjectSubject::Object)
                .unwrap_or(ObjectSubject::Unspecified)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_resolver(kind: RefKind, raw: u32) -> Option<ObjectRef> {
        Some(ObjectRef::new(kind, raw, 0))
    }

    #[test]
    fn test_property_frame() {
        let record = EventRecord::from_frame(RawFrame::new(0x101, 0x402, 0), &NullResolver).unwrap();
        let event = record.as_property().unwrap();
        assert_eq!(event.property(), Some(PropertyId::IsoSpeed));
        assert!(!event.requires_full_requery());
        assert_eq!(record.channel(), EventChannel::Property);
    }

    #[test]
    fn test_unknown_property_requires_requery() {
        let record = EventRecord::from_frame(RawFrame::new(0x101, 0xffff, 0), &NullResolver).unwrap();
        let event = record.as_property().unwrap();
        assert_eq!(event.property(), None);
        assert_eq!(event.raw_property, 0xffff);
        assert!(event.requires_full_requery());
    }

    #[test]
    fn test_cancel_zero_is_all_pending() {
        let record =
            EventRecord::from_frame(RawFrame::new(0x20a, 0, 0), &item_resolver).unwrap();
        assert_eq!(
            record.as_object().unwrap().subject,
            ObjectSubject::AllPending { cancelled: vec![] }
        );

        let record =
            EventRecord::from_frame(RawFrame::new(0x20a, 9, 0), &item_resolver).unwrap();
        assert_eq!(
            record.as_object().unwrap().object(),
            Some(ObjectRef::new(RefKind::DirectoryItem, 9, 0))
        );
    }

    #[test]
    fn test_volume_events_resolve_volumes() {
        let record =
            EventRecord::from_frame(RawFrame::new(0x20c, 3, 0), &item_resolver).unwrap();
        assert_eq!(record.as_object().unwrap().object().unwrap().kind(), RefKind::Volume);
    }

    #[test]
    fn test_state_countdown() {
        let record = EventRecord::from_frame(RawFrame::new(0x303, 30, 0), &NullResolver).unwrap();
        assert_eq!(
            record.as_state().unwrap().remaining(),
            Some(Duration::from_secs(30))
        );
        let record = EventRecord::from_frame(RawFrame::new(0x306, 0, 0), &NullResolver).unwrap();
        assert!(record.as_state().unwrap().is_fatal());
    }

    #[test]
    fn test_unknown_codes() {
        let err = EventRecord::from_frame(RawFrame::new(0x20b, 0, 0), &NullResolver).unwrap_err();
        assert!(matches!(err, EventError::UnknownEvent(0x20b)));
        let err = EventRecord::from_frame(RawFrame::new(0x500, 0, 0), &NullResolver).unwrap_err();
        assert!(matches!(err, EventError::UnknownEvent(0x500)));
    }
}
