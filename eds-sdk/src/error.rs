use thiserror::Error;

use eds_api::{ObjectRef, WrongKind};
use eds_codec::CodecError;
use eds_event_manager::EventError;
use eds_state::StateError;
use eds_stream::StreamError;

use crate::handle::HandleError;
use crate::shutter::{CommandError, SessionState};
use crate::transport::TransportError;

/// Coarse classification every SDK error maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Tag and value shape disagree
    TypeMismatch,
    /// Write to a read-only property or read of a write-only one
    AccessDenied,
    /// Identifier or command unknown to this reference category or device
    NotSupported,
    /// Session or reference not in a state that accepts the operation
    NotReady,
    /// Stream or transport fault
    Io,
    /// Device-side fault; the session should be torn down
    Internal,
    InvalidArgument,
}

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("property error: {0}")]
    State(#[from] StateError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("event manager error: {0}")]
    Event(#[from] EventError),

    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error("command refused: {0}")]
    Command(#[from] CommandError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("session is {0}")]
    SessionNotOpen(SessionState),

    #[error("no camera at index {0}")]
    NoSuchCamera(usize),

    /// Handle belongs to a different camera than the session
    #[error("{0} does not belong to this session")]
    ForeignObject(ObjectRef),

    #[error("{0} has no pending transfer")]
    NoPendingTransfer(ObjectRef),

    #[error("transfer of {0} was cancelled")]
    TransferCancelled(ObjectRef),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl From<WrongKind> for SdkError {
    fn from(err: WrongKind) -> Self {
        SdkError::Handle(HandleError::WrongKind(err))
    }
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::State(err) => match err {
                StateError::NotSupported { .. } | StateError::Unresolved(_) => {
                    ErrorKind::NotSupported
                }
                StateError::AccessDenied { .. } => ErrorKind::AccessDenied,
                StateError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
                StateError::InvalidValue { .. } => ErrorKind::InvalidArgument,
                StateError::NotCached { .. } => ErrorKind::NotReady,
                StateError::Codec(codec) => codec_kind(codec),
            },
            SdkError::Codec(err) => codec_kind(err),
            SdkError::Stream(err) => match err {
                StreamError::Unbound(_) => ErrorKind::NotSupported,
                StreamError::InvalidSeek { .. } => ErrorKind::InvalidArgument,
                StreamError::Io(_)
                | StreamError::LimitExceeded { .. }
                | StreamError::ShortWrite { .. } => ErrorKind::Io,
            },
            SdkError::Event(err) => match err {
                EventError::Closed => ErrorKind::NotReady,
                EventError::Spawn(_) => ErrorKind::Internal,
                EventError::UnknownEvent(_)
                | EventError::MalformedFrame { .. }
                | EventError::InvalidConfig(_) => ErrorKind::InvalidArgument,
            },
            SdkError::Handle(_) => ErrorKind::InvalidArgument,
            SdkError::Command(err) => match err {
                CommandError::SessionNotOpen(_) | CommandError::OutOfSequence { .. } => {
                    ErrorKind::NotReady
                }
                CommandError::NotAllowed { .. } => ErrorKind::NotSupported,
                CommandError::InvalidParameter { .. } => ErrorKind::InvalidArgument,
            },
            SdkError::Transport(err) => match err {
                TransportError::Disconnected(_) | TransportError::Busy => ErrorKind::NotReady,
                TransportError::NotSupported => ErrorKind::NotSupported,
                TransportError::Rejected(_) => ErrorKind::Internal,
                TransportError::Io(_) => ErrorKind::Io,
            },
            SdkError::SessionNotOpen(_) | SdkError::NoPendingTransfer(_) => ErrorKind::NotReady,
            SdkError::TransferCancelled(_) => ErrorKind::Io,
            SdkError::NoSuchCamera(_)
            | SdkError::ForeignObject(_)
            | SdkError::Config(_)
            | SdkError::ConfigParse(_) => ErrorKind::InvalidArgument,
        }
    }
}

fn codec_kind(err: &CodecError) -> ErrorKind {
    if err.is_type_mismatch() {
        ErrorKind::TypeMismatch
    } else {
        ErrorKind::InvalidArgument
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use eds_api::{Access, PropertyId};

    #[test]
    fn test_taxonomy_mapping() {
        let denied: SdkError = StateError::AccessDenied {
            property: PropertyId::BatteryLevel,
            access: Access::Read,
        }
        .into();
        assert_eq!(denied.kind(), ErrorKind::AccessDenied);

        let bulb: SdkError = CommandError::OutOfSequence {
            command: "BulbEnd",
            requires: "BulbStart",
        }
        .into();
        assert_eq!(bulb.kind(), ErrorKind::NotReady);

        let io: SdkError = StreamError::ShortWrite {
            requested: 4,
            written: 1,
        }
        .into();
        assert_eq!(io.kind(), ErrorKind::Io);
    }
}
