//! Error types for the eds-stream crate.

use std::io;

use crate::handle::{SeekOrigin, StreamOp};

pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors raised by stream operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The stream was built without this operation
    #[error("stream has no {0} operation")]
    Unbound(StreamOp),

    /// Fault in the backing storage or transport
    #[error("stream I/O error: {0}")]
    Io(#[from] io::Error),

    /// Target position falls before the start of the stream
    #[error("cannot seek {offset} bytes from {origin}")]
    InvalidSeek { offset: i64, origin: SeekOrigin },

    /// Target position lies beyond the limit of the stream
    #[error("position {requested} exceeds the stream limit of {limit} bytes")]
    LimitExceeded { requested: u64, limit: u64 },

    /// The stream accepted fewer bytes than were handed to it
    #[error("short write: {written} of {requested} bytes accepted")]
    ShortWrite { requested: usize, written: usize },
}

impl StreamError {
    /// Whether the error is a fault of the storage rather than of the caller
    pub fn is_io(&self) -> bool {
        matches!(self, StreamError::Io(_) | StreamError::ShortWrite { .. })
    }
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(inner) => inner,
            StreamError::Unbound(_) => io::Error::new(io::ErrorKind::Unsupported, err),
            StreamError::InvalidSeek { .. } | StreamError::LimitExceeded { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            StreamError::ShortWrite { .. } => io::Error::new(io::ErrorKind::WriteZero, err),
        }
    }
}
