use std::io;
use thiserror::Error;

/// Errors raised while ingesting or routing device events
#[derive(Error, Debug)]
pub enum EventError {
    /// Event code belongs to no channel table
    #[error("unknown event code {0:#x}")]
    UnknownEvent(u32),

    /// Raw frame is not exactly 12 bytes
    #[error("event frame must be 12 bytes, got {len}")]
    MalformedFrame { len: usize },

    /// Event manager has shut down
    #[error("event manager has been shut down")]
    Closed,

    /// Worker thread could not be started
    #[error("failed to spawn event worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("invalid event manager configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for event manager operations
pub type Result<T> = std::result::Result<T, EventError>;
