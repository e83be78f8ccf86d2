//! Streams over `std::io` types
//!
//! This is how a storage collaborator plugs in files, sockets or cursors.
//! Seek limits are those of the wrapped type; a target before position 0
//! is rejected before the wrapped type is asked.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Result, StreamError};
use crate::handle::{SeekOrigin, StreamHandle};

fn io_read<T: Read>(inner: &mut T, buf: &mut [u8]) -> io::Result<usize> {
    inner.read(buf)
}

fn io_write<T: Write>(inner: &mut T, data: &[u8]) -> io::Result<usize> {
    inner.write(data)
}

fn io_seek<T: Seek>(inner: &mut T, offset: i64, origin: SeekOrigin) -> Result<u64> {
    let from = match origin {
        SeekOrigin::Begin => {
            let start = u64::try_from(offset).map_err(|_| StreamError::InvalidSeek { offset, origin })?;
            SeekFrom::Start(start)
        }
        SeekOrigin::Current => SeekFrom::Current(offset),
        SeekOrigin::End => SeekFrom::End(offset),
    };
    inner.seek(from).map_err(|err| match err.kind() {
        io::ErrorKind::InvalidInput => StreamError::InvalidSeek { offset, origin },
        _ => StreamError::Io(err),
    })
}

fn io_tell<T: Seek>(inner: &mut T) -> Result<u64> {
    Ok(inner.stream_position()?)
}

fn io_length<T: Seek>(inner: &mut T) -> Result<u64> {
    let position = inner.stream_position()?;
    let end = inner.seek(SeekFrom::End(0))?;
    if position != end {
        inner.seek(SeekFrom::Start(position))?;
    }
    Ok(end)
}

/// Stream over a readable, writable and seekable value
pub fn io_stream<T: Read + Write + Seek>(inner: T) -> StreamHandle<T> {
    StreamHandle::new(inner)
        .with_read(io_read::<T>)
        .with_write(io_write::<T>)
        .with_seek(io_seek::<T>)
        .with_tell(io_tell::<T>)
        .with_length(io_length::<T>)
}

/// Input-only stream
pub fn reader_stream<T: Read + Seek>(inner: T) -> StreamHandle<T> {
    StreamHandle::new(inner)
        .with_read(io_read::<T>)
        .with_seek(io_seek::<T>)
        .with_tell(io_tell::<T>)
        .with_length(io_length::<T>)
}

/// Output-only stream, e.g. a file opened for writing
pub fn writer_stream<T: Write + Seek>(inner: T) -> StreamHandle<T> {
    StreamHandle::new(inner)
        .with_write(io_write::<T>)
        .with_seek(io_seek::<T>)
        .with_tell(io_tell::<T>)
        .with_length(io_length::<T>)
}
