//! Memory-backed streams
//!
//! Seek behavior of [`MemoryBuffer`]:
//!
//! - a target before position 0 fails with [`StreamError::InvalidSeek`];
//! - a target past the end is allowed, up to the optional limit;
//! - a target past the limit fails with [`StreamError::LimitExceeded`];
//!   an unlimited buffer is still bounded by [`MAX_MEMORY_LEN`];
//! - a write after seeking past the end zero-fills the gap;
//! - a write that would cross the limit is cut short at the limit.

use std::io;

use crate::error::{Result, StreamError};
use crate::handle::{SeekOrigin, StreamHandle};

/// Largest size a buffer may reach, the limit of an unlimited buffer
pub const MAX_MEMORY_LEN: u64 = isize::MAX as u64;

/// Growable byte buffer with a cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBuffer {
    data: Vec<u8>,
    position: u64,
    limit: Option<u64>,
}

impl MemoryBuffer {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            data: Vec::new(),
            position: 0,
            limit,
        }
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            position: 0,
            limit: None,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    fn effective_limit(&self) -> u64 {
        self.limit.map_or(MAX_MEMORY_LEN, |limit| limit.min(MAX_MEMORY_LEN))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn memory_read(buffer: &mut MemoryBuffer, out: &mut [u8]) -> io::Result<usize> {
    let start = usize::try_from(buffer.position).unwrap_or(usize::MAX);
    if start >= buffer.data.len() {
        return Ok(0);
    }
    let n = out.len().min(buffer.data.len() - start);
    out[..n].copy_from_slice(&buffer.data[start..start + n]);
    buffer.position += n as u64;
    Ok(n)
}

fn memory_write(buffer: &mut MemoryBuffer, data: &[u8]) -> io::Result<usize> {
    let allowed = buffer.effective_limit().saturating_sub(buffer.position);
    let n = data.len().min(usize::try_from(allowed).unwrap_or(usize::MAX));
    if n == 0 {
        return Ok(0);
    }

    let out_of_memory = || io::Error::new(io::ErrorKind::OutOfMemory, "position exceeds memory");
    let start = usize::try_from(buffer.position).map_err(|_| out_of_memory())?;
    let end = start.checked_add(n).ok_or_else(out_of_memory)?;
    if buffer.data.len() < end {
        buffer
            .data
            .try_reserve(end - buffer.data.len())
            .map_err(|err| io::Error::new(io::ErrorKind::OutOfMemory, err))?;
        buffer.data.resize(end, 0);
    }
    buffer.data[start..end].copy_from_slice(&data[..n]);
    buffer.position = end as u64;
    Ok(n)
}

fn memory_seek(buffer: &mut MemoryBuffer, offset: i64, origin: SeekOrigin) -> Result<u64> {
    let base = match origin {
        SeekOrigin::Current => buffer.position,
        SeekOrigin::Begin => 0,
        SeekOrigin::End => buffer.data.len() as u64,
    };
    let target = i128::from(base) + i128::from(offset);
    if target < 0 {
        return Err(StreamError::InvalidSeek { offset, origin });
    }
    let target = u64::try_from(target).map_err(|_| StreamError::InvalidSeek { offset, origin })?;
    let limit = buffer.effective_limit();
    if target > limit {
        return Err(StreamError::LimitExceeded {
            requested: target,
            limit,
        });
    }
    buffer.position = target;
    Ok(target)
}

fn memory_tell(buffer: &mut MemoryBuffer) -> Result<u64> {
    Ok(buffer.position)
}

fn memory_length(buffer: &mut MemoryBuffer) -> Result<u64> {
    Ok(buffer.data.len() as u64)
}

/// Readable, writable and seekable stream over a fresh buffer
pub fn memory_stream(limit: Option<u64>) -> StreamHandle<MemoryBuffer> {
    StreamHandle::new(MemoryBuffer::new(limit))
        .with_read(memory_read)
        .with_write(memory_write)
        .with_seek(memory_seek)
        .with_tell(memory_tell)
        .with_length(memory_length)
}

/// Read-only stream over existing bytes
pub fn memory_reader(data: impl Into<Vec<u8>>) -> StreamHandle<MemoryBuffer> {
    StreamHandle::new(MemoryBuffer::from_bytes(data))
        .with_read(memory_read)
        .with_seek(memory_seek)
        .with_tell(memory_tell)
        .with_length(memory_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_back() {
        let mut stream = memory_stream(None);
        stream.write_all(b"jpeg").unwrap();
        assert_eq!(stream.tell().unwrap(), 4);
        stream.seek(0, SeekOrigin::Begin).unwrap();
        assert_eq!(&stream.read(16).unwrap()[..], b"jpeg");
        assert_eq!(stream.tell().unwrap(), stream.length().unwrap());
    }

    #[test]
    fn test_seek_before_start_is_invalid() {
        let mut stream = memory_stream(None);
        let err = stream.seek(-1, SeekOrigin::Begin).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InvalidSeek {
                offset: -1,
                origin: SeekOrigin::Begin
            }
        ));
        assert_eq!(stream.tell().unwrap(), 0);
    }

    #[test]
    fn test_gap_is_zero_filled() {
        let mut stream = memory_stream(None);
        stream.seek(3, SeekOrigin::Begin).unwrap();
        stream.write_all(b"x").unwrap();
        assert_eq!(stream.context().as_slice(), &[0, 0, 0, b'x']);
    }

    #[test]
    fn test_limit_cuts_writes_short() {
        let mut stream = memory_stream(Some(4));
        assert_eq!(stream.write(b"abcdef").unwrap(), 4);
        assert_eq!(stream.write(b"g").unwrap(), 0);
        assert!(matches!(
            stream.write_all(b"g"),
            Err(StreamError::ShortWrite { written: 0, .. })
        ));
        assert!(matches!(
            stream.seek(5, SeekOrigin::Begin),
            Err(StreamError::LimitExceeded {
                requested: 5,
                limit: 4
            })
        ));
    }

    #[test]
    fn test_unlimited_buffer_stops_at_max_len() {
        let mut stream = memory_stream(None);
        stream.seek(i64::MAX, SeekOrigin::Begin).unwrap();
        assert!(matches!(
            stream.seek(i64::MAX, SeekOrigin::Current),
            Err(StreamError::LimitExceeded {
                limit: MAX_MEMORY_LEN,
                ..
            })
        ));
        assert!(stream.seek(1, SeekOrigin::Current).is_err());

        assert_eq!(stream.tell().unwrap(), MAX_MEMORY_LEN);
        assert_eq!(stream.write(b"x").unwrap(), 0);
        assert!(matches!(
            stream.write_all(b"x"),
            Err(StreamError::ShortWrite { written: 0, .. })
        ));
        assert!(stream.context().is_empty());
    }

    #[test]
    fn test_reader_is_read_only() {
        let mut stream = memory_reader(vec![1, 2, 3]);
        assert!(!stream.is_writable());
        stream.seek(-1, SeekOrigin::End).unwrap();
        assert_eq!(&stream.read(8).unwrap()[..], &[3]);
    }
}
