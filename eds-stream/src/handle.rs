//! Stream handle binding an owner context to operation slots
//!
//! A [`StreamHandle`] never allocates or frees the storage behind it. The
//! owner supplies a context value and the operations it supports; the
//! handle only dispatches to them. What the stream can do follows from
//! which slots are bound.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};

use crate::error::{Result, StreamError};

/// Reference point of a seek
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SeekOrigin {
    Current = 0,
    Begin = 1,
    End = 2,
}

impl SeekOrigin {
    pub const fn wire(self) -> u32 {
        self as u32
    }

    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            0 => Some(SeekOrigin::Current),
            1 => Some(SeekOrigin::Begin),
            2 => Some(SeekOrigin::End),
            _ => None,
        }
    }
}

impl fmt::Display for SeekOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeekOrigin::Current => write!(f, "current position"),
            SeekOrigin::Begin => write!(f, "beginning"),
            SeekOrigin::End => write!(f, "end"),
        }
    }
}

/// Operation slots of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamOp {
    Read,
    Write,
    Seek,
    Tell,
    Length,
}

impl fmt::Display for StreamOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamOp::Read => "read",
            StreamOp::Write => "write",
            StreamOp::Seek => "seek",
            StreamOp::Tell => "tell",
            StreamOp::Length => "length",
        };
        f.write_str(name)
    }
}

pub type ReadFn<C> = fn(&mut C, &mut [u8]) -> io::Result<usize>;
pub type WriteFn<C> = fn(&mut C, &[u8]) -> io::Result<usize>;
pub type SeekFn<C> = fn(&mut C, i64, SeekOrigin) -> Result<u64>;
/// Tell and length take `&mut` so `std::io::Seek` types can answer them;
/// implementations must leave the position unchanged.
pub type TellFn<C> = fn(&mut C) -> Result<u64>;
pub type LengthFn<C> = fn(&mut C) -> Result<u64>;

/// What a stream can do, derived from its bound slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub readable: bool,
    pub writable: bool,
    pub seekable: bool,
}

/// Owner context plus the operations bound to it
pub struct StreamHandle<C> {
    context: C,
    read: Option<ReadFn<C>>,
    write: Option<WriteFn<C>>,
    seek: Option<SeekFn<C>>,
    tell: Option<TellFn<C>>,
    length: Option<LengthFn<C>>,
}

impl<C> StreamHandle<C> {
    /// Handle with no operations bound
    pub fn new(context: C) -> Self {
        Self {
            context,
            read: None,
            write: None,
            seek: None,
            tell: None,
            length: None,
        }
    }

    pub fn with_read(mut self, read: ReadFn<C>) -> Self {
        self.read = Some(read);
        self
    }

    pub fn with_write(mut self, write: WriteFn<C>) -> Self {
        self.write = Some(write);
        self
    }

    pub fn with_seek(mut self, seek: SeekFn<C>) -> Self {
        self.seek = Some(seek);
        self
    }

    pub fn with_tell(mut self, tell: TellFn<C>) -> Self {
        self.tell = Some(tell);
        self
    }

    pub fn with_length(mut self, length: LengthFn<C>) -> Self {
        self.length = Some(length);
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            readable: self.read.is_some(),
            writable: self.write.is_some(),
            seekable: self.seek.is_some(),
        }
    }

    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    /// Read up to `len` bytes
    ///
    /// Fewer bytes are returned only when the stream reaches its end.
    pub fn read(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(len);
        let mut filled = 0;
        while filled < len {
            let n = self.read_into(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf.freeze())
    }

    /// One read call into `buf`, returning the byte count (0 at end)
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read = self.read.ok_or(StreamError::Unbound(StreamOp::Read))?;
        loop {
            match read(&mut self.context, buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => return other.map_err(StreamError::from),
            }
        }
    }

    /// One write call, returning how many bytes the stream accepted
    ///
    /// A count below `data.len()` is a short write; nothing is dropped
    /// silently.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let write = self.write.ok_or(StreamError::Unbound(StreamOp::Write))?;
        loop {
            match write(&mut self.context, data) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => return other.map_err(StreamError::from),
            }
        }
    }

    /// Write every byte or fail with [`StreamError::ShortWrite`]
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < data.len() {
            let n = self.write(&data[written..])?;
            if n == 0 {
                return Err(StreamError::ShortWrite {
                    requested: data.len(),
                    written,
                });
            }
            written += n;
        }
        Ok(())
    }

    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        let seek = self.seek.ok_or(StreamError::Unbound(StreamOp::Seek))?;
        seek(&mut self.context, offset, origin)
    }

    pub fn tell(&mut self) -> Result<u64> {
        let tell = self.tell.ok_or(StreamError::Unbound(StreamOp::Tell))?;
        tell(&mut self.context)
    }

    pub fn length(&mut self) -> Result<u64> {
        let length = self.length.ok_or(StreamError::Unbound(StreamOp::Length))?;
        length(&mut self.context)
    }

    /// Bytes between the current position and the end
    pub fn remaining(&mut self) -> Result<u64> {
        let length = self.length()?;
        let position = self.tell()?;
        Ok(length.saturating_sub(position))
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Give the context back to its owner
    pub fn into_context(self) -> C {
        self.context
    }
}

impl<C> fmt::Debug for StreamHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("capabilities", &self.capabilities())
            .field("tell", &self.tell.is_some())
            .field("length", &self.length.is_some())
            .finish()
    }
}

impl<C> io::Read for StreamHandle<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_into(buf).map_err(io::Error::from)
    }
}

impl<C> io::Write for StreamHandle<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        StreamHandle::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C> io::Seek for StreamHandle<C> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, origin) = match pos {
            io::SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek offset overflows i64")
                })?;
                (offset, SeekOrigin::Begin)
            }
            io::SeekFrom::Current(offset) => (offset, SeekOrigin::Current),
            io::SeekFrom::End(offset) => (offset, SeekOrigin::End),
        };
        StreamHandle::seek(self, offset, origin).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_read(ctx: &mut u8, buf: &mut [u8]) -> io::Result<usize> {
        if *ctx == 0 {
            return Ok(0);
        }
        *ctx -= 1;
        buf[0] = 0xAB;
        Ok(1)
    }

    #[test]
    fn test_unbound_slots_are_errors() {
        let mut stream = StreamHandle::new(3u8).with_read(counting_read);
        assert!(stream.is_readable());
        assert!(!stream.is_writable());
        assert!(matches!(
            stream.write(b"x"),
            Err(StreamError::Unbound(StreamOp::Write))
        ));
        assert!(matches!(
            stream.seek(0, SeekOrigin::Begin),
            Err(StreamError::Unbound(StreamOp::Seek))
        ));
        assert!(matches!(
            stream.length(),
            Err(StreamError::Unbound(StreamOp::Length))
        ));
    }

    #[test]
    fn test_read_loops_until_end() {
        let mut stream = StreamHandle::new(3u8).with_read(counting_read);
        let bytes = stream.read(10).unwrap();
        assert_eq!(&bytes[..], &[0xAB, 0xAB, 0xAB]);
        assert!(stream.read(4).unwrap().is_empty());
    }

    #[test]
    fn test_write_all_reports_short_write() {
        fn two_bytes_only(ctx: &mut usize, data: &[u8]) -> io::Result<usize> {
            let n = data.len().min(2usize.saturating_sub(*ctx));
            *ctx += n;
            Ok(n)
        }
        let mut stream = StreamHandle::new(0usize).with_write(two_bytes_only);
        let err = stream.write_all(b"hello").unwrap_err();
        assert!(matches!(
            err,
            StreamError::ShortWrite {
                requested: 5,
                written: 2
            }
        ));
    }

    #[test]
    fn test_seek_origin_wire_values() {
        assert_eq!(SeekOrigin::Current.wire(), 0);
        assert_eq!(SeekOrigin::Begin.wire(), 1);
        assert_eq!(SeekOrigin::End.wire(), 2);
        assert_eq!(SeekOrigin::from_wire(3), None);
    }

    #[test]
    fn test_into_context_returns_owner_value() {
        let stream = StreamHandle::new(vec![1u8, 2]);
        assert_eq!(stream.into_context(), vec![1, 2]);
    }
}
