//! Caller-owned byte streams
//!
//! Large payloads (images, movies, firmware) move between camera and host
//! through a [`StreamHandle`]: an opaque context chosen by the owner plus
//! up to five operations (read, write, seek, tell, length). The SDK never
//! allocates or frees the backing storage, so a transfer can land directly
//! in a file, socket or buffer without being held in memory as a whole.
//!
//! # Quick Start
//!
//! ```rust
//! use eds_stream::{memory_stream, SeekOrigin};
//!
//! let mut stream = memory_stream(None);
//! stream.write_all(b"image bytes").unwrap();
//! stream.seek(0, SeekOrigin::Begin).unwrap();
//!
//! let head = stream.read(5).unwrap();
//! assert_eq!(&head[..], b"image");
//! assert_eq!(stream.remaining().unwrap(), 6);
//! ```
//!
//! # Custom Streams
//!
//! ```rust
//! use eds_stream::StreamHandle;
//! use std::io;
//!
//! // Counts bytes without storing them
//! fn count(total: &mut u64, data: &[u8]) -> io::Result<usize> {
//!     *total += data.len() as u64;
//!     Ok(data.len())
//! }
//!
//! let mut sink = StreamHandle::new(0u64).with_write(count);
//! sink.write_all(&[0u8; 1024]).unwrap();
//! assert_eq!(*sink.context(), 1024);
//! assert!(!sink.capabilities().readable);
//! ```

pub mod error;
pub mod handle;
pub mod io;
pub mod memory;

pub use error::{Result, StreamError};
pub use handle::{
    Capabilities, LengthFn, ReadFn, SeekFn, SeekOrigin, StreamHandle, StreamOp, TellFn, WriteFn,
};
pub use io::{io_stream, reader_stream, writer_stream};
pub use memory::{memory_reader, memory_stream, MemoryBuffer, MAX_MEMORY_LEN};
