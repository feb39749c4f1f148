//! # chunkfile Stream
//!
//! Seekable stream abstraction used by the chunkfile container engine.
//!
//! Streams are **opaque byte transports**. They know nothing about chunk
//! headers, descriptors or the container index; the engine owns all format
//! interpretation.
//!
//! ## Available Backends
//!
//! - [`MemoryStream`] - Growable in-memory buffer with an explicit cursor
//! - [`FileStream`] - Persistent storage using OS file APIs
//! - [`UserStream`] - Delegates to caller-supplied callbacks
//!
//! ## Example
//!
//! ```rust
//! use chunkfile_stream::{MemoryStream, Stream};
//!
//! let mut stream = MemoryStream::new();
//! stream.write_all(b"hello world").unwrap();
//! stream.seek(6).unwrap();
//!
//! let mut buf = [0u8; 5];
//! stream.read_exact(&mut buf).unwrap();
//! assert_eq!(&buf, b"world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod handle;
mod memory;
mod stream;
mod user;

pub use error::{StreamError, StreamResult};
pub use file::{FileAccess, FileStream};
pub use handle::StreamHandle;
pub use memory::MemoryStream;
pub use stream::Stream;
pub use user::{
    CloseFn, ReadFn, SeekFn, SizeFn, TellFn, UserStream, UserStreamCallbacks, WriteFn,
};
