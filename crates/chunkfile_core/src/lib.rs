//! # chunkfile Core
//!
//! Chunk container engine.
//!
//! A container is a single seekable byte stream holding any number of
//! *chunks*. Each chunk has a short identifier, a disambiguation index
//! among chunks sharing that identifier, a caller-defined version, an
//! uncompressed header and a data payload that may be compressed.
//!
//! This crate provides:
//! - [`ChunkFileWriter`] for creating containers and appending to them
//! - [`ChunkFileReader`] for random access by `(identifier, index)`
//! - [`ChunkIterator`] for walking chunks in write order
//! - The binary layout in [`format`]
//!
//! ## Example
//!
//! ```rust
//! use chunkfile_core::{ChunkFileReader, ChunkFileWriter};
//! use chunkfile_stream::MemoryStream;
//!
//! let mut stream = MemoryStream::new();
//! let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
//! writer.write_chunk("settings", b"v1", b"{}").unwrap();
//! writer.write_chunk("settings", b"v2", b"{\"a\":1}").unwrap();
//! writer.close().unwrap();
//! drop(writer);
//!
//! let reader = ChunkFileReader::open(&mut stream).unwrap();
//! assert_eq!(reader.chunk_count("settings").unwrap(), 2);
//! for descriptor in reader.iter() {
//!     println!("{}[{}]", descriptor.id, descriptor.index);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod descriptor;
mod error;
pub mod format;
mod identifier;
mod index;
mod iterator;
mod reader;
mod writer;

pub use config::{WriteMode, WriterConfig};
pub use descriptor::ChunkDescriptor;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use format::{ContainerHeader, IndexFooter};
pub use identifier::{ChunkId, IDENTIFIER_SIZE};
pub use index::ChunkIndex;
pub use iterator::ChunkIterator;
pub use reader::ChunkFileReader;
pub use writer::{ChunkCreateInfo, ChunkFileWriter};

pub use chunkfile_codec::{Codec, CodecRegistry, Compression};
pub use chunkfile_stream::{FileAccess, FileStream, MemoryStream, Stream, StreamHandle};
