//! # chunkfile FFI
//!
//! Stable C ABI for chunkfile containers.
//!
//! This crate provides:
//! - C-compatible function exports for streams, readers, iterators and writers
//! - Caller-implemented streams through a callback table
//! - Status codes plus a per-thread last error message
//!
//! ## Ownership
//!
//! Every handle is created by a `*_create*`/`*_open*` function and released
//! by the matching `*_close`/`*_destroy` function, which also nulls the
//! caller's pointer. Readers and writers opened on a stream handle borrow it:
//! release them before closing the stream. Output parameters are written
//! only on success.

#![warn(missing_docs)]

pub mod error;
pub mod iterator;
pub mod reader;
pub mod stream;
pub mod types;
pub mod writer;

pub use error::{chunkfile_clear_error, chunkfile_get_last_error, ChunkFileResult};
pub use iterator::FfiIterator;
pub use types::{
    ChunkFileCreateInfo, ChunkFileHandle, ChunkFileIteratorHandle, ChunkFileStreamHandle,
    ChunkFileUserStream, ChunkFileWriterHandle, CHUNKFILE_FILE_ACCESS_READ,
    CHUNKFILE_FILE_ACCESS_READ_WRITE, CHUNKFILE_FILE_ACCESS_WRITE, CHUNKFILE_WRITE_MODE_APPEND,
    CHUNKFILE_WRITE_MODE_CREATE,
};
