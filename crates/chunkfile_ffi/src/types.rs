//! Type definitions for FFI.

use crate::error::invalid_argument;
use crate::error::ChunkFileResult;
use chunkfile_core::{ChunkId, IDENTIFIER_SIZE};
use std::ffi::{c_char, c_int, c_void, CStr};

/// An opaque stream handle.
///
/// Never dereference or modify directly.
#[repr(C)]
pub struct ChunkFileStreamHandle {
    _private: [u8; 0],
}

/// An opaque handle to an open container.
#[repr(C)]
pub struct ChunkFileHandle {
    _private: [u8; 0],
}

/// An opaque iterator handle.
#[repr(C)]
pub struct ChunkFileIteratorHandle {
    _private: [u8; 0],
}

/// An opaque writer handle.
#[repr(C)]
pub struct ChunkFileWriterHandle {
    _private: [u8; 0],
}

/// Reads up to `count` bytes into `buffer` and stores the number read.
pub type ChunkFileReadFn =
    unsafe extern "C" fn(context: *mut c_void, count: i64, buffer: *mut c_void, bytes_read: *mut i64) -> c_int;

/// Writes `count` bytes from `buffer` and stores the number written.
pub type ChunkFileWriteFn = unsafe extern "C" fn(
    context: *mut c_void,
    count: i64,
    buffer: *const c_void,
    bytes_written: *mut i64,
) -> c_int;

/// Moves the cursor to an absolute offset.
pub type ChunkFileSeekFn = unsafe extern "C" fn(context: *mut c_void, offset: i64) -> c_int;

/// Stores the cursor position or total size.
pub type ChunkFilePositionFn = unsafe extern "C" fn(context: *mut c_void, out: *mut i64) -> c_int;

/// Releases whatever the context refers to.
pub type ChunkFileCloseFn = unsafe extern "C" fn(context: *mut c_void) -> c_int;

/// Callback table for a caller-implemented stream.
///
/// Every callback returns 0 on success. At least one of `read`/`write` must
/// be set; `seek`, `tell` and `get_size` are mandatory; `close` is optional.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ChunkFileUserStream {
    /// Passed unchanged as the first argument of every callback.
    pub context: *mut c_void,
    /// Read callback.
    pub read: Option<ChunkFileReadFn>,
    /// Write callback.
    pub write: Option<ChunkFileWriteFn>,
    /// Seek callback.
    pub seek: Option<ChunkFileSeekFn>,
    /// Tell callback.
    pub tell: Option<ChunkFilePositionFn>,
    /// Size callback.
    pub get_size: Option<ChunkFilePositionFn>,
    /// Close callback.
    pub close: Option<ChunkFileCloseFn>,
}

/// Parameters for a new chunk.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ChunkFileCreateInfo {
    /// Identifier bytes, zero-padded; all 16 bytes may be used.
    pub identifier: [c_char; IDENTIFIER_SIZE],
    /// Number of bytes at `header`.
    pub header_size: i64,
    /// Header bytes; may be null when `header_size` is 0.
    pub header: *const c_void,
    /// Codec tag: 0 for none, 1 for zstd.
    pub compression: u32,
    /// Caller-defined version.
    pub version: u32,
}

impl Default for ChunkFileCreateInfo {
    fn default() -> Self {
        Self {
            identifier: [0; IDENTIFIER_SIZE],
            header_size: 0,
            header: std::ptr::null(),
            compression: 0,
            version: 0,
        }
    }
}

/// Write mode for [`crate::writer::chunkfile_writer_create_ex`].
pub const CHUNKFILE_WRITE_MODE_CREATE: c_int = 0;
/// Append to an existing container.
pub const CHUNKFILE_WRITE_MODE_APPEND: c_int = 1;

/// Access mode for [`crate::stream::chunkfile_stream_open_file`]: read only.
pub const CHUNKFILE_FILE_ACCESS_READ: c_int = 0;
/// Create or truncate for writing.
pub const CHUNKFILE_FILE_ACCESS_WRITE: c_int = 1;
/// Read and write; create if missing, never truncate.
pub const CHUNKFILE_FILE_ACCESS_READ_WRITE: c_int = 2;

/// Parses a NUL-terminated identifier.
///
/// # Safety
///
/// `id` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn identifier_arg(id: *const c_char) -> Result<ChunkId, ChunkFileResult> {
    if id.is_null() {
        return Err(invalid_argument("null chunk identifier"));
    }
    let bytes = CStr::from_ptr(id).to_bytes();
    ChunkId::new(bytes).map_err(|e| invalid_argument(e.to_string()))
}

/// Parses the padded identifier field of a create-info.
pub(crate) fn padded_identifier_arg(
    raw: &[c_char; IDENTIFIER_SIZE],
) -> Result<ChunkId, ChunkFileResult> {
    let bytes: Vec<u8> = raw
        .iter()
        .map(|&c| c as u8)
        .take_while(|&b| b != 0)
        .collect();
    ChunkId::new(&bytes).map_err(|e| invalid_argument(e.to_string()))
}

/// Converts a caller-supplied disambiguation index.
pub(crate) fn index_arg(index: i64) -> Result<u32, ChunkFileResult> {
    u32::try_from(index).map_err(|_| invalid_argument(format!("invalid chunk index {index}")))
}

/// Converts a caller-supplied byte count.
pub(crate) fn size_arg(size: i64, what: &str) -> Result<usize, ChunkFileResult> {
    usize::try_from(size).map_err(|_| invalid_argument(format!("invalid {what} size {size}")))
}

/// Borrows `size` bytes at `ptr`; null is accepted only for size 0.
///
/// # Safety
///
/// If `size > 0`, `ptr` must point to `size` readable bytes that outlive `'a`.
pub(crate) unsafe fn input_bytes<'a>(
    ptr: *const c_void,
    size: i64,
    what: &str,
) -> Result<&'a [u8], ChunkFileResult> {
    let len = size_arg(size, what)?;
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(invalid_argument(format!("null {what} buffer for {len} bytes")));
    }
    Ok(std::slice::from_raw_parts(ptr.cast::<u8>(), len))
}

/// Writes `value` through `out` if it is not null.
///
/// # Safety
///
/// `out` must be null or valid for writes.
pub(crate) unsafe fn store<T>(out: *mut T, value: T) {
    if !out.is_null() {
        *out = value;
    }
}
