//! Status codes and the per-thread last error message.

use chunkfile_core::{CoreError, ErrorKind};
use chunkfile_stream::StreamError;
use std::cell::RefCell;
use std::ffi::CString;

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFileResult {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer, negative size, bad identifier or other caller error.
    InvalidArgument = 1,
    /// The underlying stream failed.
    IoError = 2,
    /// The container is corrupt or unsupported.
    FormatError = 3,
    /// No chunk matches the identifier and index.
    NotFound = 4,
}

impl ChunkFileResult {
    /// Returns true if the result indicates success.
    pub fn is_ok(self) -> bool {
        self == ChunkFileResult::Ok
    }

    /// Returns true if the result indicates an error.
    pub fn is_err(self) -> bool {
        self != ChunkFileResult::Ok
    }
}

impl From<ErrorKind> for ChunkFileResult {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Usage => ChunkFileResult::InvalidArgument,
            ErrorKind::Format => ChunkFileResult::FormatError,
            ErrorKind::Io => ChunkFileResult::IoError,
            ErrorKind::NotFound => ChunkFileResult::NotFound,
        }
    }
}

// Thread-local storage for last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Sets the last error message.
pub fn set_last_error(message: impl Into<String>) {
    let msg = message.into();
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clears the last error.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Records an engine error and returns its status code.
pub(crate) fn fail(err: &CoreError) -> ChunkFileResult {
    set_last_error(err.to_string());
    err.kind().into()
}

/// Records a stream error and returns its status code.
pub(crate) fn fail_stream(err: &StreamError) -> ChunkFileResult {
    set_last_error(err.to_string());
    if err.is_invalid_argument() {
        ChunkFileResult::InvalidArgument
    } else {
        ChunkFileResult::IoError
    }
}

/// Records a caller error and returns [`ChunkFileResult::InvalidArgument`].
pub(crate) fn invalid_argument(message: impl Into<String>) -> ChunkFileResult {
    set_last_error(message);
    ChunkFileResult::InvalidArgument
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn chunkfile_get_last_error() -> *const std::ffi::c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn chunkfile_clear_error() {
    clear_last_error();
}
