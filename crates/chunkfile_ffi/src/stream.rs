//! Stream FFI functions.

use crate::error::{clear_last_error, fail_stream, invalid_argument, ChunkFileResult};
use crate::types::{
    size_arg, store, ChunkFileStreamHandle, ChunkFileUserStream, CHUNKFILE_FILE_ACCESS_READ,
    CHUNKFILE_FILE_ACCESS_READ_WRITE, CHUNKFILE_FILE_ACCESS_WRITE,
};
use chunkfile_stream::{
    FileAccess, FileStream, MemoryStream, Stream, UserStream, UserStreamCallbacks,
};
use std::ffi::{c_char, c_int, c_void, CStr};
use std::io;
use std::path::Path;

/// The value behind a [`ChunkFileStreamHandle`].
pub(crate) type FfiStream = Box<dyn Stream>;

/// Boxes a stream into a handle.
pub(crate) fn into_handle(stream: impl Stream + 'static) -> *mut ChunkFileStreamHandle {
    let boxed: Box<FfiStream> = Box::new(Box::new(stream));
    Box::into_raw(boxed).cast::<ChunkFileStreamHandle>()
}

/// Borrows the stream behind a handle for an unbounded lifetime.
///
/// # Safety
///
/// `handle` must be a live handle from this module, and the caller of the
/// exported function must keep it alive for as long as the borrow is used.
pub(crate) unsafe fn stream_mut<'a>(handle: *mut ChunkFileStreamHandle) -> &'a mut dyn Stream {
    &mut **handle.cast::<FfiStream>()
}

/// Caller context pointer carried into the callback closures.
#[derive(Clone, Copy)]
struct Context(*mut c_void);

// The embedder promises its context may be used from whichever thread
// drives the stream.
unsafe impl Send for Context {}

impl Context {
    fn get(self) -> *mut c_void {
        self.0
    }
}

fn check(status: c_int, what: &str) -> io::Result<()> {
    if status == 0 {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "user stream {what} callback returned {status}"
        )))
    }
}

fn count_result(count: i64, limit: usize, what: &str) -> io::Result<usize> {
    usize::try_from(count)
        .ok()
        .filter(|&n| n <= limit)
        .ok_or_else(|| {
            io::Error::other(format!(
                "user stream {what} callback reported {count} bytes for a {limit}-byte buffer"
            ))
        })
}

fn position_result(value: i64, what: &str) -> io::Result<u64> {
    u64::try_from(value)
        .map_err(|_| io::Error::other(format!("user stream {what} callback reported {value}")))
}

/// Translates a C callback table into closures.
fn callbacks_from(user: &ChunkFileUserStream) -> UserStreamCallbacks {
    let ctx = Context(user.context);
    let mut callbacks = UserStreamCallbacks::new();

    if let Some(read) = user.read {
        callbacks = callbacks.with_read(move |buf: &mut [u8]| {
            let mut done = 0i64;
            let status = unsafe { read(ctx.get(), buf.len() as i64, buf.as_mut_ptr().cast(), &mut done) };
            check(status, "read")?;
            count_result(done, buf.len(), "read")
        });
    }
    if let Some(write) = user.write {
        callbacks = callbacks.with_write(move |buf: &[u8]| {
            let mut done = 0i64;
            let status = unsafe { write(ctx.get(), buf.len() as i64, buf.as_ptr().cast(), &mut done) };
            check(status, "write")?;
            count_result(done, buf.len(), "write")
        });
    }
    if let Some(seek) = user.seek {
        callbacks = callbacks.with_seek(move |offset: u64| {
            let offset = i64::try_from(offset)
                .map_err(|_| io::Error::other(format!("seek offset {offset} out of range")))?;
            check(unsafe { seek(ctx.get(), offset) }, "seek")
        });
    }
    if let Some(tell) = user.tell {
        callbacks = callbacks.with_tell(move || {
            let mut position = 0i64;
            check(unsafe { tell(ctx.get(), &mut position) }, "tell")?;
            position_result(position, "tell")
        });
    }
    if let Some(get_size) = user.get_size {
        callbacks = callbacks.with_size(move || {
            let mut size = 0i64;
            check(unsafe { get_size(ctx.get(), &mut size) }, "get_size")?;
            position_result(size, "get_size")
        });
    }
    if let Some(close) = user.close {
        callbacks = callbacks.with_close(move || check(unsafe { close(ctx.get()) }, "close"));
    }

    callbacks
}

/// Creates an empty, growable in-memory stream.
///
/// # Safety
///
/// `out_stream` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_create_memory(
    out_stream: *mut *mut ChunkFileStreamHandle,
) -> ChunkFileResult {
    clear_last_error();

    if out_stream.is_null() {
        return invalid_argument("null pointer argument");
    }

    *out_stream = into_handle(MemoryStream::new());
    ChunkFileResult::Ok
}

/// Creates a read-only stream over a copy of `size` bytes at `data`.
///
/// # Safety
///
/// - `data` must point to `size` readable bytes (it may be null if `size` is 0)
/// - `out_stream` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_from_read_only_memory(
    data: *const c_void,
    size: i64,
    out_stream: *mut *mut ChunkFileStreamHandle,
) -> ChunkFileResult {
    clear_last_error();

    if out_stream.is_null() {
        return invalid_argument("null pointer argument");
    }
    let bytes = match crate::types::input_bytes(data, size, "memory") {
        Ok(bytes) => bytes,
        Err(code) => return code,
    };

    *out_stream = into_handle(MemoryStream::read_only(bytes.to_vec()));
    ChunkFileResult::Ok
}

/// Opens a file stream.
///
/// `access` is one of the `CHUNKFILE_FILE_ACCESS_*` constants.
///
/// # Safety
///
/// - `path` must be a valid null-terminated UTF-8 string
/// - `out_stream` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_open_file(
    path: *const c_char,
    access: c_int,
    out_stream: *mut *mut ChunkFileStreamHandle,
) -> ChunkFileResult {
    clear_last_error();

    if path.is_null() || out_stream.is_null() {
        return invalid_argument("null pointer argument");
    }

    let Ok(path) = CStr::from_ptr(path).to_str() else {
        return invalid_argument("invalid UTF-8 in path");
    };

    let access = match access {
        CHUNKFILE_FILE_ACCESS_READ => FileAccess::Read,
        CHUNKFILE_FILE_ACCESS_WRITE => FileAccess::Write,
        CHUNKFILE_FILE_ACCESS_READ_WRITE => FileAccess::ReadWrite,
        other => return invalid_argument(format!("invalid file access mode {other}")),
    };

    match FileStream::open(Path::new(path), access) {
        Ok(stream) => {
            *out_stream = into_handle(stream);
            ChunkFileResult::Ok
        }
        Err(e) => fail_stream(&e),
    }
}

/// Creates a stream that forwards to caller callbacks.
///
/// On failure `*out_stream` is left untouched and no stream exists.
///
/// # Safety
///
/// - `user_stream` must point to a valid callback table
/// - the callbacks must be safe to call with `user_stream.context` until the
///   stream is closed
/// - `out_stream` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_create_from_user_stream(
    user_stream: *const ChunkFileUserStream,
    out_stream: *mut *mut ChunkFileStreamHandle,
) -> ChunkFileResult {
    clear_last_error();

    if user_stream.is_null() || out_stream.is_null() {
        return invalid_argument("null pointer argument");
    }

    match UserStream::new(callbacks_from(&*user_stream)) {
        Ok(stream) => {
            *out_stream = into_handle(stream);
            ChunkFileResult::Ok
        }
        Err(e) => fail_stream(&e),
    }
}

/// Reads up to `count` bytes.
///
/// `bytes_read` may be null.
///
/// # Safety
///
/// - `stream` must be a valid stream handle
/// - `buffer` must be valid for `count` bytes of writes
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_read(
    stream: *mut ChunkFileStreamHandle,
    count: i64,
    buffer: *mut c_void,
    bytes_read: *mut i64,
) -> ChunkFileResult {
    clear_last_error();

    if stream.is_null() {
        return invalid_argument("null pointer argument");
    }
    let len = match size_arg(count, "read") {
        Ok(len) => len,
        Err(code) => return code,
    };
    if len == 0 {
        store(bytes_read, 0);
        return ChunkFileResult::Ok;
    }
    if buffer.is_null() {
        return invalid_argument("null read buffer");
    }

    let buf = std::slice::from_raw_parts_mut(buffer.cast::<u8>(), len);
    match stream_mut(stream).read(buf) {
        Ok(n) => {
            store(bytes_read, n as i64);
            ChunkFileResult::Ok
        }
        Err(e) => fail_stream(&e),
    }
}

/// Writes `count` bytes.
///
/// `bytes_written` may be null.
///
/// # Safety
///
/// - `stream` must be a valid stream handle
/// - `buffer` must be valid for `count` bytes of reads
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_write(
    stream: *mut ChunkFileStreamHandle,
    count: i64,
    buffer: *const c_void,
    bytes_written: *mut i64,
) -> ChunkFileResult {
    clear_last_error();

    if stream.is_null() {
        return invalid_argument("null pointer argument");
    }
    let bytes = match crate::types::input_bytes(buffer, count, "write") {
        Ok(bytes) => bytes,
        Err(code) => return code,
    };
    if bytes.is_empty() {
        store(bytes_written, 0);
        return ChunkFileResult::Ok;
    }

    match stream_mut(stream).write(bytes) {
        Ok(n) => {
            store(bytes_written, n as i64);
            ChunkFileResult::Ok
        }
        Err(e) => fail_stream(&e),
    }
}

/// Moves the stream cursor to an absolute offset.
///
/// # Safety
///
/// `stream` must be a valid stream handle.
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_seek(
    stream: *mut ChunkFileStreamHandle,
    offset: i64,
) -> ChunkFileResult {
    clear_last_error();

    if stream.is_null() {
        return invalid_argument("null pointer argument");
    }
    let Ok(offset) = u64::try_from(offset) else {
        return invalid_argument(format!("invalid seek offset {offset}"));
    };

    match stream_mut(stream).seek(offset) {
        Ok(()) => ChunkFileResult::Ok,
        Err(e) => fail_stream(&e),
    }
}

/// Gets the stream cursor position.
///
/// # Safety
///
/// - `stream` must be a valid stream handle
/// - `out_position` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_tell(
    stream: *mut ChunkFileStreamHandle,
    out_position: *mut i64,
) -> ChunkFileResult {
    clear_last_error();

    if stream.is_null() || out_position.is_null() {
        return invalid_argument("null pointer argument");
    }

    match stream_mut(stream).tell() {
        Ok(position) => {
            *out_position = position as i64;
            ChunkFileResult::Ok
        }
        Err(e) => fail_stream(&e),
    }
}

/// Gets the stream size in bytes.
///
/// # Safety
///
/// - `stream` must be a valid stream handle
/// - `out_size` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_get_size(
    stream: *mut ChunkFileStreamHandle,
    out_size: *mut i64,
) -> ChunkFileResult {
    clear_last_error();

    if stream.is_null() || out_size.is_null() {
        return invalid_argument("null pointer argument");
    }

    match stream_mut(stream).size() {
        Ok(size) => {
            *out_size = size as i64;
            ChunkFileResult::Ok
        }
        Err(e) => fail_stream(&e),
    }
}

/// Closes a stream and releases its handle.
///
/// On success `*stream` is set to null. If closing fails, the handle stays
/// valid and the call may be retried.
///
/// # Safety
///
/// - `stream` must be a valid pointer to a stream handle (or to null)
/// - no reader or writer may still be using the stream
#[no_mangle]
pub unsafe extern "C" fn chunkfile_stream_close(
    stream: *mut *mut ChunkFileStreamHandle,
) -> ChunkFileResult {
    clear_last_error();

    if stream.is_null() || (*stream).is_null() {
        return invalid_argument("null pointer argument");
    }

    if let Err(e) = stream_mut(*stream).close() {
        return fail_stream(&e);
    }

    drop(Box::from_raw((*stream).cast::<FfiStream>()));
    *stream = std::ptr::null_mut();
    ChunkFileResult::Ok
}
