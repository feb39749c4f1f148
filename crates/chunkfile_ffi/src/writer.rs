//! Container writer FFI functions.

use crate::error::{clear_last_error, fail, invalid_argument, ChunkFileResult};
use crate::stream::stream_mut;
use crate::types::{
    input_bytes, padded_identifier_arg, store, ChunkFileCreateInfo, ChunkFileStreamHandle,
    ChunkFileWriterHandle, CHUNKFILE_WRITE_MODE_APPEND, CHUNKFILE_WRITE_MODE_CREATE,
};
use chunkfile_core::{ChunkCreateInfo, ChunkFileWriter, WriteMode, WriterConfig};
use std::ffi::{c_int, c_void};

/// The value behind a [`ChunkFileWriterHandle`].
type FfiWriter = ChunkFileWriter<'static>;

unsafe fn writer_mut<'a>(handle: *mut ChunkFileWriterHandle) -> &'a mut FfiWriter {
    &mut *handle.cast::<FfiWriter>()
}

/// Validates a create-info without touching any stream.
///
/// # Safety
///
/// `info.header` must be valid for `info.header_size` bytes.
unsafe fn create_info(info: &ChunkFileCreateInfo) -> Result<ChunkCreateInfo<'_>, ChunkFileResult> {
    let id = padded_identifier_arg(&info.identifier)?;
    let header = input_bytes(info.header, info.header_size, "header")?;
    Ok(ChunkCreateInfo {
        id,
        header,
        version: info.version,
        compression: info.compression,
    })
}

/// Creates a writer that starts a new container on `stream`.
///
/// # Safety
///
/// See [`chunkfile_writer_create_ex`].
#[no_mangle]
pub unsafe extern "C" fn chunkfile_writer_create(
    stream: *mut ChunkFileStreamHandle,
    out_writer: *mut *mut ChunkFileWriterHandle,
) -> ChunkFileResult {
    chunkfile_writer_create_ex(stream, CHUNKFILE_WRITE_MODE_CREATE, out_writer)
}

/// Creates a writer in the given `CHUNKFILE_WRITE_MODE_*` mode.
///
/// The stream is borrowed and must outlive the writer. Append mode needs a
/// readable stream.
///
/// # Safety
///
/// - `stream` must be a valid stream handle that outlives the writer
/// - `out_writer` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_writer_create_ex(
    stream: *mut ChunkFileStreamHandle,
    mode: c_int,
    out_writer: *mut *mut ChunkFileWriterHandle,
) -> ChunkFileResult {
    clear_last_error();

    if stream.is_null() || out_writer.is_null() {
        return invalid_argument("null pointer argument");
    }
    let mode = match mode {
        CHUNKFILE_WRITE_MODE_CREATE => WriteMode::Create,
        CHUNKFILE_WRITE_MODE_APPEND => WriteMode::Append,
        other => return invalid_argument(format!("invalid write mode {other}")),
    };

    match ChunkFileWriter::with_config(stream_mut(stream), WriterConfig::new().mode(mode)) {
        Ok(writer) => {
            *out_writer = Box::into_raw(Box::new(writer)).cast::<ChunkFileWriterHandle>();
            ChunkFileResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Writes a complete chunk.
///
/// `data` may be null only if `data_size` is 0. `out_index` may be null.
/// Every argument is checked before any byte is written.
///
/// # Safety
///
/// - `writer` must be a valid writer handle
/// - `info` must point to a valid create-info
/// - `data` must be valid for `data_size` bytes
#[no_mangle]
pub unsafe extern "C" fn chunkfile_writer_write_chunk(
    writer: *mut ChunkFileWriterHandle,
    info: *const ChunkFileCreateInfo,
    data_size: i64,
    data: *const c_void,
    out_index: *mut i64,
) -> ChunkFileResult {
    clear_last_error();

    if writer.is_null() || info.is_null() {
        return invalid_argument("null pointer argument");
    }
    let info = match create_info(&*info) {
        Ok(info) => info,
        Err(code) => return code,
    };
    let data = match input_bytes(data, data_size, "data") {
        Ok(data) => data,
        Err(code) => return code,
    };

    match writer_mut(writer).write_chunk_with(&info, data) {
        Ok(index) => {
            store(out_index, i64::from(index));
            ChunkFileResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Starts a chunk whose data is supplied by [`chunkfile_writer_append_to_chunk`].
///
/// # Safety
///
/// - `writer` must be a valid writer handle
/// - `info` must point to a valid create-info
#[no_mangle]
pub unsafe extern "C" fn chunkfile_writer_begin_chunk(
    writer: *mut ChunkFileWriterHandle,
    info: *const ChunkFileCreateInfo,
) -> ChunkFileResult {
    clear_last_error();

    if writer.is_null() || info.is_null() {
        return invalid_argument("null pointer argument");
    }
    let info = match create_info(&*info) {
        Ok(info) => info,
        Err(code) => return code,
    };

    match writer_mut(writer).begin_chunk(&info) {
        Ok(()) => ChunkFileResult::Ok,
        Err(e) => fail(&e),
    }
}

/// Appends data to the open chunk.
///
/// # Safety
///
/// - `writer` must be a valid writer handle
/// - `data` must be valid for `size` bytes
#[no_mangle]
pub unsafe extern "C" fn chunkfile_writer_append_to_chunk(
    writer: *mut ChunkFileWriterHandle,
    size: i64,
    data: *const c_void,
) -> ChunkFileResult {
    clear_last_error();

    if writer.is_null() {
        return invalid_argument("null pointer argument");
    }
    let data = match input_bytes(data, size, "data") {
        Ok(data) => data,
        Err(code) => return code,
    };

    match writer_mut(writer).append_chunk_data(data) {
        Ok(()) => ChunkFileResult::Ok,
        Err(e) => fail(&e),
    }
}

/// Ends the open chunk. `out_index` may be null.
///
/// # Safety
///
/// `writer` must be a valid writer handle.
#[no_mangle]
pub unsafe extern "C" fn chunkfile_writer_end_chunk(
    writer: *mut ChunkFileWriterHandle,
    out_index: *mut i64,
) -> ChunkFileResult {
    clear_last_error();

    if writer.is_null() {
        return invalid_argument("null pointer argument");
    }

    match writer_mut(writer).end_chunk() {
        Ok(index) => {
            store(out_index, i64::from(index));
            ChunkFileResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Writes the index and finishes the container. The handle stays valid.
///
/// # Safety
///
/// `writer` must be a valid writer handle.
#[no_mangle]
pub unsafe extern "C" fn chunkfile_writer_close(
    writer: *mut ChunkFileWriterHandle,
) -> ChunkFileResult {
    clear_last_error();

    if writer.is_null() {
        return invalid_argument("null pointer argument");
    }

    match writer_mut(writer).close() {
        Ok(()) => ChunkFileResult::Ok,
        Err(e) => fail(&e),
    }
}

/// Closes the writer if still open, releases it and sets `*writer` to null.
///
/// A close failure is reported, but the handle is released regardless.
///
/// # Safety
///
/// `writer` must be a valid pointer to a writer handle.
#[no_mangle]
pub unsafe extern "C" fn chunkfile_writer_destroy(
    writer: *mut *mut ChunkFileWriterHandle,
) -> ChunkFileResult {
    clear_last_error();

    if writer.is_null() || (*writer).is_null() {
        return invalid_argument("null pointer argument");
    }

    let mut boxed = Box::from_raw((*writer).cast::<FfiWriter>());
    *writer = std::ptr::null_mut();

    match boxed.close() {
        Ok(()) => ChunkFileResult::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "failed to close chunk file writer on destroy");
            fail(&e)
        }
    }
}
