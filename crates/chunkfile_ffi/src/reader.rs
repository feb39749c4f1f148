//! Container reader FFI functions.

use crate::error::{clear_last_error, fail, invalid_argument, ChunkFileResult};
use crate::stream::stream_mut;
use crate::types::{identifier_arg, index_arg, ChunkFileHandle, ChunkFileStreamHandle};
use chunkfile_core::{ChunkDescriptor, ChunkFileReader, CoreResult};
use std::ffi::{c_char, c_int, c_void, CStr};

/// The value behind a [`ChunkFileHandle`].
pub(crate) type FfiReader = ChunkFileReader<'static>;

/// Borrows the reader behind a handle.
///
/// # Safety
///
/// `handle` must be a live handle from this module.
pub(crate) unsafe fn reader_ref<'a>(handle: *mut ChunkFileHandle) -> &'a FfiReader {
    &*handle.cast::<FfiReader>()
}

fn into_handle(reader: FfiReader) -> *mut ChunkFileHandle {
    Box::into_raw(Box::new(reader)).cast::<ChunkFileHandle>()
}

/// Opens a container on an existing stream.
///
/// The stream is borrowed: it must stay open until [`chunkfile_close`] and
/// is not closed by it.
///
/// # Safety
///
/// - `stream` must be a valid stream handle that outlives the container handle
/// - `out_handle` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_open_stream(
    stream: *mut ChunkFileStreamHandle,
    out_handle: *mut *mut ChunkFileHandle,
) -> ChunkFileResult {
    clear_last_error();

    if stream.is_null() || out_handle.is_null() {
        return invalid_argument("null pointer argument");
    }

    match ChunkFileReader::open(stream_mut(stream)) {
        Ok(reader) => {
            *out_handle = into_handle(reader);
            ChunkFileResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Opens a container file. The file is closed by [`chunkfile_close`].
///
/// # Safety
///
/// - `path` must be a valid null-terminated UTF-8 string
/// - `out_handle` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_open_file(
    path: *const c_char,
    out_handle: *mut *mut ChunkFileHandle,
) -> ChunkFileResult {
    clear_last_error();

    if path.is_null() || out_handle.is_null() {
        return invalid_argument("null pointer argument");
    }
    let Ok(path) = CStr::from_ptr(path).to_str() else {
        return invalid_argument("invalid UTF-8 in path");
    };

    match ChunkFileReader::open_path(path) {
        Ok(reader) => {
            *out_handle = into_handle(reader);
            ChunkFileResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Closes a container and sets `*handle` to null.
///
/// # Safety
///
/// `handle` must be a valid pointer to a handle from `chunkfile_open_*`.
/// Iterators created from it must be destroyed first.
#[no_mangle]
pub unsafe extern "C" fn chunkfile_close(handle: *mut *mut ChunkFileHandle) -> ChunkFileResult {
    clear_last_error();

    if handle.is_null() || (*handle).is_null() {
        return invalid_argument("null pointer argument");
    }

    drop(Box::from_raw((*handle).cast::<FfiReader>()));
    *handle = std::ptr::null_mut();
    ChunkFileResult::Ok
}

/// Runs a descriptor query and stores its result.
unsafe fn query<T>(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    index: i64,
    out: *mut T,
    f: impl FnOnce(&ChunkDescriptor) -> T,
) -> ChunkFileResult {
    clear_last_error();

    if handle.is_null() || out.is_null() {
        return invalid_argument("null pointer argument");
    }
    let id = match identifier_arg(id) {
        Ok(id) => id,
        Err(code) => return code,
    };
    let index = match index_arg(index) {
        Ok(index) => index,
        Err(code) => return code,
    };

    match reader_ref(handle).descriptor(id, index) {
        Ok(descriptor) => {
            *out = f(descriptor);
            ChunkFileResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Checks whether the chunk `(id, index)` exists.
///
/// # Safety
///
/// - `handle` must be a valid container handle
/// - `id` must be a null-terminated string
/// - `out_contains` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_contains_chunk(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    index: i64,
    out_contains: *mut c_int,
) -> ChunkFileResult {
    clear_last_error();

    if handle.is_null() || out_contains.is_null() {
        return invalid_argument("null pointer argument");
    }
    let id = match identifier_arg(id) {
        Ok(id) => id,
        Err(code) => return code,
    };
    let index = match index_arg(index) {
        Ok(index) => index,
        Err(code) => return code,
    };

    match reader_ref(handle).contains_chunk_at(id, index) {
        Ok(contains) => {
            *out_contains = c_int::from(contains);
            ChunkFileResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Gets the number of chunks sharing an identifier (0 if none).
///
/// # Safety
///
/// - `handle` must be a valid container handle
/// - `id` must be a null-terminated string
/// - `out_count` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_get_chunk_count(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    out_count: *mut i64,
) -> ChunkFileResult {
    clear_last_error();

    if handle.is_null() || out_count.is_null() {
        return invalid_argument("null pointer argument");
    }
    let id = match identifier_arg(id) {
        Ok(id) => id,
        Err(code) => return code,
    };

    match reader_ref(handle).chunk_count(id) {
        Ok(count) => {
            *out_count = count as i64;
            ChunkFileResult::Ok
        }
        Err(e) => fail(&e),
    }
}

/// Gets the version of chunk `(id, index)`.
///
/// # Safety
///
/// See [`chunkfile_contains_chunk`].
#[no_mangle]
pub unsafe extern "C" fn chunkfile_get_chunk_version(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    index: i64,
    out_version: *mut u32,
) -> ChunkFileResult {
    query(handle, id, index, out_version, |d| d.version)
}

/// Gets the header size of chunk `(id, index)`.
///
/// # Safety
///
/// See [`chunkfile_contains_chunk`].
#[no_mangle]
pub unsafe extern "C" fn chunkfile_get_chunk_header_size(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    index: i64,
    out_size: *mut i64,
) -> ChunkFileResult {
    query(handle, id, index, out_size, |d| d.header_size as i64)
}

/// Gets the uncompressed data size of chunk `(id, index)`.
///
/// # Safety
///
/// See [`chunkfile_contains_chunk`].
#[no_mangle]
pub unsafe extern "C" fn chunkfile_get_chunk_data_size(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    index: i64,
    out_size: *mut i64,
) -> ChunkFileResult {
    query(handle, id, index, out_size, |d| d.uncompressed_size as i64)
}

type CopyFn = fn(&FfiReader, &ChunkDescriptor, Option<&mut [u8]>) -> CoreResult<()>;

unsafe fn copy_out(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    index: i64,
    buffer: *mut c_void,
    size_of: fn(&ChunkDescriptor) -> u64,
    copy: CopyFn,
) -> ChunkFileResult {
    clear_last_error();

    if handle.is_null() {
        return invalid_argument("null pointer argument");
    }
    let id = match identifier_arg(id) {
        Ok(id) => id,
        Err(code) => return code,
    };
    let index = match index_arg(index) {
        Ok(index) => index,
        Err(code) => return code,
    };

    let reader = reader_ref(handle);
    let descriptor = match reader.descriptor(id, index) {
        Ok(descriptor) => descriptor,
        Err(e) => return fail(&e),
    };

    let dest = if buffer.is_null() {
        None
    } else {
        let Ok(len) = usize::try_from(size_of(descriptor)) else {
            return invalid_argument("chunk is too large for this platform");
        };
        Some(std::slice::from_raw_parts_mut(buffer.cast::<u8>(), len))
    };

    match copy(reader, descriptor, dest) {
        Ok(()) => ChunkFileResult::Ok,
        Err(e) => fail(&e),
    }
}

/// Copies the header of chunk `(id, index)` into `buffer`.
///
/// `buffer` must hold the header size reported by
/// [`chunkfile_get_chunk_header_size`]; it may be null only if that size is 0.
///
/// # Safety
///
/// - `handle` must be a valid container handle
/// - `id` must be a null-terminated string
/// - `buffer` must be null or valid for header-size bytes of writes
#[no_mangle]
pub unsafe extern "C" fn chunkfile_read_chunk_header(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    index: i64,
    buffer: *mut c_void,
) -> ChunkFileResult {
    copy_out(
        handle,
        id,
        index,
        buffer,
        |d| d.header_size,
        |reader, d, dest| reader.read_chunk_header_into(d.id, d.index, dest),
    )
}

/// Decompresses the data of chunk `(id, index)` into `buffer`.
///
/// `buffer` must hold the data size reported by
/// [`chunkfile_get_chunk_data_size`]; it may be null only if that size is 0.
///
/// # Safety
///
/// - `handle` must be a valid container handle
/// - `id` must be a null-terminated string
/// - `buffer` must be null or valid for data-size bytes of writes
#[no_mangle]
pub unsafe extern "C" fn chunkfile_read_chunk_data(
    handle: *mut ChunkFileHandle,
    id: *const c_char,
    index: i64,
    buffer: *mut c_void,
) -> ChunkFileResult {
    copy_out(
        handle,
        id,
        index,
        buffer,
        |d| d.uncompressed_size,
        |reader, d, dest| reader.read_chunk_data_into(d.id, d.index, dest),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{chunkfile_stream_close, chunkfile_stream_from_read_only_memory};
    use chunkfile_core::{ChunkCreateInfo, ChunkFileWriter, Compression, MemoryStream};
    use std::ffi::CString;
    use std::ptr;

    fn fixture() -> Vec<u8> {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
        writer.write_chunk("chunk0", b"", b"some data").unwrap();
        writer
            .write_chunk_with(
                &ChunkCreateInfo::new("chunk0")
                    .unwrap()
                    .compression(Compression::Zstd),
                b"more data",
            )
            .unwrap();
        writer
            .write_chunk_with(&ChunkCreateInfo::new("chunk1").unwrap().version(3), b"")
            .unwrap();
        writer.write_chunk("chunk2", b"hdr", b"x").unwrap();
        writer.close().unwrap();
        drop(writer);
        stream.into_inner()
    }

    unsafe fn open_fixture() -> (*mut ChunkFileStreamHandle, *mut ChunkFileHandle) {
        let bytes = fixture();
        let mut stream = ptr::null_mut();
        assert_eq!(
            chunkfile_stream_from_read_only_memory(
                bytes.as_ptr().cast(),
                bytes.len() as i64,
                &mut stream
            ),
            ChunkFileResult::Ok
        );
        let mut handle = ptr::null_mut();
        assert_eq!(chunkfile_open_stream(stream, &mut handle), ChunkFileResult::Ok);
        (stream, handle)
    }

    #[test]
    fn known_good_container() {
        let chunk0 = CString::new("chunk0").unwrap();
        let chunk1 = CString::new("chunk1").unwrap();
        let chunk3 = CString::new("chunk3").unwrap();

        unsafe {
            let (mut stream, mut handle) = open_fixture();

            let mut contains = -1;
            chunkfile_contains_chunk(handle, chunk0.as_ptr(), 1, &mut contains);
            assert_eq!(contains, 1);
            chunkfile_contains_chunk(handle, chunk0.as_ptr(), 2, &mut contains);
            assert_eq!(contains, 0);
            chunkfile_contains_chunk(handle, chunk3.as_ptr(), 0, &mut contains);
            assert_eq!(contains, 0);

            let mut count = -1;
            chunkfile_get_chunk_count(handle, chunk0.as_ptr(), &mut count);
            assert_eq!(count, 2);

            let mut version = 0;
            chunkfile_get_chunk_version(handle, chunk1.as_ptr(), 0, &mut version);
            assert_eq!(version, 3);

            let mut size = 0;
            chunkfile_get_chunk_data_size(handle, chunk0.as_ptr(), 1, &mut size);
            let mut data = vec![0u8; size as usize];
            assert_eq!(
                chunkfile_read_chunk_data(handle, chunk0.as_ptr(), 1, data.as_mut_ptr().cast()),
                ChunkFileResult::Ok
            );
            assert_eq!(data, b"more data");

            assert_eq!(chunkfile_close(&mut handle), ChunkFileResult::Ok);
            assert!(handle.is_null());
            assert_eq!(chunkfile_stream_close(&mut stream), ChunkFileResult::Ok);
        }
    }

    #[test]
    fn status_codes_and_untouched_outputs() {
        let chunk0 = CString::new("chunk0").unwrap();
        let missing = CString::new("missing").unwrap();

        unsafe {
            let (mut stream, mut handle) = open_fixture();

            let mut version = 42u32;
            assert_eq!(
                chunkfile_get_chunk_version(handle, missing.as_ptr(), 0, &mut version),
                ChunkFileResult::NotFound
            );
            assert_eq!(
                chunkfile_get_chunk_version(handle, chunk0.as_ptr(), -1, &mut version),
                ChunkFileResult::InvalidArgument
            );
            assert_eq!(
                chunkfile_get_chunk_version(handle, ptr::null(), 0, &mut version),
                ChunkFileResult::InvalidArgument
            );
            assert_eq!(version, 42);

            // Null destinations only for empty payloads
            let chunk1 = CString::new("chunk1").unwrap();
            assert_eq!(
                chunkfile_read_chunk_data(handle, chunk1.as_ptr(), 0, ptr::null_mut()),
                ChunkFileResult::Ok
            );
            assert_eq!(
                chunkfile_read_chunk_header(handle, chunk0.as_ptr(), 0, ptr::null_mut()),
                ChunkFileResult::Ok
            );
            assert_eq!(
                chunkfile_read_chunk_data(handle, chunk0.as_ptr(), 0, ptr::null_mut()),
                ChunkFileResult::InvalidArgument
            );

            chunkfile_close(&mut handle);
            chunkfile_stream_close(&mut stream);
        }
    }

    #[test]
    fn open_rejects_garbage() {
        let junk = [0x42u8; 128];
        unsafe {
            let mut stream = ptr::null_mut();
            chunkfile_stream_from_read_only_memory(junk.as_ptr().cast(), 128, &mut stream);

            let mut handle = ptr::null_mut();
            assert_eq!(
                chunkfile_open_stream(stream, &mut handle),
                ChunkFileResult::FormatError
            );
            assert!(handle.is_null());
            chunkfile_stream_close(&mut stream);
        }
    }

    #[test]
    fn open_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.chunks");
        std::fs::write(&path, fixture()).unwrap();
        let c_path = CString::new(path.to_str().unwrap()).unwrap();
        let chunk2 = CString::new("chunk2").unwrap();

        unsafe {
            let mut handle = ptr::null_mut();
            assert_eq!(chunkfile_open_file(c_path.as_ptr(), &mut handle), ChunkFileResult::Ok);

            let mut header = [0u8; 3];
            chunkfile_read_chunk_header(handle, chunk2.as_ptr(), 0, header.as_mut_ptr().cast());
            assert_eq!(&header, b"hdr");
            chunkfile_close(&mut handle);
        }
    }
}
