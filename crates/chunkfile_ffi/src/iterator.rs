//! Iterator FFI functions.

use crate::error::{clear_last_error, invalid_argument, set_last_error, ChunkFileResult};
use crate::reader::reader_ref;
use crate::types::{ChunkFileHandle, ChunkFileIteratorHandle};
use chunkfile_core::{ChunkId, IDENTIFIER_SIZE};
use std::ffi::{c_char, c_int};

/// Internal iterator state.
///
/// Holds a snapshot of `(identifier, index)` pairs so the iterator does not
/// borrow the container handle.
pub struct FfiIterator {
    /// Chunks in write order.
    chunks: Vec<(ChunkId, u32)>,
    /// Current position.
    position: usize,
}

impl FfiIterator {
    /// Creates a new iterator over a snapshot.
    pub fn new(chunks: Vec<(ChunkId, u32)>) -> Self {
        Self {
            chunks,
            position: 0,
        }
    }

    /// Returns true once every chunk has been visited.
    pub fn is_at_end(&self) -> bool {
        self.position >= self.chunks.len()
    }

    /// Moves to the next chunk; does nothing at the end.
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    /// Returns the current chunk, if any.
    pub fn current(&self) -> Option<&(ChunkId, u32)> {
        self.chunks.get(self.position)
    }
}

unsafe fn iterator_mut<'a>(iter: *mut ChunkFileIteratorHandle) -> &'a mut FfiIterator {
    &mut *iter.cast::<FfiIterator>()
}

fn at_end() -> ChunkFileResult {
    set_last_error("iterator is at the end");
    ChunkFileResult::NotFound
}

/// Creates an iterator over all chunks of a container, in write order.
///
/// # Safety
///
/// - `handle` must be a valid container handle
/// - `out_iter` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_iterator_create(
    handle: *mut ChunkFileHandle,
    out_iter: *mut *mut ChunkFileIteratorHandle,
) -> ChunkFileResult {
    clear_last_error();

    if handle.is_null() || out_iter.is_null() {
        return invalid_argument("null pointer argument");
    }

    let chunks = reader_ref(handle)
        .iter()
        .map(|d| (d.id, d.index))
        .collect();
    let iter = Box::new(FfiIterator::new(chunks));
    *out_iter = Box::into_raw(iter).cast::<ChunkFileIteratorHandle>();
    ChunkFileResult::Ok
}

/// Checks whether the iterator is past the last chunk.
///
/// # Safety
///
/// - `iter` must be a valid iterator handle
/// - `out_at_end` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_iterator_is_at_end(
    iter: *mut ChunkFileIteratorHandle,
    out_at_end: *mut c_int,
) -> ChunkFileResult {
    if iter.is_null() || out_at_end.is_null() {
        return invalid_argument("null pointer argument");
    }

    *out_at_end = c_int::from(iterator_mut(iter).is_at_end());
    ChunkFileResult::Ok
}

/// Moves to the next chunk. Advancing at the end is a no-op.
///
/// # Safety
///
/// `iter` must be a valid iterator handle.
#[no_mangle]
pub unsafe extern "C" fn chunkfile_iterator_advance(
    iter: *mut ChunkFileIteratorHandle,
) -> ChunkFileResult {
    if iter.is_null() {
        return invalid_argument("null pointer argument");
    }

    iterator_mut(iter).advance();
    ChunkFileResult::Ok
}

/// Copies the current identifier, zero-padded, into a 16-byte buffer.
///
/// # Safety
///
/// - `iter` must be a valid iterator handle
/// - `out_identifier` must be valid for 16 bytes of writes
#[no_mangle]
pub unsafe extern "C" fn chunkfile_iterator_get_chunk_identifier(
    iter: *mut ChunkFileIteratorHandle,
    out_identifier: *mut c_char,
) -> ChunkFileResult {
    clear_last_error();

    if iter.is_null() || out_identifier.is_null() {
        return invalid_argument("null pointer argument");
    }

    let Some((id, _)) = iterator_mut(iter).current() else {
        return at_end();
    };
    std::ptr::copy_nonoverlapping(
        id.padded().as_ptr().cast::<c_char>(),
        out_identifier,
        IDENTIFIER_SIZE,
    );
    ChunkFileResult::Ok
}

/// Gets the disambiguation index of the current chunk.
///
/// # Safety
///
/// - `iter` must be a valid iterator handle
/// - `out_index` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn chunkfile_iterator_get_chunk_index(
    iter: *mut ChunkFileIteratorHandle,
    out_index: *mut i64,
) -> ChunkFileResult {
    clear_last_error();

    if iter.is_null() || out_index.is_null() {
        return invalid_argument("null pointer argument");
    }

    let Some((_, index)) = iterator_mut(iter).current() else {
        return at_end();
    };
    *out_index = i64::from(*index);
    ChunkFileResult::Ok
}

/// Destroys an iterator and sets `*iter` to null.
///
/// # Safety
///
/// `iter` must be a valid pointer to an iterator handle.
#[no_mangle]
pub unsafe extern "C" fn chunkfile_iterator_destroy(
    iter: *mut *mut ChunkFileIteratorHandle,
) -> ChunkFileResult {
    if iter.is_null() || (*iter).is_null() {
        return invalid_argument("null pointer argument");
    }

    drop(Box::from_raw((*iter).cast::<FfiIterator>()));
    *iter = std::ptr::null_mut();
    ChunkFileResult::Ok
}
