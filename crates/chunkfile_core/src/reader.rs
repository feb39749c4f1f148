//! Random-access container reader.

use crate::descriptor::ChunkDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::format::{load_index, read_region, ContainerHeader};
use crate::identifier::ChunkId;
use crate::index::ChunkIndex;
use crate::iterator::ChunkIterator;
use chunkfile_codec::CodecRegistry;
use chunkfile_stream::{FileAccess, FileStream, Stream, StreamHandle};
use parking_lot::Mutex;
use std::path::Path;

/// Reads chunks from a finished container.
///
/// Construction validates the header, locates the index through the header
/// and footer, and loads every descriptor. After that, queries are answered
/// from memory and only header/data reads touch the stream.
///
/// Queries take `&self`; the stream sits behind a mutex so each seek+read
/// pair stays together.
///
/// # Example
///
/// ```rust
/// use chunkfile_core::{ChunkFileReader, ChunkFileWriter};
/// use chunkfile_stream::MemoryStream;
///
/// let mut stream = MemoryStream::new();
/// let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
/// writer.write_chunk("chunk0", b"hdr", b"some data").unwrap();
/// writer.close().unwrap();
/// drop(writer);
///
/// let reader = ChunkFileReader::open(&mut stream).unwrap();
/// assert!(reader.contains_chunk("chunk0").unwrap());
/// assert_eq!(reader.read_chunk_data("chunk0", 0).unwrap(), b"some data");
/// ```
pub struct ChunkFileReader<'a> {
    stream: Mutex<StreamHandle<'a>>,
    header: ContainerHeader,
    index: ChunkIndex,
    registry: CodecRegistry,
}

impl<'a> ChunkFileReader<'a> {
    /// Opens a container on a caller-owned stream.
    ///
    /// # Errors
    ///
    /// Returns a format error if the stream does not hold a finished container.
    pub fn open(stream: &'a mut dyn Stream) -> CoreResult<Self> {
        Self::from_handle(StreamHandle::Borrowed(stream), CodecRegistry::default())
    }

    /// Opens a container with a custom codec registry.
    ///
    /// # Errors
    ///
    /// Returns a format error if the stream does not hold a finished container.
    pub fn open_with_registry(
        stream: &'a mut dyn Stream,
        registry: CodecRegistry,
    ) -> CoreResult<Self> {
        Self::from_handle(StreamHandle::Borrowed(stream), registry)
    }

    /// Opens a container on a stream the reader will own and close.
    ///
    /// # Errors
    ///
    /// Returns a format error if the stream does not hold a finished container.
    pub fn open_owned(stream: Box<dyn Stream + 'a>) -> CoreResult<Self> {
        Self::from_handle(StreamHandle::Owned(stream), CodecRegistry::default())
    }

    /// Opens a container from a stream handle.
    ///
    /// # Errors
    ///
    /// Returns a format error if the stream does not hold a finished
    /// container, or a stream error if the transport fails.
    pub fn from_handle(mut stream: StreamHandle<'a>, registry: CodecRegistry) -> CoreResult<Self> {
        if !stream.can_read() {
            return Err(CoreError::usage("cannot read a container from a write-only stream"));
        }

        let (header, index) = load_index(&mut *stream)?;
        tracing::debug!(
            chunks = index.len(),
            owned = stream.is_owned(),
            "opened chunk file"
        );

        Ok(Self {
            stream: Mutex::new(stream),
            header,
            index,
            registry,
        })
    }

    /// Returns the container header.
    #[must_use]
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Returns the loaded index.
    #[must_use]
    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    /// Returns every descriptor in write order.
    #[must_use]
    pub fn descriptors(&self) -> &[ChunkDescriptor] {
        self.index.descriptors()
    }

    /// Returns the total number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the container holds no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns true if any chunk has this identifier.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an invalid identifier.
    pub fn contains_chunk(&self, id: impl AsRef<[u8]>) -> CoreResult<bool> {
        let id = ChunkId::new(id.as_ref())?;
        Ok(self.index.contains(&id))
    }

    /// Returns true if the exact `(id, index)` chunk exists.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an invalid identifier.
    pub fn contains_chunk_at(&self, id: impl AsRef<[u8]>, index: u32) -> CoreResult<bool> {
        let id = ChunkId::new(id.as_ref())?;
        Ok(self.index.contains_at(&id, index))
    }

    /// Returns the number of chunks sharing an identifier.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an invalid identifier.
    pub fn chunk_count(&self, id: impl AsRef<[u8]>) -> CoreResult<usize> {
        let id = ChunkId::new(id.as_ref())?;
        Ok(self.index.count(&id))
    }

    /// Returns the descriptor of an exact `(id, index)` chunk.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an invalid identifier and not-found if the
    /// chunk does not exist.
    pub fn descriptor(&self, id: impl AsRef<[u8]>, index: u32) -> CoreResult<&ChunkDescriptor> {
        let id = ChunkId::new(id.as_ref())?;
        self.index
            .get(&id, index)
            .ok_or_else(|| CoreError::not_found(id.to_string_lossy(), Some(index)))
    }

    /// Returns the first descriptor written under an identifier.
    ///
    /// "First" is insertion order, which is what the identifier-only
    /// accessors have always answered from, even when that entry is not
    /// disambiguation index 0.
    ///
    /// # Errors
    ///
    /// Returns a usage error for an invalid identifier and not-found if no
    /// chunk has this identifier.
    pub fn first_descriptor(&self, id: impl AsRef<[u8]>) -> CoreResult<&ChunkDescriptor> {
        let id = ChunkId::new(id.as_ref())?;
        self.index
            .first(&id)
            .ok_or_else(|| CoreError::not_found(id.to_string_lossy(), None))
    }

    /// Returns the version of the first chunk written under `id`.
    ///
    /// # Errors
    ///
    /// See [`Self::first_descriptor`].
    pub fn chunk_version(&self, id: impl AsRef<[u8]>) -> CoreResult<u32> {
        Ok(self.first_descriptor(id)?.version)
    }

    /// Returns the version of an exact chunk.
    ///
    /// # Errors
    ///
    /// See [`Self::descriptor`].
    pub fn chunk_version_at(&self, id: impl AsRef<[u8]>, index: u32) -> CoreResult<u32> {
        Ok(self.descriptor(id, index)?.version)
    }

    /// Returns the header size of the first chunk written under `id`.
    ///
    /// # Errors
    ///
    /// See [`Self::first_descriptor`].
    pub fn chunk_header_size(&self, id: impl AsRef<[u8]>) -> CoreResult<u64> {
        Ok(self.first_descriptor(id)?.header_size)
    }

    /// Returns the header size of an exact chunk.
    ///
    /// # Errors
    ///
    /// See [`Self::descriptor`].
    pub fn chunk_header_size_at(&self, id: impl AsRef<[u8]>, index: u32) -> CoreResult<u64> {
        Ok(self.descriptor(id, index)?.header_size)
    }

    /// Returns the uncompressed data size of the first chunk written under `id`.
    ///
    /// # Errors
    ///
    /// See [`Self::first_descriptor`].
    pub fn chunk_data_size(&self, id: impl AsRef<[u8]>) -> CoreResult<u64> {
        Ok(self.first_descriptor(id)?.uncompressed_size)
    }

    /// Returns the uncompressed data size of an exact chunk.
    ///
    /// # Errors
    ///
    /// See [`Self::descriptor`].
    pub fn chunk_data_size_at(&self, id: impl AsRef<[u8]>, index: u32) -> CoreResult<u64> {
        Ok(self.descriptor(id, index)?.uncompressed_size)
    }

    /// Copies a chunk header into `dest`.
    ///
    /// `dest` may be `None` only when the header is empty; a destination
    /// shorter than the header is rejected before anything is read.
    ///
    /// # Errors
    ///
    /// Returns a usage error for a missing or short destination, not-found
    /// for an unknown chunk, and stream errors from the transport.
    pub fn read_chunk_header_into(
        &self,
        id: impl AsRef<[u8]>,
        index: u32,
        dest: Option<&mut [u8]>,
    ) -> CoreResult<()> {
        let descriptor = self.descriptor(id, index)?;
        let Some(dest) = destination(dest, descriptor.header_size, "header")? else {
            return Ok(());
        };
        let header = self.read_header_of(descriptor)?;
        dest[..header.len()].copy_from_slice(&header);
        Ok(())
    }

    /// Decompresses chunk data into `dest`.
    ///
    /// `dest` may be `None` only when the data is empty; a destination
    /// shorter than the uncompressed size is rejected before anything is read.
    ///
    /// # Errors
    ///
    /// Returns a usage error for a missing or short destination, not-found
    /// for an unknown chunk, a format error if decompression does not yield
    /// the recorded size, and stream errors from the transport.
    pub fn read_chunk_data_into(
        &self,
        id: impl AsRef<[u8]>,
        index: u32,
        dest: Option<&mut [u8]>,
    ) -> CoreResult<()> {
        let descriptor = self.descriptor(id, index)?;
        let Some(dest) = destination(dest, descriptor.uncompressed_size, "data")? else {
            return Ok(());
        };
        let data = self.read_data_of(descriptor)?;
        dest[..data.len()].copy_from_slice(&data);
        Ok(())
    }

    /// Returns a chunk header.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown chunk and stream errors from the transport.
    pub fn read_chunk_header(&self, id: impl AsRef<[u8]>, index: u32) -> CoreResult<Vec<u8>> {
        let descriptor = self.descriptor(id, index)?;
        self.read_header_of(descriptor)
    }

    /// Returns decompressed chunk data.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown chunk, format errors from
    /// decompression and stream errors from the transport.
    pub fn read_chunk_data(&self, id: impl AsRef<[u8]>, index: u32) -> CoreResult<Vec<u8>> {
        let descriptor = self.descriptor(id, index)?;
        self.read_data_of(descriptor)
    }

    /// Decompresses chunk data into a temporary buffer and hands it to `f`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_chunk_data`]; `f` is not called on error.
    pub fn read_chunk_data_with<R>(
        &self,
        id: impl AsRef<[u8]>,
        index: u32,
        f: impl FnOnce(&[u8]) -> R,
    ) -> CoreResult<R> {
        let data = self.read_chunk_data(id, index)?;
        Ok(f(&data))
    }

    /// Returns a cursor over all chunks in write order.
    #[must_use]
    pub fn iter(&self) -> ChunkIterator<'_, 'a> {
        ChunkIterator::new(self)
    }

    pub(crate) fn read_header_of(&self, descriptor: &ChunkDescriptor) -> CoreResult<Vec<u8>> {
        let mut stream = self.stream.lock();
        read_region(&mut **stream, descriptor.header_offset, descriptor.header_size)
    }

    pub(crate) fn read_data_of(&self, descriptor: &ChunkDescriptor) -> CoreResult<Vec<u8>> {
        let stored = {
            let mut stream = self.stream.lock();
            read_region(&mut **stream, descriptor.data_offset, descriptor.compressed_size)?
        };

        let expected = usize::try_from(descriptor.uncompressed_size).map_err(|_| {
            CoreError::format(format!(
                "chunk {}[{}] is too large for this platform",
                descriptor.id, descriptor.index
            ))
        })?;

        let codec = self.registry.get(descriptor.compression)?;
        let data = codec.decompress(&stored, expected)?;
        if data.len() != expected {
            return Err(CoreError::format(format!(
                "chunk {}[{}] decompressed to {} bytes, expected {expected}",
                descriptor.id,
                descriptor.index,
                data.len()
            )));
        }

        tracing::trace!(
            id = %descriptor.id,
            index = descriptor.index,
            codec = codec.name(),
            bytes = expected,
            "read chunk data"
        );
        Ok(data)
    }
}

/// Validates a copy destination against the number of bytes to copy.
///
/// Returns `None` when there is nothing to copy.
fn destination<'d>(
    dest: Option<&'d mut [u8]>,
    size: u64,
    what: &str,
) -> CoreResult<Option<&'d mut [u8]>> {
    if size == 0 {
        return Ok(None);
    }
    let dest = dest.ok_or_else(|| {
        CoreError::usage(format!("no destination buffer for {size} bytes of chunk {what}"))
    })?;
    if (dest.len() as u64) < size {
        return Err(CoreError::usage(format!(
            "destination holds {} bytes, chunk {what} needs {size}",
            dest.len()
        )));
    }
    Ok(Some(dest))
}

impl ChunkFileReader<'static> {
    /// Opens a container file; the reader owns and closes the file.
    ///
    /// # Errors
    ///
    /// Returns a stream error if the file cannot be opened and a format
    /// error if it is not a finished container.
    pub fn open_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let stream = FileStream::open(path.as_ref(), FileAccess::Read)?;
        Self::from_handle(StreamHandle::owned(stream), CodecRegistry::default())
    }
}

impl Drop for ChunkFileReader<'_> {
    fn drop(&mut self) {
        let stream = self.stream.get_mut();
        if stream.is_owned() {
            if let Err(e) = stream.close() {
                tracing::warn!(error = %e, "failed to close chunk file stream");
            }
        }
    }
}

impl std::fmt::Debug for ChunkFileReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkFileReader")
            .field("header", &self.header)
            .field("chunks", &self.index.len())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkCreateInfo, ChunkFileWriter, ErrorKind};
    use chunkfile_codec::Compression;
    use chunkfile_stream::MemoryStream;

    fn sample_stream() -> MemoryStream {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
        writer.write_chunk("chunk0", b"h0", b"some data").unwrap();
        writer
            .write_chunk_with(
                &ChunkCreateInfo::new("chunk0")
                    .unwrap()
                    .header(b"h1")
                    .version(7)
                    .compression(Compression::Zstd),
                &[9u8; 512],
            )
            .unwrap();
        writer
            .write_chunk_with(&ChunkCreateInfo::new("chunk1").unwrap().version(3), b"")
            .unwrap();
        writer.close().unwrap();
        drop(writer);
        stream
    }

    #[test]
    fn reader_queries() {
        let mut stream = sample_stream();
        let reader = ChunkFileReader::open(&mut stream).unwrap();

        assert_eq!(reader.len(), 3);
        assert!(reader.contains_chunk("chunk0").unwrap());
        assert!(reader.contains_chunk_at("chunk0", 1).unwrap());
        assert!(!reader.contains_chunk_at("chunk0", 2).unwrap());
        assert!(!reader.contains_chunk("chunk2").unwrap());
        assert_eq!(reader.chunk_count("chunk0").unwrap(), 2);
        assert_eq!(reader.chunk_version("chunk1").unwrap(), 3);
        assert_eq!(reader.chunk_version_at("chunk0", 1).unwrap(), 7);
        assert_eq!(reader.chunk_header_size_at("chunk0", 1).unwrap(), 2);
        assert_eq!(reader.chunk_data_size_at("chunk0", 1).unwrap(), 512);
    }

    #[test]
    fn reader_reads_compressed_and_plain_data() {
        let mut stream = sample_stream();
        let reader = ChunkFileReader::open(&mut stream).unwrap();

        assert_eq!(reader.read_chunk_data("chunk0", 0).unwrap(), b"some data");
        assert_eq!(reader.read_chunk_data("chunk0", 1).unwrap(), vec![9u8; 512]);
        assert_eq!(reader.read_chunk_header("chunk0", 1).unwrap(), b"h1");
        assert!(reader.descriptor("chunk0", 1).unwrap().compressed_size < 512);

        let len = reader
            .read_chunk_data_with("chunk0", 0, |data| data.len())
            .unwrap();
        assert_eq!(len, 9);
    }

    #[test]
    fn reader_destination_rules() {
        let mut stream = sample_stream();
        let reader = ChunkFileReader::open(&mut stream).unwrap();

        // Empty chunk into no buffer is fine
        reader.read_chunk_data_into("chunk1", 0, None).unwrap();

        let err = reader.read_chunk_data_into("chunk0", 0, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);

        let mut small = [0u8; 4];
        let err = reader
            .read_chunk_data_into("chunk0", 0, Some(&mut small))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);

        let mut exact = [0u8; 9];
        reader
            .read_chunk_data_into("chunk0", 0, Some(&mut exact))
            .unwrap();
        assert_eq!(&exact, b"some data");
    }

    #[test]
    fn reader_not_found_and_usage_are_distinct() {
        let mut stream = sample_stream();
        let reader = ChunkFileReader::open(&mut stream).unwrap();

        assert_eq!(
            reader.chunk_version("missing").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            reader.chunk_version_at("chunk0", 9).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(reader.contains_chunk("").unwrap_err().kind(), ErrorKind::Usage);
    }

    #[test]
    fn reader_corrupt_uncompressed_size_is_format_error() {
        let mut stream = sample_stream();
        let index_offset = ChunkFileReader::open(&mut stream)
            .unwrap()
            .header()
            .index_offset;

        // uncompressed size of chunk0[1], the zstd chunk
        let field = (index_offset as usize) + ChunkDescriptor::ENCODED_SIZE + 64;
        let mut bytes = stream.into_inner();
        bytes[field..field + 8].copy_from_slice(&(1u64 << 46).to_le_bytes());
        let mut stream = MemoryStream::with_data(bytes);

        let reader = ChunkFileReader::open(&mut stream).unwrap();
        assert_eq!(reader.chunk_data_size_at("chunk0", 1).unwrap(), 1 << 46);
        let err = reader.read_chunk_data("chunk0", 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(reader.read_chunk_data("chunk0", 0).unwrap(), b"some data");
    }

    #[test]
    fn reader_rejects_foreign_stream() {
        let mut stream = MemoryStream::with_data(vec![0x55; 256]);
        let err = ChunkFileReader::open(&mut stream).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn reader_owned_stream_is_closed_on_drop() {
        let stream = sample_stream();
        let reader = ChunkFileReader::open_owned(Box::new(stream)).unwrap();
        assert_eq!(reader.len(), 3);
        drop(reader);
    }
}
