//! Container writer.

use crate::config::{WriteMode, WriterConfig};
use crate::descriptor::ChunkDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::format::{load_index, read_region, ContainerHeader, IndexFooter, FORMAT_VERSION};
use crate::identifier::ChunkId;
use crate::index::ChunkIndex;
use chunkfile_codec::{CodecRegistry, ZstdCodec};
use chunkfile_stream::{FileAccess, FileStream, Stream, StreamHandle};
use std::path::Path;

/// Parameters for a single chunk.
///
/// Codec tag defaults to 0 (stored as-is), version to 0 and header to empty.
#[derive(Debug, Clone, Copy)]
pub struct ChunkCreateInfo<'h> {
    /// Chunk identifier.
    pub id: ChunkId,
    /// Opaque header bytes, never compressed.
    pub header: &'h [u8],
    /// Caller-defined version number.
    pub version: u32,
    /// Codec tag applied to the data.
    pub compression: u32,
}

impl<'h> ChunkCreateInfo<'h> {
    /// Creates chunk parameters for an identifier.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the identifier is empty, longer than 16
    /// bytes, or contains a NUL byte.
    pub fn new(id: impl AsRef<[u8]>) -> CoreResult<Self> {
        Ok(Self {
            id: ChunkId::new(id.as_ref())?,
            header: &[],
            version: 0,
            compression: 0,
        })
    }

    /// Sets the header bytes.
    #[must_use]
    pub fn header(mut self, header: &'h [u8]) -> Self {
        self.header = header;
        self
    }

    /// Sets the version.
    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the codec, either a [`chunkfile_codec::Compression`] or a raw tag.
    #[must_use]
    pub fn compression(mut self, compression: impl Into<u32>) -> Self {
        self.compression = compression.into();
        self
    }
}

/// A chunk started with [`ChunkFileWriter::begin_chunk`] and not yet ended.
#[derive(Debug)]
struct OpenChunk {
    descriptor: ChunkDescriptor,
    /// Uncompressed bytes waiting for the codec; unused for stored chunks.
    pending: Vec<u8>,
}

/// Writes chunks into a container.
///
/// Chunks are laid out as header bytes followed by (possibly compressed)
/// data, starting right after the container header. The index is written
/// on [`close`](Self::close); until then the container header marks the
/// file as unfinished and readers reject it.
///
/// Every call validates its arguments before touching the stream, so a
/// rejected call leaves the stream as it was.
///
/// # Example
///
/// ```rust
/// use chunkfile_core::{ChunkFileWriter, ChunkCreateInfo, Compression};
/// use chunkfile_stream::MemoryStream;
///
/// let mut stream = MemoryStream::new();
/// let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
///
/// writer.write_chunk("mesh", b"", &[1, 2, 3]).unwrap();
///
/// let info = ChunkCreateInfo::new("mesh").unwrap()
///     .version(2)
///     .compression(Compression::Zstd);
/// writer.begin_chunk(&info).unwrap();
/// writer.append_chunk_data(&[4, 5]).unwrap();
/// writer.append_chunk_data(&[6]).unwrap();
/// assert_eq!(writer.end_chunk().unwrap(), 1);
///
/// writer.close().unwrap();
/// ```
pub struct ChunkFileWriter<'a> {
    stream: StreamHandle<'a>,
    index: ChunkIndex,
    config: WriterConfig,
    registry: CodecRegistry,
    position: u64,
    open_chunk: Option<OpenChunk>,
    closed: bool,
}

impl<'a> ChunkFileWriter<'a> {
    /// Creates a writer that starts a new container on a caller-owned stream.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the stream is not writable.
    pub fn new(stream: &'a mut dyn Stream) -> CoreResult<Self> {
        Self::with_config(stream, WriterConfig::default())
    }

    /// Creates a writer with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the stream is not writable, and format
    /// errors if appending to a stream that is not a finished container.
    pub fn with_config(stream: &'a mut dyn Stream, config: WriterConfig) -> CoreResult<Self> {
        let registry = default_registry(&config);
        Self::from_handle(StreamHandle::Borrowed(stream), config, registry)
    }

    /// Creates a writer with a custom codec registry.
    ///
    /// # Errors
    ///
    /// Same as [`Self::with_config`].
    pub fn with_registry(
        stream: &'a mut dyn Stream,
        config: WriterConfig,
        registry: CodecRegistry,
    ) -> CoreResult<Self> {
        Self::from_handle(StreamHandle::Borrowed(stream), config, registry)
    }

    /// Creates a writer from a stream handle.
    ///
    /// # Errors
    ///
    /// Same as [`Self::with_config`].
    pub fn from_handle(
        mut stream: StreamHandle<'a>,
        config: WriterConfig,
        registry: CodecRegistry,
    ) -> CoreResult<Self> {
        if !stream.can_write() {
            return Err(CoreError::usage("cannot write a container to a read-only stream"));
        }
        if !registry.contains(config.compression.tag()) {
            return Err(CoreError::usage(format!(
                "default codec {} is not registered",
                config.compression.name()
            )));
        }

        let append = config.mode == WriteMode::Append && stream.size()? > 0;
        let (index, position) = if append {
            ingest(&mut *stream)?
        } else {
            if stream.can_truncate() && stream.size()? > 0 {
                stream.truncate(0)?;
            }
            write_at(&mut *stream, 0, &ContainerHeader::unfinished().encode())?;
            (ChunkIndex::new(), ContainerHeader::SIZE as u64)
        };

        tracing::debug!(
            mode = ?config.mode,
            existing = index.len(),
            position,
            "opened chunk file writer"
        );

        Ok(Self {
            stream,
            index,
            config,
            registry,
            position,
            open_chunk: None,
            closed: false,
        })
    }

    /// Returns the chunks written so far, including appended-to ones.
    #[must_use]
    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    /// Returns the writer configuration.
    #[must_use]
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Returns the offset the next chunk will be written at.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns true once the index has been written.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns true while a chunk started with [`Self::begin_chunk`] is open.
    #[must_use]
    pub fn has_open_chunk(&self) -> bool {
        self.open_chunk.is_some()
    }

    /// Writes a complete chunk with the configured default codec and version 0.
    ///
    /// Returns the disambiguation index the chunk was stored under.
    ///
    /// # Errors
    ///
    /// See [`Self::write_chunk_with`].
    pub fn write_chunk(
        &mut self,
        id: impl AsRef<[u8]>,
        header: &[u8],
        data: &[u8],
    ) -> CoreResult<u32> {
        let info = ChunkCreateInfo::new(id)?
            .header(header)
            .compression(self.config.compression);
        self.write_chunk_with(&info, data)
    }

    /// Writes a complete chunk.
    ///
    /// Returns the disambiguation index the chunk was stored under.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the writer is closed, a chunk is open, or
    /// the codec is unknown. Stream and codec failures propagate.
    pub fn write_chunk_with(&mut self, info: &ChunkCreateInfo<'_>, data: &[u8]) -> CoreResult<u32> {
        self.ensure_idle()?;
        let mut descriptor = self.start_descriptor(info)?;

        let codec = self.registry.get(info.compression)?;
        let stored = codec.compress(data)?;

        descriptor.compressed_size = stored.len() as u64;
        descriptor.uncompressed_size = data.len() as u64;
        self.write_payload(&descriptor, info.header, &stored)?;
        self.commit(descriptor)
    }

    /// Starts a chunk whose data arrives in pieces.
    ///
    /// The header is written immediately. Data of stored chunks is written
    /// as it arrives; data of compressed chunks is buffered until
    /// [`Self::end_chunk`].
    ///
    /// # Errors
    ///
    /// Returns a usage error if the writer is closed, a chunk is already
    /// open, or the codec is unknown.
    pub fn begin_chunk(&mut self, info: &ChunkCreateInfo<'_>) -> CoreResult<()> {
        self.ensure_idle()?;
        let descriptor = self.start_descriptor(info)?;

        write_at(&mut *self.stream, descriptor.header_offset, info.header)?;
        self.open_chunk = Some(OpenChunk {
            descriptor,
            pending: Vec::new(),
        });
        Ok(())
    }

    /// Appends data to the open chunk.
    ///
    /// # Errors
    ///
    /// Returns a usage error if no chunk is open.
    pub fn append_chunk_data(&mut self, data: &[u8]) -> CoreResult<()> {
        let chunk = self
            .open_chunk
            .as_mut()
            .ok_or_else(|| CoreError::usage("no chunk is open"))?;

        if chunk.descriptor.compression == 0 {
            let offset = chunk
                .descriptor
                .data_offset
                .saturating_add(chunk.descriptor.compressed_size);
            write_at(&mut *self.stream, offset, data)?;
            chunk.descriptor.compressed_size += data.len() as u64;
        } else {
            chunk.pending.extend_from_slice(data);
        }
        chunk.descriptor.uncompressed_size += data.len() as u64;
        Ok(())
    }

    /// Ends the open chunk and records it in the index.
    ///
    /// Returns the disambiguation index the chunk was stored under.
    ///
    /// # Errors
    ///
    /// Returns a usage error if no chunk is open. On a codec or stream
    /// failure the chunk stays open.
    pub fn end_chunk(&mut self) -> CoreResult<u32> {
        let chunk = self
            .open_chunk
            .as_ref()
            .ok_or_else(|| CoreError::usage("no chunk is open"))?;

        let mut descriptor = chunk.descriptor;
        if descriptor.compression != 0 {
            let codec = self.registry.get(descriptor.compression)?;
            let stored = codec.compress(&chunk.pending)?;
            write_at(&mut *self.stream, descriptor.data_offset, &stored)?;
            descriptor.compressed_size = stored.len() as u64;
        }

        self.open_chunk = None;
        self.commit(descriptor)
    }

    /// Writes the index and marks the container finished.
    ///
    /// An open chunk is ended first. If the writer owns its stream, the
    /// stream is closed too. Closing an already-closed writer does nothing.
    /// On failure the writer stays open and `close` may be retried.
    ///
    /// # Errors
    ///
    /// Returns stream errors from writing the index or closing the stream.
    pub fn close(&mut self) -> CoreResult<()> {
        if self.closed {
            return Ok(());
        }
        if self.open_chunk.is_some() {
            tracing::warn!("closing chunk file writer with an open chunk; ending it");
            self.end_chunk()?;
        }

        let mut block = Vec::with_capacity(self.index.len() * ChunkDescriptor::ENCODED_SIZE);
        for descriptor in &self.index {
            descriptor.encode_into(&mut block);
        }
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            chunk_count: self.index.len() as u64,
            index_offset: self.position,
            index_size: block.len() as u64,
        };
        let footer = IndexFooter {
            index_offset: header.index_offset,
            index_size: header.index_size,
        };
        block.extend_from_slice(&footer.encode());

        write_at(&mut *self.stream, self.position, &block)?;
        write_at(&mut *self.stream, 0, &header.encode())?;

        // Anything past the footer is left over from earlier content
        let end = self.position + block.len() as u64;
        if self.stream.can_truncate() && self.stream.size()? > end {
            self.stream.truncate(end)?;
        }

        if self.stream.is_owned() {
            self.stream.close()?;
        }

        self.closed = true;
        tracing::debug!(
            chunks = header.chunk_count,
            index_offset = header.index_offset,
            "closed chunk file writer"
        );
        Ok(())
    }

    /// Closes the writer, consuming it.
    ///
    /// # Errors
    ///
    /// See [`Self::close`].
    pub fn finish(mut self) -> CoreResult<()> {
        self.close()
    }

    fn ensure_idle(&self) -> CoreResult<()> {
        if self.closed {
            return Err(CoreError::usage("writer is closed"));
        }
        if self.open_chunk.is_some() {
            return Err(CoreError::usage("a chunk is already open"));
        }
        Ok(())
    }

    /// Builds the descriptor for a new chunk at the current position.
    fn start_descriptor(&self, info: &ChunkCreateInfo<'_>) -> CoreResult<ChunkDescriptor> {
        if !self.registry.contains(info.compression) {
            return Err(CoreError::usage(format!(
                "unknown codec tag {}",
                info.compression
            )));
        }

        let header_size = info.header.len() as u64;
        Ok(ChunkDescriptor {
            id: info.id,
            index: self.index.next_index(&info.id),
            version: info.version,
            compression: info.compression,
            header_offset: self.position,
            header_size,
            data_offset: self.position + header_size,
            compressed_size: 0,
            uncompressed_size: 0,
        })
    }

    fn write_payload(
        &mut self,
        descriptor: &ChunkDescriptor,
        header: &[u8],
        stored: &[u8],
    ) -> CoreResult<()> {
        write_at(&mut *self.stream, descriptor.header_offset, header)?;
        if !stored.is_empty() {
            self.stream.write_all(stored)?;
        }
        Ok(())
    }

    fn commit(&mut self, descriptor: ChunkDescriptor) -> CoreResult<u32> {
        let index = descriptor.index;
        self.position = descriptor.end_offset();
        tracing::trace!(
            id = %descriptor.id,
            index,
            stored = descriptor.compressed_size,
            bytes = descriptor.uncompressed_size,
            "wrote chunk"
        );
        self.index.push(descriptor)?;
        Ok(index)
    }
}

impl ChunkFileWriter<'static> {
    /// Creates a writer on a file; the writer owns and closes the file.
    ///
    /// Create mode truncates the file. Append mode keeps an existing
    /// container and creates the file if it is missing.
    ///
    /// # Errors
    ///
    /// Returns a stream error if the file cannot be opened, and format
    /// errors if appending to a file that is not a finished container.
    pub fn create_path(path: impl AsRef<Path>, config: WriterConfig) -> CoreResult<Self> {
        let access = match config.mode {
            WriteMode::Create => FileAccess::Write,
            WriteMode::Append => FileAccess::ReadWrite,
        };
        let stream = FileStream::open(path.as_ref(), access)?;
        let registry = default_registry(&config);
        Self::from_handle(StreamHandle::owned(stream), config, registry)
    }
}

impl Drop for ChunkFileWriter<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::warn!(
            chunks = self.index.len(),
            "chunk file writer dropped without close; container left unfinished"
        );
        if self.stream.is_owned() {
            if let Err(e) = self.stream.close() {
                tracing::warn!(error = %e, "failed to close chunk file stream");
            }
        }
    }
}

impl std::fmt::Debug for ChunkFileWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkFileWriter")
            .field("config", &self.config)
            .field("chunks", &self.index.len())
            .field("position", &self.position)
            .field("open_chunk", &self.open_chunk.is_some())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn default_registry(config: &WriterConfig) -> CodecRegistry {
    CodecRegistry::default().with(ZstdCodec::new(config.compression_level))
}

fn write_at(stream: &mut dyn Stream, offset: u64, bytes: &[u8]) -> CoreResult<()> {
    stream.seek(offset)?;
    stream.write_all(bytes)?;
    Ok(())
}

/// Loads an existing container for appending.
///
/// Returns the index and the offset new chunks start at. Payloads already
/// packed back to back from the container header stay in place; any other
/// layout is read fully and rewritten that way. The header is marked
/// unfinished before returning so an append that is never closed is
/// rejected by readers.
fn ingest(stream: &mut dyn Stream) -> CoreResult<(ChunkIndex, u64)> {
    if !stream.can_read() {
        return Err(CoreError::usage("appending requires a readable stream"));
    }

    let (_, index) = load_index(stream)?;

    let mut end = ContainerHeader::SIZE as u64;
    let packed = index.iter().all(|d| {
        let in_place = d.header_offset == end && d.data_offset == d.header_offset + d.header_size;
        end = d.end_offset();
        in_place
    });

    if packed {
        write_at(stream, 0, &ContainerHeader::unfinished().encode())?;
        return Ok((index, end));
    }

    tracing::debug!(chunks = index.len(), "repacking container before append");

    let mut payloads = Vec::with_capacity(index.len());
    for d in &index {
        let header = read_region(stream, d.header_offset, d.header_size)?;
        let stored = read_region(stream, d.data_offset, d.compressed_size)?;
        payloads.push((*d, header, stored));
    }

    write_at(stream, 0, &ContainerHeader::unfinished().encode())?;

    let mut position = ContainerHeader::SIZE as u64;
    let mut moved = Vec::with_capacity(payloads.len());
    for (mut d, header, stored) in payloads {
        d.header_offset = position;
        d.data_offset = position + d.header_size;
        write_at(stream, d.header_offset, &header)?;
        write_at(stream, d.data_offset, &stored)?;
        position = d.end_offset();
        moved.push(d);
    }

    Ok((ChunkIndex::from_descriptors(moved)?, position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkFileReader, ErrorKind};
    use chunkfile_codec::Compression;
    use chunkfile_stream::MemoryStream;

    #[test]
    fn writer_assigns_indices_per_id() {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();

        assert_eq!(writer.write_chunk("a", b"", b"1").unwrap(), 0);
        assert_eq!(writer.write_chunk("b", b"", b"2").unwrap(), 0);
        assert_eq!(writer.write_chunk("a", b"", b"3").unwrap(), 1);
        writer.close().unwrap();
    }

    #[test]
    fn writer_layout_is_packed() {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
        writer.write_chunk("a", b"hh", b"dddd").unwrap();

        let d = *writer.index().at(0).unwrap();
        assert_eq!(d.header_offset, ContainerHeader::SIZE as u64);
        assert_eq!(d.data_offset, d.header_offset + 2);
        assert_eq!(writer.position(), d.data_offset + 4);
        writer.close().unwrap();
        drop(writer);

        let expected = ContainerHeader::SIZE
            + 6
            + ChunkDescriptor::ENCODED_SIZE
            + IndexFooter::SIZE;
        assert_eq!(stream.data().len(), expected);
    }

    #[test]
    fn writer_rejects_calls_without_touching_stream() {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
        writer.write_chunk("a", b"", b"1").unwrap();
        let position = writer.position();

        let bad_codec = ChunkCreateInfo::new("a").unwrap().compression(99u32);
        let err = writer.write_chunk_with(&bad_codec, b"data").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(
            writer.write_chunk("", b"", b"x").unwrap_err().kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            writer.append_chunk_data(b"x").unwrap_err().kind(),
            ErrorKind::Usage
        );
        assert_eq!(writer.end_chunk().unwrap_err().kind(), ErrorKind::Usage);
        assert_eq!(writer.position(), position);
        writer.close().unwrap();
    }

    #[test]
    fn writer_rejects_nested_chunks_and_writes_after_close() {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();

        let info = ChunkCreateInfo::new("a").unwrap();
        writer.begin_chunk(&info).unwrap();
        assert_eq!(writer.begin_chunk(&info).unwrap_err().kind(), ErrorKind::Usage);
        assert_eq!(
            writer.write_chunk("b", b"", b"").unwrap_err().kind(),
            ErrorKind::Usage
        );
        writer.end_chunk().unwrap();

        writer.close().unwrap();
        writer.close().unwrap();
        assert!(writer.is_closed());
        assert_eq!(
            writer.write_chunk("b", b"", b"").unwrap_err().kind(),
            ErrorKind::Usage
        );
    }

    #[test]
    fn streamed_chunks_match_single_shot() {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();

        for compression in [Compression::None, Compression::Zstd] {
            let info = ChunkCreateInfo::new("s")
                .unwrap()
                .header(b"hdr")
                .compression(compression);
            writer.begin_chunk(&info).unwrap();
            writer.append_chunk_data(b"hello ").unwrap();
            writer.append_chunk_data(b"").unwrap();
            writer.append_chunk_data(b"world").unwrap();
            writer.end_chunk().unwrap();
        }
        writer.close().unwrap();
        drop(writer);

        let reader = ChunkFileReader::open(&mut stream).unwrap();
        for index in 0..2 {
            assert_eq!(reader.read_chunk_header("s", index).unwrap(), b"hdr");
            assert_eq!(reader.read_chunk_data("s", index).unwrap(), b"hello world");
        }
        assert_eq!(reader.descriptor("s", 1).unwrap().compression, 1);
    }

    #[test]
    fn close_ends_open_chunk() {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
        writer
            .begin_chunk(&ChunkCreateInfo::new("open").unwrap())
            .unwrap();
        writer.append_chunk_data(b"tail").unwrap();
        writer.close().unwrap();
        drop(writer);

        let reader = ChunkFileReader::open(&mut stream).unwrap();
        assert_eq!(reader.read_chunk_data("open", 0).unwrap(), b"tail");
    }

    #[test]
    fn writer_requires_writable_stream() {
        let mut stream = MemoryStream::read_only(Vec::<u8>::new());
        let err = ChunkFileWriter::new(&mut stream).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn default_codec_from_config() {
        let mut stream = MemoryStream::new();
        let config = WriterConfig::new()
            .compression(Compression::Zstd)
            .compression_level(9);
        let mut writer = ChunkFileWriter::with_config(&mut stream, config).unwrap();
        writer.write_chunk("z", b"", &[0u8; 1024]).unwrap();
        let d = *writer.index().at(0).unwrap();
        assert_eq!(d.compression, Compression::Zstd.tag());
        assert!(d.compressed_size < 1024);
        writer.close().unwrap();
    }

    #[test]
    fn append_keeps_packed_payloads_in_place() {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
        writer.write_chunk("a", b"h", b"first").unwrap();
        writer.close().unwrap();
        drop(writer);

        let config = WriterConfig::new().mode(WriteMode::Append);
        let mut writer = ChunkFileWriter::with_config(&mut stream, config).unwrap();
        let before = *writer.index().at(0).unwrap();
        assert_eq!(writer.position(), before.end_offset());
        assert_eq!(writer.write_chunk("a", b"", b"second").unwrap(), 1);
        writer.close().unwrap();
        drop(writer);

        let reader = ChunkFileReader::open(&mut stream).unwrap();
        assert_eq!(reader.descriptor("a", 0).unwrap(), &before);
        assert_eq!(reader.read_chunk_data("a", 0).unwrap(), b"first");
        assert_eq!(reader.read_chunk_data("a", 1).unwrap(), b"second");
    }

    #[test]
    fn append_repacks_scattered_payloads() {
        // One chunk whose payload sits after a gap of unrelated bytes.
        let header_offset = ContainerHeader::SIZE as u64 + 16;
        let descriptor = ChunkDescriptor {
            id: ChunkId::new(b"gap").unwrap(),
            index: 0,
            version: 4,
            compression: 0,
            header_offset,
            header_size: 2,
            data_offset: header_offset + 2,
            compressed_size: 3,
            uncompressed_size: 3,
        };
        let index_offset = descriptor.end_offset();
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            chunk_count: 1,
            index_offset,
            index_size: ChunkDescriptor::ENCODED_SIZE as u64,
        };

        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(&[0xEE; 16]);
        bytes.extend_from_slice(b"hhabc");
        bytes.extend_from_slice(&descriptor.encode());
        bytes.extend_from_slice(
            &IndexFooter {
                index_offset,
                index_size: header.index_size,
            }
            .encode(),
        );

        let mut stream = MemoryStream::with_data(bytes);
        let config = WriterConfig::new().mode(WriteMode::Append);
        let mut writer = ChunkFileWriter::with_config(&mut stream, config).unwrap();
        let moved = *writer.index().at(0).unwrap();
        assert_eq!(moved.header_offset, ContainerHeader::SIZE as u64);
        assert_eq!(moved.version, 4);
        writer.write_chunk("next", b"", b"xyz").unwrap();
        writer.close().unwrap();
        drop(writer);

        let reader = ChunkFileReader::open(&mut stream).unwrap();
        assert_eq!(reader.read_chunk_header("gap", 0).unwrap(), b"hh");
        assert_eq!(reader.read_chunk_data("gap", 0).unwrap(), b"abc");
        assert_eq!(reader.read_chunk_data("next", 0).unwrap(), b"xyz");
    }

    #[test]
    fn append_to_empty_stream_creates() {
        let mut stream = MemoryStream::new();
        let config = WriterConfig::new().mode(WriteMode::Append);
        let mut writer = ChunkFileWriter::with_config(&mut stream, config).unwrap();
        writer.write_chunk("a", b"", b"1").unwrap();
        writer.close().unwrap();
        drop(writer);

        let reader = ChunkFileReader::open(&mut stream).unwrap();
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn append_rejects_foreign_content() {
        let mut stream = MemoryStream::with_data(vec![7u8; 128]);
        let config = WriterConfig::new().mode(WriteMode::Append);
        let err = ChunkFileWriter::with_config(&mut stream, config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(stream.data(), &[7u8; 128][..]);
    }

    #[test]
    fn dropped_writer_leaves_unfinished_container() {
        let mut stream = MemoryStream::new();
        let mut writer = ChunkFileWriter::new(&mut stream).unwrap();
        writer.write_chunk("a", b"", b"1").unwrap();
        drop(writer);

        let err = ChunkFileReader::open(&mut stream).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
