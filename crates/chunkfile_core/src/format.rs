//! On-disk container layout.
//!
//! ```text
//! +-----------------+  0
//! | ContainerHeader |  40 bytes
//! +-----------------+
//! | chunk 0 header  |
//! | chunk 0 data    |
//! | ...             |
//! +-----------------+  index_offset
//! | descriptors     |  chunk_count * 72 bytes
//! +-----------------+
//! | IndexFooter     |  24 bytes
//! +-----------------+
//! ```
//!
//! All integers are little-endian. The header is written with a zero index
//! offset when a writer starts and rewritten on close, so a container whose
//! writer never closed is rejected.

use crate::descriptor::{read_u32, read_u64, ChunkDescriptor};
use crate::error::{CoreError, CoreResult};
use crate::index::ChunkIndex;
use chunkfile_stream::Stream;

/// Magic bytes at the start of every container.
pub const CONTAINER_MAGIC: [u8; 8] = *b"CHNKFILE";

/// Magic bytes closing the index footer.
pub const FOOTER_MAGIC: [u8; 8] = *b"CHNKINDX";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// The fixed-size header at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Format version.
    pub version: u32,
    /// Number of chunks in the index.
    pub chunk_count: u64,
    /// Absolute offset of the index block; 0 while unfinished.
    pub index_offset: u64,
    /// Size of the index block in bytes.
    pub index_size: u64,
}

impl ContainerHeader {
    /// magic (8) + version (4) + reserved (4) + chunk_count (8) + index_offset (8)
    /// + index_size (8) = 40
    pub const SIZE: usize = 40;

    /// Header written when a container is started.
    #[must_use]
    pub const fn unfinished() -> Self {
        Self {
            version: FORMAT_VERSION,
            chunk_count: 0,
            index_offset: 0,
            index_size: 0,
        }
    }

    /// Encodes the header.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&CONTAINER_MAGIC);
        buf[8..12].copy_from_slice(&self.version.to_le_bytes());
        buf[16..24].copy_from_slice(&self.chunk_count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.index_offset.to_le_bytes());
        buf[32..40].copy_from_slice(&self.index_size.to_le_bytes());
        buf
    }

    /// Decodes and validates magic and version.
    ///
    /// # Errors
    ///
    /// Returns a format error for a foreign or newer container.
    pub fn decode(data: &[u8; Self::SIZE]) -> CoreResult<Self> {
        if data[0..8] != CONTAINER_MAGIC {
            return Err(CoreError::format("bad container magic"));
        }

        let version = read_u32(data, 8);
        if version == 0 || version > FORMAT_VERSION {
            return Err(CoreError::format(format!(
                "unsupported format version {version} (supported: {FORMAT_VERSION})"
            )));
        }

        Ok(Self {
            version,
            chunk_count: read_u64(data, 16),
            index_offset: read_u64(data, 24),
            index_size: read_u64(data, 32),
        })
    }
}

/// The record following the index block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFooter {
    /// Absolute offset of the index block.
    pub index_offset: u64,
    /// Size of the index block in bytes.
    pub index_size: u64,
}

impl IndexFooter {
    /// index_offset (8) + index_size (8) + magic (8) = 24
    pub const SIZE: usize = 24;

    /// Encodes the footer.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&self.index_offset.to_le_bytes());
        buf[8..16].copy_from_slice(&self.index_size.to_le_bytes());
        buf[16..24].copy_from_slice(&FOOTER_MAGIC);
        buf
    }

    /// Decodes the footer and checks its magic.
    ///
    /// # Errors
    ///
    /// Returns a format error if the magic does not match.
    pub fn decode(data: &[u8; Self::SIZE]) -> CoreResult<Self> {
        if data[16..24] != FOOTER_MAGIC {
            return Err(CoreError::format("bad index footer magic"));
        }
        Ok(Self {
            index_offset: read_u64(data, 0),
            index_size: read_u64(data, 8),
        })
    }
}

/// Reads the header, footer and index of a container.
///
/// Every descriptor is checked to lie between the header and the index block.
///
/// # Errors
///
/// Returns a format error if any structure is missing, truncated or
/// inconsistent, and a stream error if the transport fails.
pub fn load_index(stream: &mut dyn Stream) -> CoreResult<(ContainerHeader, ChunkIndex)> {
    let size = stream.size()?;
    if size < (ContainerHeader::SIZE + IndexFooter::SIZE) as u64 {
        return Err(CoreError::format(format!(
            "stream is {size} bytes, too small for a container"
        )));
    }

    let mut raw_header = [0u8; ContainerHeader::SIZE];
    stream.seek(0)?;
    read_structure(stream, &mut raw_header, "container header")?;
    let header = ContainerHeader::decode(&raw_header)?;

    if header.index_offset == 0 {
        return Err(CoreError::format(
            "container was never finished (writer not closed)",
        ));
    }

    let expected_size = header
        .chunk_count
        .checked_mul(ChunkDescriptor::ENCODED_SIZE as u64)
        .ok_or_else(|| CoreError::format("chunk count overflows index size"))?;
    if header.index_size != expected_size {
        return Err(CoreError::format(format!(
            "index size {} does not match {} chunks",
            header.index_size, header.chunk_count
        )));
    }

    let index_end = header
        .index_offset
        .checked_add(header.index_size)
        .filter(|_| header.index_offset >= ContainerHeader::SIZE as u64)
        .filter(|&end| end.saturating_add(IndexFooter::SIZE as u64) <= size)
        .ok_or_else(|| CoreError::format("index block lies outside the stream"))?;

    let mut raw_index = vec![0u8; header.index_size as usize];
    stream.seek(header.index_offset)?;
    read_structure(stream, &mut raw_index, "index block")?;

    let mut raw_footer = [0u8; IndexFooter::SIZE];
    stream.seek(index_end)?;
    read_structure(stream, &mut raw_footer, "index footer")?;
    let footer = IndexFooter::decode(&raw_footer)?;
    if footer.index_offset != header.index_offset || footer.index_size != header.index_size {
        return Err(CoreError::format("index footer disagrees with header"));
    }

    let descriptors = raw_index
        .chunks_exact(ChunkDescriptor::ENCODED_SIZE)
        .map(ChunkDescriptor::decode)
        .collect::<CoreResult<Vec<_>>>()?;

    for descriptor in &descriptors {
        let starts_after_header = descriptor.header_offset >= ContainerHeader::SIZE as u64
            && descriptor.data_offset >= ContainerHeader::SIZE as u64;
        if !starts_after_header || descriptor.end_offset() > header.index_offset {
            return Err(CoreError::format(format!(
                "chunk {}[{}] lies outside the payload region",
                descriptor.id, descriptor.index
            )));
        }
    }

    let index = ChunkIndex::from_descriptors(descriptors)?;
    tracing::debug!(
        chunks = index.len(),
        index_offset = header.index_offset,
        "loaded container index"
    );
    Ok((header, index))
}

/// Reads `len` bytes at `offset`.
///
/// A short read means the container lies about its own layout and is
/// reported as a format error.
pub(crate) fn read_region(stream: &mut dyn Stream, offset: u64, len: u64) -> CoreResult<Vec<u8>> {
    let len = usize::try_from(len)
        .map_err(|_| CoreError::format(format!("region of {len} bytes is too large")))?;
    let mut buf = vec![0u8; len];
    if len > 0 {
        stream.seek(offset)?;
        read_structure(stream, &mut buf, "chunk payload")?;
    }
    Ok(buf)
}

/// Reads a fixed structure, turning a short read into a format error.
fn read_structure(stream: &mut dyn Stream, buf: &mut [u8], what: &str) -> CoreResult<()> {
    match stream.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(chunkfile_stream::StreamError::UnexpectedEof { requested, read }) => {
            Err(CoreError::format(format!(
                "truncated {what}: expected {requested} bytes, got {read}"
            )))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkfile_stream::MemoryStream;

    #[test]
    fn header_layout() {
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            chunk_count: 2,
            index_offset: 100,
            index_size: 144,
        };
        let bytes = header.encode();

        assert_eq!(&bytes[0..8], b"CHNKFILE");
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
        assert_eq!(ContainerHeader::decode(&bytes).unwrap(), header);
    }

    #[test]
    fn header_rejects_bad_magic_and_version() {
        let mut bytes = ContainerHeader::unfinished().encode();
        bytes[0] = b'X';
        assert!(ContainerHeader::decode(&bytes).is_err());

        let mut bytes = ContainerHeader::unfinished().encode();
        bytes[8..12].copy_from_slice(&99u32.to_le_bytes());
        assert!(ContainerHeader::decode(&bytes).is_err());
    }

    #[test]
    fn footer_layout() {
        let footer = IndexFooter {
            index_offset: 40,
            index_size: 72,
        };
        let bytes = footer.encode();
        assert_eq!(&bytes[16..24], b"CHNKINDX");
        assert_eq!(IndexFooter::decode(&bytes).unwrap(), footer);
    }

    #[test]
    fn load_index_empty_container() {
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            chunk_count: 0,
            index_offset: ContainerHeader::SIZE as u64,
            index_size: 0,
        };
        let footer = IndexFooter {
            index_offset: header.index_offset,
            index_size: 0,
        };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(&footer.encode());

        let mut stream = MemoryStream::with_data(bytes);
        let (loaded, index) = load_index(&mut stream).unwrap();
        assert_eq!(loaded, header);
        assert!(index.is_empty());
    }

    #[test]
    fn load_index_rejects_small_stream() {
        let mut stream = MemoryStream::with_data(vec![0u8; 10]);
        let err = load_index(&mut stream).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Format);
    }

    #[test]
    fn load_index_rejects_unfinished_container() {
        let mut bytes = ContainerHeader::unfinished().encode().to_vec();
        bytes.extend_from_slice(&[0u8; 64]);

        let mut stream = MemoryStream::with_data(bytes);
        let err = load_index(&mut stream).unwrap_err();
        assert!(err.to_string().contains("never finished"));
    }

    #[test]
    fn load_index_rejects_truncated_index() {
        let header = ContainerHeader {
            version: FORMAT_VERSION,
            chunk_count: 3,
            index_offset: ContainerHeader::SIZE as u64,
            index_size: 3 * ChunkDescriptor::ENCODED_SIZE as u64,
        };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(&[0u8; 80]);

        let mut stream = MemoryStream::with_data(bytes);
        let err = load_index(&mut stream).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Format);
    }
}
