//! Index entries describing one chunk each.

use crate::error::{CoreError, CoreResult};
use crate::identifier::{ChunkId, IDENTIFIER_SIZE};

/// Metadata for one chunk, as stored in the container index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// Chunk identifier.
    pub id: ChunkId,
    /// Disambiguation index among chunks sharing `id`.
    pub index: u32,
    /// Writer-supplied version.
    pub version: u32,
    /// Tag of the codec applied to the data.
    pub compression: u32,
    /// Absolute offset of the header bytes.
    pub header_offset: u64,
    /// Header size in bytes; headers are never compressed.
    pub header_size: u64,
    /// Absolute offset of the stored data bytes.
    pub data_offset: u64,
    /// Stored (possibly compressed) data size in bytes.
    pub compressed_size: u64,
    /// Data size after decompression.
    pub uncompressed_size: u64,
}

impl ChunkDescriptor {
    /// Encoded size: identifier (16) + index (4) + version (4) + compression (4)
    /// + reserved (4) + five u64 fields (40) = 72
    pub const ENCODED_SIZE: usize = 72;

    /// Appends the encoded descriptor to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.id.padded());
        buf.extend_from_slice(&self.index.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.compression.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&self.header_offset.to_le_bytes());
        buf.extend_from_slice(&self.header_size.to_le_bytes());
        buf.extend_from_slice(&self.data_offset.to_le_bytes());
        buf.extend_from_slice(&self.compressed_size.to_le_bytes());
        buf.extend_from_slice(&self.uncompressed_size.to_le_bytes());
    }

    /// Encodes the descriptor to bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::ENCODED_SIZE);
        self.encode_into(&mut buf);
        buf
    }

    /// Decodes a descriptor from exactly [`Self::ENCODED_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns a format error if the slice has the wrong length or the
    /// identifier field is malformed.
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        if data.len() != Self::ENCODED_SIZE {
            return Err(CoreError::format(format!(
                "descriptor is {} bytes, expected {}",
                data.len(),
                Self::ENCODED_SIZE
            )));
        }

        let mut raw_id = [0u8; IDENTIFIER_SIZE];
        raw_id.copy_from_slice(&data[..IDENTIFIER_SIZE]);
        let id = ChunkId::from_padded(&raw_id)?;

        Ok(Self {
            id,
            index: read_u32(data, 16),
            version: read_u32(data, 20),
            compression: read_u32(data, 24),
            // 28..32 reserved
            header_offset: read_u64(data, 32),
            header_size: read_u64(data, 40),
            data_offset: read_u64(data, 48),
            compressed_size: read_u64(data, 56),
            uncompressed_size: read_u64(data, 64),
        })
    }

    /// Returns the offset one past the last stored byte of this chunk.
    #[must_use]
    pub fn end_offset(&self) -> u64 {
        self.header_offset
            .saturating_add(self.header_size)
            .max(self.data_offset.saturating_add(self.compressed_size))
    }
}

pub(crate) fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

pub(crate) fn read_u64(data: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[at..at + 8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChunkDescriptor {
        ChunkDescriptor {
            id: ChunkId::try_from("TraceData").unwrap(),
            index: 3,
            version: 0xDEAD_BEEF,
            compression: 1,
            header_offset: 40,
            header_size: 12,
            data_offset: 52,
            compressed_size: 100,
            uncompressed_size: 4096,
        }
    }

    #[test]
    fn descriptor_encoded_size() {
        assert_eq!(sample().encode().len(), ChunkDescriptor::ENCODED_SIZE);
    }

    #[test]
    fn descriptor_layout() {
        let bytes = sample().encode();
        assert_eq!(&bytes[..9], b"TraceData");
        assert_eq!(&bytes[16..20], &3u32.to_le_bytes());
        assert_eq!(&bytes[28..32], &[0, 0, 0, 0]);
        assert_eq!(&bytes[64..72], &4096u64.to_le_bytes());
    }

    #[test]
    fn descriptor_decode() {
        let original = sample();
        let decoded = ChunkDescriptor::decode(&original.encode()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn descriptor_decode_wrong_length_fails() {
        let bytes = sample().encode();
        assert!(ChunkDescriptor::decode(&bytes[..71]).is_err());
    }

    #[test]
    fn descriptor_end_offset() {
        assert_eq!(sample().end_offset(), 152);
    }
}
