//! Codec trait and the built-in codecs.

use crate::error::{CodecError, CodecResult};
use std::io::Read;

/// Compression level used by [`ZstdCodec::default`].
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Upper bound on the output buffer reserved before decoding starts.
const MAX_PREALLOCATION: usize = 1 << 20;

/// Codec tags understood by the built-in registry.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Data is stored as-is.
    #[default]
    None = 0,
    /// Data is compressed with zstd.
    Zstd = 1,
}

impl Compression {
    /// Returns the on-disk tag.
    #[must_use]
    pub const fn tag(self) -> u32 {
        self as u32
    }

    /// Parses an on-disk tag.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Returns the human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zstd => "zstd",
        }
    }
}

impl From<Compression> for u32 {
    fn from(compression: Compression) -> Self {
        compression.tag()
    }
}

/// A whole-buffer compression transform.
///
/// Each implementation:
/// - Is identified by a stable numeric `id()` stored per chunk
/// - Compresses a complete payload in one call; no state is carried between chunks
/// - Decompresses to exactly the size recorded when the chunk was written
pub trait Codec: Send + Sync {
    /// Stable codec tag stored in chunk descriptors.
    fn id(&self) -> u32;

    /// Human-readable codec name.
    fn name(&self) -> &'static str;

    /// Compresses a complete payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::CompressionFailed`] if the transform fails.
    fn compress(&self, raw: &[u8]) -> CodecResult<Vec<u8>>;

    /// Decompresses a payload that must expand to `expected_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::DecompressionFailed`] for malformed input and
    /// [`CodecError::SizeMismatch`] if the output length differs from
    /// `expected_size`.
    fn decompress(&self, compressed: &[u8], expected_size: usize) -> CodecResult<Vec<u8>>;
}

/// Stores data unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Codec for PassThrough {
    fn id(&self) -> u32 {
        Compression::None.tag()
    }

    fn name(&self) -> &'static str {
        Compression::None.name()
    }

    fn compress(&self, raw: &[u8]) -> CodecResult<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, compressed: &[u8], expected_size: usize) -> CodecResult<Vec<u8>> {
        if compressed.len() != expected_size {
            return Err(CodecError::SizeMismatch {
                expected: expected_size,
                actual: compressed.len(),
            });
        }
        Ok(compressed.to_vec())
    }
}

/// zstd single-frame compression.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Creates a zstd codec with the given compression level.
    #[must_use]
    pub const fn new(level: i32) -> Self {
        Self { level }
    }

    /// Returns the compression level.
    #[must_use]
    pub const fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::new(DEFAULT_ZSTD_LEVEL)
    }
}

impl Codec for ZstdCodec {
    fn id(&self) -> u32 {
        Compression::Zstd.tag()
    }

    fn name(&self) -> &'static str {
        Compression::Zstd.name()
    }

    fn compress(&self, raw: &[u8]) -> CodecResult<Vec<u8>> {
        zstd::bulk::compress(raw, self.level)
            .map_err(|e| CodecError::compression_failed(e.to_string()))
    }

    fn decompress(&self, compressed: &[u8], expected_size: usize) -> CodecResult<Vec<u8>> {
        // Untrusted size: caps the output, never reserved in full
        let decoder = zstd::stream::read::Decoder::with_buffer(compressed)
            .map_err(|e| CodecError::decompression_failed(e.to_string()))?;
        let limit = u64::try_from(expected_size)
            .unwrap_or(u64::MAX)
            .saturating_add(1);

        let mut data = Vec::with_capacity(expected_size.min(MAX_PREALLOCATION));
        decoder
            .take(limit)
            .read_to_end(&mut data)
            .map_err(|e| CodecError::decompression_failed(e.to_string()))?;

        if data.len() != expected_size {
            return Err(CodecError::SizeMismatch {
                expected: expected_size,
                actual: data.len(),
            });
        }
        Ok(data)
    }
}
