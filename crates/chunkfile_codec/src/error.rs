//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while compressing or decompressing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// No codec is registered for the tag.
    #[error("unknown codec tag: {tag}")]
    UnknownCodec {
        /// The unrecognised tag.
        tag: u32,
    },

    /// The codec failed to compress its input.
    #[error("compression failed: {message}")]
    CompressionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The codec failed to decompress its input.
    #[error("decompression failed: {message}")]
    DecompressionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decompression produced a different number of bytes than recorded.
    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Size recorded in the chunk descriptor.
        expected: usize,
        /// Size actually produced.
        actual: usize,
    },
}

impl CodecError {
    /// Create a compression failed error.
    pub fn compression_failed(message: impl Into<String>) -> Self {
        Self::CompressionFailed {
            message: message.into(),
        }
    }

    /// Create a decompression failed error.
    pub fn decompression_failed(message: impl Into<String>) -> Self {
        Self::DecompressionFailed {
            message: message.into(),
        }
    }
}
