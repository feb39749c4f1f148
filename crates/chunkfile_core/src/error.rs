//! Error types for the container engine.

use chunkfile_codec::CodecError;
use chunkfile_stream::StreamError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad classification of a [`CoreError`].
///
/// This is the taxonomy the C boundary reports as status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The call itself was malformed; a caller bug.
    Usage,
    /// The container is corrupt, foreign or unsupported.
    Format,
    /// The underlying transport failed.
    Io,
    /// The requested chunk does not exist.
    NotFound,
}

/// Errors that can occur in chunk container operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid API usage (bad identifier, re-entered chunk, closed writer).
    #[error("usage error: {message}")]
    Usage {
        /// Description of the misuse.
        message: String,
    },

    /// The container is malformed.
    #[error("invalid container format: {message}")]
    Format {
        /// Description of the format issue.
        message: String,
    },

    /// No chunk matches the identifier (and index, when given).
    #[error("chunk not found: {id}{}", .index.map(|i| format!("[{i}]")).unwrap_or_default())]
    NotFound {
        /// The identifier searched for.
        id: String,
        /// The disambiguation index searched for, if any.
        index: Option<u32>,
    },

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl CoreError {
    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Creates a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(id: impl Into<String>, index: Option<u32>) -> Self {
        Self::NotFound {
            id: id.into(),
            index,
        }
    }

    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Usage { .. } => ErrorKind::Usage,
            Self::Format { .. } => ErrorKind::Format,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Stream(e) if e.is_invalid_argument() => ErrorKind::Usage,
            Self::Stream(_) => ErrorKind::Io,
            Self::Codec(CodecError::CompressionFailed { .. }) => ErrorKind::Io,
            Self::Codec(_) => ErrorKind::Format,
        }
    }
}
