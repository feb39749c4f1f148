//! Error types for stream operations.

use std::io;
use thiserror::Error;

/// Result type for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors that can occur during stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An I/O error occurred in the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream was constructed or called with an invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A read returned fewer bytes than required.
    #[error("unexpected end of stream: requested {requested} bytes, got {read}")]
    UnexpectedEof {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes actually read.
        read: usize,
    },

    /// A write stopped accepting bytes before the buffer was consumed.
    #[error("short write: requested {requested} bytes, wrote {written}")]
    WriteZero {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes actually written.
        written: usize,
    },

    /// The stream does not support reading.
    #[error("stream is not readable")]
    NotReadable,

    /// The stream does not support writing.
    #[error("stream is not writable")]
    NotWritable,

    /// The stream has been closed.
    #[error("stream is closed")]
    Closed,

    /// Closing the stream failed; the stream is still open.
    #[error("close failed: {0}")]
    CloseFailed(String),

    /// The stream does not implement the operation.
    #[error("stream does not support {0}")]
    Unsupported(&'static str),
}

impl StreamError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a close failure error.
    pub fn close_failed(message: impl Into<String>) -> Self {
        Self::CloseFailed(message.into())
    }

    /// Returns true if this error is caused by the caller rather than the transport.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
