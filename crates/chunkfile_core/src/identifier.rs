//! Chunk identifiers.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Maximum identifier length in bytes.
pub const IDENTIFIER_SIZE: usize = 16;

/// The name shared by one or more chunks.
///
/// An identifier holds 1 to 16 bytes and compares exactly over its length.
/// On disk it is zero-padded to 16 bytes; a 16-byte identifier has no
/// terminator. NUL bytes are rejected because they cannot survive the padded
/// encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId {
    bytes: [u8; IDENTIFIER_SIZE],
    len: u8,
}

impl ChunkId {
    /// Creates an identifier from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns a usage error if `bytes` is empty, longer than
    /// [`IDENTIFIER_SIZE`], or contains a NUL byte.
    pub fn new(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.is_empty() {
            return Err(CoreError::usage("chunk identifier must not be empty"));
        }
        if bytes.len() > IDENTIFIER_SIZE {
            return Err(CoreError::usage(format!(
                "chunk identifier is {} bytes, maximum is {IDENTIFIER_SIZE}",
                bytes.len()
            )));
        }
        if bytes.contains(&0) {
            return Err(CoreError::usage("chunk identifier must not contain NUL bytes"));
        }

        let mut padded = [0u8; IDENTIFIER_SIZE];
        padded[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            bytes: padded,
            len: bytes.len() as u8,
        })
    }

    /// Decodes the zero-padded on-disk form.
    ///
    /// # Errors
    ///
    /// Returns a format error if the field is all zeros or has bytes after
    /// the first NUL.
    pub fn from_padded(raw: &[u8; IDENTIFIER_SIZE]) -> CoreResult<Self> {
        let len = raw.iter().position(|&b| b == 0).unwrap_or(IDENTIFIER_SIZE);
        if len == 0 {
            return Err(CoreError::format("empty chunk identifier in index"));
        }
        if raw[len..].iter().any(|&b| b != 0) {
            return Err(CoreError::format("chunk identifier has trailing garbage"));
        }
        Ok(Self {
            bytes: *raw,
            len: len as u8,
        })
    }

    /// Returns the identifier bytes without padding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// Returns the zero-padded on-disk form.
    #[must_use]
    pub fn padded(&self) -> &[u8; IDENTIFIER_SIZE] {
        &self.bytes
    }

    /// Returns the identifier length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// Always false; identifiers hold at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the identifier as text, replacing invalid UTF-8.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl TryFrom<&str> for ChunkId {
    type Error = CoreError;

    fn try_from(value: &str) -> CoreResult<Self> {
        Self::new(value.as_bytes())
    }
}

impl TryFrom<&[u8]> for ChunkId {
    type Error = CoreError;

    fn try_from(value: &[u8]) -> CoreResult<Self> {
        Self::new(value)
    }
}

impl AsRef<[u8]> for ChunkId {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}
