//! In-memory stream backend.

use crate::error::{StreamError, StreamResult};
use crate::stream::Stream;

/// An in-memory stream backed by a growable byte buffer.
///
/// This backend is suitable for:
/// - Unit and integration tests
/// - Building containers that are shipped elsewhere as a byte blob
/// - Reading containers that are already loaded into memory
///
/// Writes past the current length grow the buffer; seeking past the end and
/// writing zero-fills the gap. Reads are clipped to the available bytes.
///
/// # Example
///
/// ```rust
/// use chunkfile_stream::{MemoryStream, Stream};
///
/// let mut stream = MemoryStream::new();
/// stream.write_all(b"test data").unwrap();
/// assert_eq!(stream.tell().unwrap(), 9);
/// assert_eq!(stream.size().unwrap(), 9);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryStream {
    data: Vec<u8>,
    position: u64,
    read_only: bool,
    closed: bool,
}

impl MemoryStream {
    /// Creates a new empty, writable memory stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writable memory stream with pre-existing content.
    ///
    /// The cursor starts at offset 0.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Creates a read-only memory stream over a copy of `data`.
    ///
    /// Writes to the returned stream fail with [`StreamError::NotWritable`].
    #[must_use]
    pub fn read_only(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            read_only: true,
            ..Self::default()
        }
    }

    /// Returns the current buffer contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the stream and returns the buffer.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Returns true if the stream has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        Ok(())
    }
}

impl Stream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        self.ensure_open()?;

        let len = self.data.len() as u64;
        if self.position >= len {
            return Ok(0);
        }

        let start = self.position as usize;
        let count = buf.len().min(self.data.len() - start);
        buf[..count].copy_from_slice(&self.data[start..start + count]);
        self.position += count as u64;
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        self.ensure_open()?;
        if self.read_only {
            return Err(StreamError::NotWritable);
        }

        let start = usize::try_from(self.position)
            .map_err(|_| StreamError::invalid_argument("position exceeds address space"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| StreamError::invalid_argument("write exceeds address space"))?;

        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn seek(&mut self, position: u64) -> StreamResult<()> {
        self.ensure_open()?;
        self.position = position;
        Ok(())
    }

    fn tell(&mut self) -> StreamResult<u64> {
        self.ensure_open()?;
        Ok(self.position)
    }

    fn size(&mut self) -> StreamResult<u64> {
        self.ensure_open()?;
        Ok(self.data.len() as u64)
    }

    fn close(&mut self) -> StreamResult<()> {
        // Buffer stays readable through `data()` after close
        self.closed = true;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StreamResult<()> {
        self.ensure_open()?;
        if self.read_only {
            return Err(StreamError::NotWritable);
        }

        let current = self.data.len() as u64;
        if new_size > current {
            return Err(StreamError::invalid_argument(format!(
                "cannot truncate to {new_size} bytes, stream holds {current}"
            )));
        }
        self.data.truncate(new_size as usize);
        Ok(())
    }

    fn can_truncate(&self) -> bool {
        !self.read_only
    }

    fn can_write(&self) -> bool {
        !self.read_only
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn memory_new_is_empty() {
        let mut stream = MemoryStream::new();
        assert_eq!(stream.size().unwrap(), 0);
        assert_eq!(stream.tell().unwrap(), 0);
        assert!(stream.data().is_empty());
    }

    #[test]
    fn memory_basic_read_write() {
        let mut stream = MemoryStream::new();

        stream.write_all(b"test\0").unwrap();
        assert_eq!(stream.tell().unwrap(), 5);
        stream.seek(0).unwrap();

        let mut out = [0u8; 5];
        stream.read_exact(&mut out).unwrap();
        assert_eq!(&out, b"test\0");
    }

    #[test]
    fn memory_read_is_clipped() {
        let mut stream = MemoryStream::with_data(b"abc".to_vec());
        stream.seek(1).unwrap();

        let mut out = [0u8; 10];
        assert_eq!(stream.read(&mut out).unwrap(), 2);
        assert_eq!(&out[..2], b"bc");
        assert_eq!(stream.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn memory_read_exact_past_end_fails() {
        let mut stream = MemoryStream::with_data(b"hello".to_vec());
        stream.seek(3).unwrap();

        let mut out = [0u8; 4];
        let result = stream.read_exact(&mut out);
        assert!(matches!(
            result,
            Err(StreamError::UnexpectedEof {
                requested: 4,
                read: 2
            })
        ));
    }

    #[test]
    fn memory_overwrite_in_place() {
        let mut stream = MemoryStream::new();
        stream.write_all(b"hello world").unwrap();
        stream.seek(0).unwrap();
        stream.write_all(b"HELLO").unwrap();

        assert_eq!(stream.data(), b"HELLO world");
        assert_eq!(stream.size().unwrap(), 11);
    }

    #[test]
    fn memory_write_past_end_zero_fills() {
        let mut stream = MemoryStream::new();
        stream.seek(4).unwrap();
        stream.write_all(b"x").unwrap();

        assert_eq!(stream.data(), &[0, 0, 0, 0, b'x']);
    }

    #[test]
    fn memory_read_only_rejects_writes() {
        let mut stream = MemoryStream::read_only(b"fixed".to_vec());
        assert!(!stream.can_write());
        assert!(matches!(stream.write(b"x"), Err(StreamError::NotWritable)));
        assert_eq!(stream.data(), b"fixed");
    }

    #[test]
    fn memory_closed_rejects_operations() {
        let mut stream = MemoryStream::with_data(b"data".to_vec());
        stream.close().unwrap();

        assert!(stream.is_closed());
        assert!(matches!(stream.tell(), Err(StreamError::Closed)));
        assert!(matches!(stream.write(b"x"), Err(StreamError::Closed)));
        // Data survives the close
        assert_eq!(stream.data(), b"data");
        // Second close is harmless
        assert!(stream.close().is_ok());
    }

    #[test]
    fn memory_empty_write() {
        let mut stream = MemoryStream::new();
        assert_eq!(stream.write(b"").unwrap(), 0);
        assert!(stream.write_all(b"").is_ok());
        assert_eq!(stream.size().unwrap(), 0);
    }

    #[test]
    fn memory_truncate_shrinks_and_keeps_cursor() {
        let mut stream = MemoryStream::with_data(b"hello world".to_vec());
        stream.seek(8).unwrap();
        assert!(stream.can_truncate());

        stream.truncate(5).unwrap();
        assert_eq!(stream.data(), b"hello");
        assert_eq!(stream.tell().unwrap(), 8);

        assert!(stream.truncate(6).unwrap_err().is_invalid_argument());

        let mut fixed = MemoryStream::read_only(b"fixed".to_vec());
        assert!(!fixed.can_truncate());
        assert!(matches!(fixed.truncate(1), Err(StreamError::NotWritable)));
    }

    proptest! {
        #[test]
        fn memory_matches_vec_model(
            writes in prop::collection::vec(
                (0u64..256, prop::collection::vec(any::<u8>(), 1..64)),
                0..16,
            )
        ) {
            let mut stream = MemoryStream::new();
            let mut model: Vec<u8> = Vec::new();

            for (offset, bytes) in &writes {
                stream.seek(*offset).unwrap();
                stream.write_all(bytes).unwrap();

                let start = *offset as usize;
                let end = start + bytes.len();
                if model.len() < end {
                    model.resize(end, 0);
                }
                model[start..end].copy_from_slice(bytes);
            }

            prop_assert_eq!(stream.data(), &model[..]);
            prop_assert_eq!(stream.size().unwrap(), model.len() as u64);

            stream.seek(0).unwrap();
            let mut read_back = vec![0u8; model.len()];
            stream.read_exact(&mut read_back).unwrap();
            prop_assert_eq!(read_back, model);
        }
    }
}
