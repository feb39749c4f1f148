//! Stream trait definition.

use crate::error::{StreamError, StreamResult};

/// A seekable byte transport.
///
/// Streams are **opaque byte stores** addressed by absolute position. The
/// container engine drives every read, write and seek; a stream never
/// interprets what it carries.
///
/// # Invariants
///
/// - `read` never returns more bytes than requested and returns 0 only at
///   end of stream
/// - `write` returns the number of bytes accepted
/// - `tell` reports the position the next `read`/`write` will use
/// - after a successful `close`, every other operation fails with
///   [`StreamError::Closed`]
///
/// # Implementors
///
/// - [`crate::MemoryStream`] - For tests and in-memory containers
/// - [`crate::FileStream`] - For persistent containers
/// - [`crate::UserStream`] - For embedder-supplied transports
pub trait Stream: Send {
    /// Reads up to `buf.len()` bytes at the current position.
    ///
    /// Returns the number of bytes read, which may be short near the end of
    /// the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not readable or the transport fails.
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize>;

    /// Writes bytes at the current position and advances it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not writable or the transport fails.
    fn write(&mut self, buf: &[u8]) -> StreamResult<usize>;

    /// Moves the cursor to an absolute position.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the position.
    fn seek(&mut self, position: u64) -> StreamResult<()>;

    /// Returns the current cursor position.
    ///
    /// # Errors
    ///
    /// Returns an error if the position cannot be determined.
    fn tell(&mut self) -> StreamResult<u64>;

    /// Returns the total length of the stream in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&mut self) -> StreamResult<u64>;

    /// Closes the stream and releases the transport.
    ///
    /// Closing an already closed stream is a no-op. When close fails the
    /// stream stays open and close may be called again.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::CloseFailed`] or an I/O error.
    fn close(&mut self) -> StreamResult<()>;

    /// Shortens the stream to `new_size` bytes.
    ///
    /// The cursor is left where it was.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Unsupported`] if the transport cannot shrink,
    /// and an invalid argument error if `new_size` exceeds the current size.
    fn truncate(&mut self, new_size: u64) -> StreamResult<()> {
        let _ = new_size;
        Err(StreamError::Unsupported("truncate"))
    }

    /// Returns true if [`Stream::truncate`] is implemented.
    fn can_truncate(&self) -> bool {
        false
    }

    /// Returns true if the stream supports reading.
    fn can_read(&self) -> bool {
        true
    }

    /// Returns true if the stream supports writing.
    fn can_write(&self) -> bool {
        true
    }

    /// Reads exactly `buf.len()` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::UnexpectedEof`] if the stream ends first.
    fn read_exact(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(StreamError::UnexpectedEof {
                    requested: buf.len(),
                    read: filled,
                });
            }
            filled += n;
        }
        Ok(())
    }

    /// Writes the whole buffer.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::WriteZero`] if the stream stops accepting bytes.
    fn write_all(&mut self, buf: &[u8]) -> StreamResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..])?;
            if n == 0 {
                return Err(StreamError::WriteZero {
                    requested: buf.len(),
                    written,
                });
            }
            written += n;
        }
        Ok(())
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        (**self).write(buf)
    }

    fn seek(&mut self, position: u64) -> StreamResult<()> {
        (**self).seek(position)
    }

    fn tell(&mut self) -> StreamResult<u64> {
        (**self).tell()
    }

    fn size(&mut self) -> StreamResult<u64> {
        (**self).size()
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }

    fn truncate(&mut self, new_size: u64) -> StreamResult<()> {
        (**self).truncate(new_size)
    }

    fn can_truncate(&self) -> bool {
        (**self).can_truncate()
    }

    fn can_read(&self) -> bool {
        (**self).can_read()
    }

    fn can_write(&self) -> bool {
        (**self).can_write()
    }
}

impl<S: Stream + ?Sized> Stream for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        (**self).write(buf)
    }

    fn seek(&mut self, position: u64) -> StreamResult<()> {
        (**self).seek(position)
    }

    fn tell(&mut self) -> StreamResult<u64> {
        (**self).tell()
    }

    fn size(&mut self) -> StreamResult<u64> {
        (**self).size()
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }

    fn truncate(&mut self, new_size: u64) -> StreamResult<()> {
        (**self).truncate(new_size)
    }

    fn can_truncate(&self) -> bool {
        (**self).can_truncate()
    }

    fn can_read(&self) -> bool {
        (**self).can_read()
    }

    fn can_write(&self) -> bool {
        (**self).can_write()
    }
}
