//! Stream backend that delegates to caller-supplied callbacks.

use crate::error::{StreamError, StreamResult};
use crate::stream::Stream;
use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};

/// Read callback: fills the buffer and returns the number of bytes read.
pub type ReadFn = Box<dyn FnMut(&mut [u8]) -> io::Result<usize> + Send>;
/// Write callback: consumes the buffer and returns the number of bytes written.
pub type WriteFn = Box<dyn FnMut(&[u8]) -> io::Result<usize> + Send>;
/// Seek callback: moves to an absolute position.
pub type SeekFn = Box<dyn FnMut(u64) -> io::Result<()> + Send>;
/// Tell callback: reports the current position.
pub type TellFn = Box<dyn FnMut() -> io::Result<u64> + Send>;
/// Size callback: reports the total length.
pub type SizeFn = Box<dyn FnMut() -> io::Result<u64> + Send>;
/// Close callback: releases the embedder's transport.
pub type CloseFn = Box<dyn FnMut() -> io::Result<()> + Send>;

/// The set of callbacks an embedder supplies for a [`UserStream`].
///
/// Any context the callbacks need is captured by the closures themselves.
///
/// - `read` and `write` are individually optional, but at least one is required
/// - `seek`, `tell` and `size` are mandatory
/// - `close` is optional and defaults to a no-op
#[derive(Default)]
pub struct UserStreamCallbacks {
    /// Read callback.
    pub read: Option<ReadFn>,
    /// Write callback.
    pub write: Option<WriteFn>,
    /// Seek callback.
    pub seek: Option<SeekFn>,
    /// Tell callback.
    pub tell: Option<TellFn>,
    /// Size callback.
    pub size: Option<SizeFn>,
    /// Close callback.
    pub close: Option<CloseFn>,
}

impl UserStreamCallbacks {
    /// Creates an empty callback set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read callback.
    #[must_use]
    pub fn with_read(
        mut self,
        f: impl FnMut(&mut [u8]) -> io::Result<usize> + Send + 'static,
    ) -> Self {
        self.read = Some(Box::new(f));
        self
    }

    /// Sets the write callback.
    #[must_use]
    pub fn with_write(mut self, f: impl FnMut(&[u8]) -> io::Result<usize> + Send + 'static) -> Self {
        self.write = Some(Box::new(f));
        self
    }

    /// Sets the seek callback.
    #[must_use]
    pub fn with_seek(mut self, f: impl FnMut(u64) -> io::Result<()> + Send + 'static) -> Self {
        self.seek = Some(Box::new(f));
        self
    }

    /// Sets the tell callback.
    #[must_use]
    pub fn with_tell(mut self, f: impl FnMut() -> io::Result<u64> + Send + 'static) -> Self {
        self.tell = Some(Box::new(f));
        self
    }

    /// Sets the size callback.
    #[must_use]
    pub fn with_size(mut self, f: impl FnMut() -> io::Result<u64> + Send + 'static) -> Self {
        self.size = Some(Box::new(f));
        self
    }

    /// Sets the close callback.
    #[must_use]
    pub fn with_close(mut self, f: impl FnMut() -> io::Result<()> + Send + 'static) -> Self {
        self.close = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for UserStreamCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserStreamCallbacks")
            .field("read", &self.read.is_some())
            .field("write", &self.write.is_some())
            .field("seek", &self.seek.is_some())
            .field("tell", &self.tell.is_some())
            .field("size", &self.size.is_some())
            .field("close", &self.close.is_some())
            .finish()
    }
}

/// A stream whose operations are implemented by the embedder.
///
/// Callback validation happens once, in [`UserStream::new`]; a constructed
/// stream always has seek, tell, size and at least one of read/write.
///
/// # Close semantics
///
/// If the close callback returns an error or panics, the failure is reported
/// as [`StreamError::CloseFailed`] and the stream stays open. Calling
/// [`Stream::close`] again retries the callback; once it succeeds the
/// callbacks (and any context they captured) are dropped.
///
/// # Example
///
/// ```rust
/// use chunkfile_stream::{Stream, UserStream, UserStreamCallbacks};
///
/// let callbacks = UserStreamCallbacks::new()
///     .with_write(|buf| Ok(buf.len()))
///     .with_seek(|_| Ok(()))
///     .with_tell(|| Ok(0))
///     .with_size(|| Ok(0));
///
/// let mut stream = UserStream::new(callbacks).unwrap();
/// assert!(!stream.can_read());
/// assert_eq!(stream.write(b"abc").unwrap(), 3);
/// ```
#[derive(Debug)]
pub struct UserStream {
    callbacks: UserStreamCallbacks,
    closed: bool,
}

impl UserStream {
    /// Creates a user stream from a callback set.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidArgument`] if both read and write are
    /// missing, or if seek, tell or size is missing.
    pub fn new(callbacks: UserStreamCallbacks) -> StreamResult<Self> {
        if callbacks.read.is_none() && callbacks.write.is_none() {
            return Err(StreamError::invalid_argument(
                "user stream requires a read or a write callback",
            ));
        }
        if callbacks.seek.is_none() {
            return Err(StreamError::invalid_argument("user stream requires a seek callback"));
        }
        if callbacks.tell.is_none() {
            return Err(StreamError::invalid_argument("user stream requires a tell callback"));
        }
        if callbacks.size.is_none() {
            return Err(StreamError::invalid_argument("user stream requires a size callback"));
        }

        Ok(Self {
            callbacks,
            closed: false,
        })
    }

    /// Returns true if the stream has been closed successfully.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn callbacks(&mut self) -> StreamResult<&mut UserStreamCallbacks> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        Ok(&mut self.callbacks)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Stream for UserStream {
    fn read(&mut self, buf: &mut [u8]) -> StreamResult<usize> {
        let read = self
            .callbacks()?
            .read
            .as_mut()
            .ok_or(StreamError::NotReadable)?;
        Ok(read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> StreamResult<usize> {
        let write = self
            .callbacks()?
            .write
            .as_mut()
            .ok_or(StreamError::NotWritable)?;
        Ok(write(buf)?)
    }

    fn seek(&mut self, position: u64) -> StreamResult<()> {
        let seek = self
            .callbacks()?
            .seek
            .as_mut()
            .ok_or_else(|| StreamError::invalid_argument("missing seek callback"))?;
        Ok(seek(position)?)
    }

    fn tell(&mut self) -> StreamResult<u64> {
        let tell = self
            .callbacks()?
            .tell
            .as_mut()
            .ok_or_else(|| StreamError::invalid_argument("missing tell callback"))?;
        Ok(tell()?)
    }

    fn size(&mut self) -> StreamResult<u64> {
        let size = self
            .callbacks()?
            .size
            .as_mut()
            .ok_or_else(|| StreamError::invalid_argument("missing size callback"))?;
        Ok(size()?)
    }

    fn close(&mut self) -> StreamResult<()> {
        if self.closed {
            return Ok(());
        }

        if let Some(close) = self.callbacks.close.as_mut() {
            match panic::catch_unwind(AssertUnwindSafe(|| close())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "user stream close failed");
                    return Err(StreamError::close_failed(e.to_string()));
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::warn!(%message, "user stream close panicked");
                    return Err(StreamError::close_failed(format!(
                        "close callback panicked: {message}"
                    )));
                }
            }
        }

        self.callbacks = UserStreamCallbacks::default();
        self.closed = true;
        Ok(())
    }

    fn can_read(&self) -> bool {
        self.callbacks.read.is_some()
    }

    fn can_write(&self) -> bool {
        self.callbacks.write.is_some()
    }
}
