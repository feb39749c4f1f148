//! Owned or borrowed access to a stream.

use crate::stream::Stream;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A stream reference that records who is responsible for closing it.
///
/// Readers and writers built from a caller's stream hold a
/// [`StreamHandle::Borrowed`] and never close it. Path-based constructors
/// create the stream themselves and hold a [`StreamHandle::Owned`], which
/// they close when they are done.
pub enum StreamHandle<'a> {
    /// A stream created internally; closed by the holder.
    Owned(Box<dyn Stream + 'a>),
    /// A stream supplied by the caller; the caller closes it.
    Borrowed(&'a mut dyn Stream),
}

impl<'a> StreamHandle<'a> {
    /// Wraps a stream the holder will own.
    pub fn owned(stream: impl Stream + 'a) -> Self {
        Self::Owned(Box::new(stream))
    }

    /// Returns true if the holder owns the stream.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}

impl<'a> From<&'a mut dyn Stream> for StreamHandle<'a> {
    fn from(stream: &'a mut dyn Stream) -> Self {
        Self::Borrowed(stream)
    }
}

impl<'a> From<Box<dyn Stream + 'a>> for StreamHandle<'a> {
    fn from(stream: Box<dyn Stream + 'a>) -> Self {
        Self::Owned(stream)
    }
}

impl<'a> Deref for StreamHandle<'a> {
    type Target = dyn Stream + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(stream) => stream.as_ref(),
            Self::Borrowed(stream) => &**stream,
        }
    }
}

impl<'a> DerefMut for StreamHandle<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Owned(stream) => stream.as_mut(),
            Self::Borrowed(stream) => &mut **stream,
        }
    }
}

impl fmt::Debug for StreamHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owned(_) => f.write_str("StreamHandle::Owned"),
            Self::Borrowed(_) => f.write_str("StreamHandle::Borrowed"),
        }
    }
}
