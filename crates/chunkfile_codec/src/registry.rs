//! Lookup from codec tag to codec implementation.

use crate::codec::{Codec, PassThrough, ZstdCodec};
use crate::error::{CodecError, CodecResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A set of codecs keyed by their tag.
///
/// The default registry contains [`PassThrough`] and [`ZstdCodec`]. Readers
/// and writers consult the registry for every chunk, so a container may mix
/// codecs freely.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: BTreeMap<u32, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Creates a registry with no codecs, not even passthrough.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            codecs: BTreeMap::new(),
        }
    }

    /// Registers a codec, replacing any codec with the same tag.
    pub fn register(&mut self, codec: impl Codec + 'static) {
        self.codecs.insert(codec.id(), Arc::new(codec));
    }

    /// Registers a codec and returns the registry.
    #[must_use]
    pub fn with(mut self, codec: impl Codec + 'static) -> Self {
        self.register(codec);
        self
    }

    /// Returns the codec for a tag.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnknownCodec`] if no codec is registered for `tag`.
    pub fn get(&self, tag: u32) -> CodecResult<&dyn Codec> {
        self.codecs
            .get(&tag)
            .map(|codec| codec.as_ref())
            .ok_or(CodecError::UnknownCodec { tag })
    }

    /// Returns true if a codec is registered for `tag`.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.codecs.contains_key(&tag)
    }

    /// Returns the registered tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = u32> + '_ {
        self.codecs.keys().copied()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::empty().with(PassThrough).with(ZstdCodec::default())
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.codecs.iter().map(|(tag, codec)| (tag, codec.name())))
            .finish()
    }
}
