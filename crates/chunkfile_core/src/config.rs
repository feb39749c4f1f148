//! Writer configuration.

use chunkfile_codec::{Compression, DEFAULT_ZSTD_LEVEL};

/// How a writer treats existing stream content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Start a new container at offset 0; existing content is ignored.
    #[default]
    Create,
    /// Keep the chunks of the container already in the stream and add to it.
    Append,
}

/// Configuration for a [`crate::ChunkFileWriter`].
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Create or append.
    pub mode: WriteMode,

    /// Codec used by [`crate::ChunkFileWriter::write_chunk`].
    pub compression: Compression,

    /// Level passed to the zstd codec when the writer builds its own registry.
    pub compression_level: i32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            mode: WriteMode::Create,
            compression: Compression::None,
            compression_level: DEFAULT_ZSTD_LEVEL,
        }
    }
}

impl WriterConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the write mode.
    #[must_use]
    pub const fn mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the default codec.
    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the zstd compression level.
    #[must_use]
    pub const fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = WriterConfig::default();
        assert_eq!(config.mode, WriteMode::Create);
        assert_eq!(config.compression, Compression::None);
        assert_eq!(config.compression_level, DEFAULT_ZSTD_LEVEL);
    }

    #[test]
    fn builder_pattern() {
        let config = WriterConfig::new()
            .mode(WriteMode::Append)
            .compression(Compression::Zstd)
            .compression_level(19);

        assert_eq!(config.mode, WriteMode::Append);
        assert_eq!(config.compression, Compression::Zstd);
        assert_eq!(config.compression_level, 19);
    }
}
