//! Cursor over the chunks of an open container.

use crate::descriptor::ChunkDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::identifier::ChunkId;
use crate::reader::ChunkFileReader;

/// A cursor that walks every chunk of a reader in write order.
///
/// The cursor is either positioned on a chunk or at the end. Advancing past
/// the last chunk moves it to the end, where further advances do nothing.
/// Accessors report not-found at the end instead of panicking.
///
/// The cursor also implements [`Iterator`], yielding descriptors.
#[derive(Debug)]
pub struct ChunkIterator<'r, 'a> {
    reader: &'r ChunkFileReader<'a>,
    position: usize,
}

impl<'r, 'a> ChunkIterator<'r, 'a> {
    pub(crate) fn new(reader: &'r ChunkFileReader<'a>) -> Self {
        Self {
            reader,
            position: 0,
        }
    }

    /// Returns true if the cursor has moved past the last chunk.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.reader.len()
    }

    /// Moves to the next chunk. Does nothing at the end.
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    /// Moves back to the first chunk.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Returns the zero-based position of the cursor.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the descriptor of the current chunk.
    ///
    /// # Errors
    ///
    /// Returns not-found when the cursor is at the end.
    pub fn descriptor(&self) -> CoreResult<&'r ChunkDescriptor> {
        self.reader
            .index()
            .at(self.position)
            .ok_or_else(|| CoreError::not_found("<end of container>", None))
    }

    /// Returns the identifier of the current chunk.
    ///
    /// # Errors
    ///
    /// Returns not-found when the cursor is at the end.
    pub fn chunk_id(&self) -> CoreResult<ChunkId> {
        Ok(self.descriptor()?.id)
    }

    /// Returns the disambiguation index of the current chunk.
    ///
    /// # Errors
    ///
    /// Returns not-found when the cursor is at the end.
    pub fn chunk_index(&self) -> CoreResult<u32> {
        Ok(self.descriptor()?.index)
    }

    /// Reads the header of the current chunk.
    ///
    /// # Errors
    ///
    /// Returns not-found at the end and stream errors from the transport.
    pub fn read_header(&self) -> CoreResult<Vec<u8>> {
        self.reader.read_header_of(self.descriptor()?)
    }

    /// Reads and decompresses the data of the current chunk.
    ///
    /// # Errors
    ///
    /// Returns not-found at the end, format errors from decompression and
    /// stream errors from the transport.
    pub fn read_data(&self) -> CoreResult<Vec<u8>> {
        self.reader.read_data_of(self.descriptor()?)
    }
}

impl<'r> Iterator for ChunkIterator<'r, '_> {
    type Item = &'r ChunkDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let descriptor = self.reader.index().at(self.position)?;
        self.position += 1;
        Some(descriptor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.reader.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkIterator<'_, '_> {}
