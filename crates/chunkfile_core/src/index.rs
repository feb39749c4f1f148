//! In-memory index of chunk descriptors.

use crate::descriptor::ChunkDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::identifier::ChunkId;
use std::collections::HashMap;

/// The ordered set of descriptors in a container.
///
/// Descriptors are kept in write order. Two lookup maps are derived from
/// that sequence and never updated independently of it:
/// - `(id, index) -> position` for direct lookup
/// - `id -> positions` in insertion order for per-identifier enumeration
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    entries: Vec<ChunkDescriptor>,
    by_key: HashMap<(ChunkId, u32), usize>,
    by_id: HashMap<ChunkId, Vec<usize>>,
}

impl ChunkIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from descriptors in stored order.
    ///
    /// # Errors
    ///
    /// Returns a format error if two descriptors share an `(id, index)` pair.
    pub fn from_descriptors(descriptors: Vec<ChunkDescriptor>) -> CoreResult<Self> {
        let mut index = Self {
            entries: Vec::with_capacity(descriptors.len()),
            ..Self::default()
        };
        for descriptor in descriptors {
            if index.contains_at(&descriptor.id, descriptor.index) {
                return Err(CoreError::format(format!(
                    "duplicate index entry for {}[{}]",
                    descriptor.id, descriptor.index
                )));
            }
            index.insert(descriptor);
        }
        Ok(index)
    }

    /// Appends a descriptor.
    ///
    /// # Errors
    ///
    /// Returns a usage error if the `(id, index)` pair is already present.
    pub fn push(&mut self, descriptor: ChunkDescriptor) -> CoreResult<()> {
        if self.contains_at(&descriptor.id, descriptor.index) {
            return Err(CoreError::usage(format!(
                "chunk {}[{}] already exists",
                descriptor.id, descriptor.index
            )));
        }
        self.insert(descriptor);
        Ok(())
    }

    fn insert(&mut self, descriptor: ChunkDescriptor) {
        let position = self.entries.len();
        self.by_key.insert((descriptor.id, descriptor.index), position);
        self.by_id.entry(descriptor.id).or_default().push(position);
        self.entries.push(descriptor);
    }

    /// Returns the descriptor for an exact `(id, index)` pair.
    #[must_use]
    pub fn get(&self, id: &ChunkId, index: u32) -> Option<&ChunkDescriptor> {
        self.by_key
            .get(&(*id, index))
            .map(|&position| &self.entries[position])
    }

    /// Returns the first descriptor inserted for `id`.
    ///
    /// This is insertion order, not disambiguation index 0. Containers whose
    /// first entry for an identifier is not index 0 answer identifier-only
    /// queries from that first entry; readers rely on this.
    #[must_use]
    pub fn first(&self, id: &ChunkId) -> Option<&ChunkDescriptor> {
        self.by_id
            .get(id)
            .and_then(|positions| positions.first())
            .map(|&position| &self.entries[position])
    }

    /// Returns true if any descriptor has this identifier.
    #[must_use]
    pub fn contains(&self, id: &ChunkId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Returns true if the exact `(id, index)` pair exists.
    #[must_use]
    pub fn contains_at(&self, id: &ChunkId, index: u32) -> bool {
        self.by_key.contains_key(&(*id, index))
    }

    /// Returns the number of descriptors sharing `id`.
    #[must_use]
    pub fn count(&self, id: &ChunkId) -> usize {
        self.by_id.get(id).map_or(0, Vec::len)
    }

    /// Returns the index the next chunk written under `id` receives.
    ///
    /// This is one past the largest index present, so numbering continues
    /// across append sessions without reuse.
    #[must_use]
    pub fn next_index(&self, id: &ChunkId) -> u32 {
        self.by_id
            .get(id)
            .and_then(|positions| {
                positions
                    .iter()
                    .map(|&position| self.entries[position].index)
                    .max()
            })
            .map_or(0, |max| max.saturating_add(1))
    }

    /// Iterates over the descriptors sharing `id`, in insertion order.
    pub fn for_id<'a>(&'a self, id: &ChunkId) -> impl Iterator<Item = &'a ChunkDescriptor> + 'a {
        self.by_id
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&position| &self.entries[position])
    }

    /// Returns the descriptor at a position in write order.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&ChunkDescriptor> {
        self.entries.get(position)
    }

    /// Iterates over all descriptors in write order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChunkDescriptor> {
        self.entries.iter()
    }

    /// Returns all descriptors in write order.
    #[must_use]
    pub fn descriptors(&self) -> &[ChunkDescriptor] {
        &self.entries
    }

    /// Returns the total number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChunkIndex {
    type Item = &'a ChunkDescriptor;
    type IntoIter = std::slice::Iter<'a, ChunkDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
