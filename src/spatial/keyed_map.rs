//! Chunk-scoped key/value map
//!
//! Used for build bookkeeping that is naturally grouped by chunk, such as
//! which vertices merge into which, or which triangles touch a corner.
//! Misses are `None`, never errors. Chunks whose map becomes empty are
//! pruned together with their column entry.

use std::collections::HashMap;
use std::hash::Hash;

use crate::core::types::Vec3;

use super::column::ColumnIndex;
use super::coord::{ChunkCoord, ColumnCoord};

#[derive(Debug, Clone)]
pub struct ChunkKeyedMap<K, V> {
    chunk_size: f32,
    chunks: HashMap<ChunkCoord, HashMap<K, V>>,
    columns: ColumnIndex,
}

impl<K: Eq + Hash, V> ChunkKeyedMap<K, V> {
    pub fn new(chunk_size: f32) -> Self {
        Self {
            chunk_size,
            chunks: HashMap::new(),
            columns: ColumnIndex::new(),
        }
    }

    /// Insert under an explicit chunk, returning any previous value
    pub fn insert(&mut self, chunk: ChunkCoord, key: K, value: V) -> Option<V> {
        self.chunk_entry(chunk).insert(key, value)
    }

    /// Insert under the chunk containing `pos`
    pub fn insert_at(&mut self, pos: Vec3, key: K, value: V) -> ChunkCoord {
        let chunk = ChunkCoord::from_world_pos(pos, self.chunk_size);
        self.insert(chunk, key, value);
        chunk
    }

    pub fn get(&self, chunk: ChunkCoord, key: &K) -> Option<&V> {
        self.chunks.get(&chunk)?.get(key)
    }

    pub fn get_mut(&mut self, chunk: ChunkCoord, key: &K) -> Option<&mut V> {
        self.chunks.get_mut(&chunk)?.get_mut(key)
    }

    pub fn get_or_insert_with(&mut self, chunk: ChunkCoord, key: K, default: impl FnOnce() -> V) -> &mut V {
        self.chunk_entry(chunk).entry(key).or_insert_with(default)
    }

    pub fn contains_key(&self, chunk: ChunkCoord, key: &K) -> bool {
        self.get(chunk, key).is_some()
    }

    /// Remove and return a value, pruning the chunk if it empties
    pub fn remove(&mut self, chunk: ChunkCoord, key: &K) -> Option<V> {
        let map = self.chunks.get_mut(&chunk)?;
        let value = map.remove(key);
        if map.is_empty() {
            self.chunks.remove(&chunk);
            self.columns.remove(chunk);
        }
        value
    }

    pub fn remove_chunk(&mut self, chunk: ChunkCoord) -> Option<HashMap<K, V>> {
        let removed = self.chunks.remove(&chunk);
        if removed.is_some() {
            self.columns.remove(chunk);
        }
        removed
    }

    pub fn contains_chunk(&self, chunk: ChunkCoord) -> bool {
        self.chunks.contains_key(&chunk)
    }

    pub fn keys_in_chunk(&self, chunk: ChunkCoord) -> impl Iterator<Item = &K> {
        self.chunks.get(&chunk).into_iter().flat_map(|map| map.keys())
    }

    pub fn chunk_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn chunks_in_column(&self, column: ColumnCoord) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.columns.chunks(column)
    }

    /// Total entries across all chunks
    pub fn len(&self) -> usize {
        self.chunks.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn chunk_entry(&mut self, chunk: ChunkCoord) -> &mut HashMap<K, V> {
        let columns = &mut self.columns;
        self.chunks.entry(chunk).or_insert_with(|| {
            columns.insert(chunk);
            HashMap::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut map = ChunkKeyedMap::new(10.0);
        let chunk = ChunkCoord::new(0, 0, 0);
        assert_eq!(map.insert(chunk, 1u32, "a"), None);
        assert_eq!(map.insert(chunk, 1u32, "b"), Some("a"));
        assert_eq!(map.get(chunk, &1), Some(&"b"));
        assert!(map.contains_key(chunk, &1));
        assert_eq!(map.get(ChunkCoord::new(1, 0, 0), &1), None);
        assert_eq!(map.remove(chunk, &1), Some("b"));
        assert!(!map.contains_chunk(chunk));
        assert!(map.is_empty());
    }

    #[test]
    fn test_insert_at_uses_world_position() {
        let mut map = ChunkKeyedMap::new(10.0);
        let chunk = map.insert_at(Vec3::new(-3.0, 12.0, 5.0), 'k', 1);
        assert_eq!(chunk, ChunkCoord::new(-1, 1, 0));
        assert_eq!(map.get(chunk, &'k'), Some(&1));
    }

    #[test]
    fn test_get_or_insert_with_accumulates() {
        let mut map: ChunkKeyedMap<u8, Vec<u8>> = ChunkKeyedMap::new(4.0);
        let chunk = ChunkCoord::new(2, 0, 2);
        map.get_or_insert_with(chunk, 0, Vec::new).push(1);
        map.get_or_insert_with(chunk, 0, Vec::new).push(2);
        assert_eq!(map.get(chunk, &0), Some(&vec![1, 2]));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_column_grouping_and_pruning() {
        let mut map = ChunkKeyedMap::new(10.0);
        map.insert(ChunkCoord::new(1, 0, 1), 0, ());
        map.insert(ChunkCoord::new(1, 3, 1), 0, ());
        map.insert(ChunkCoord::new(1, 3, 1), 1, ());

        let column = ColumnCoord::new(1, 1);
        assert_eq!(map.chunks_in_column(column).count(), 2);

        map.remove(ChunkCoord::new(1, 0, 1), &0);
        let left: Vec<_> = map.chunks_in_column(column).collect();
        assert_eq!(left, vec![ChunkCoord::new(1, 3, 1)]);

        let mut keys: Vec<_> = map.keys_in_chunk(ChunkCoord::new(1, 3, 1)).copied().collect();
        keys.sort();
        assert_eq!(keys, vec![0, 1]);

        assert!(map.remove_chunk(ChunkCoord::new(1, 3, 1)).is_some());
        assert_eq!(map.chunks_in_column(column).count(), 0);
    }
}
