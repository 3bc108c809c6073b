//! Sparse chunked container with fixed octree-style leaves per chunk
//!
//! Values are addressed by [`Locator`]. Inside a chunk, a value is routed to a
//! leaf by `depth` rounds of halving: at each round the in-chunk offset is
//! compared against half of the remaining cell width on every axis. The
//! resulting integer cell `(x, y, z)` is flattened as `x*dim² + y*dim + z`.

use std::collections::HashMap;

use crate::core::error::Error;
use crate::core::types::{IVec3, Result, Vec3};

use super::column::ColumnIndex;
use super::coord::{ChunkCoord, ColumnCoord};
use super::locator::{LeafSlot, Locator};

/// One chunk: `dimension³` leaf lists
#[derive(Debug, Clone)]
pub struct Chunk<T> {
    leaves: Vec<Vec<T>>,
}

impl<T> Chunk<T> {
    fn with_leaves(leaf_count: usize) -> Self {
        Self {
            leaves: (0..leaf_count).map(|_| Vec::new()).collect(),
        }
    }

    /// Values in a leaf; out-of-range leaves are empty
    pub fn leaf(&self, leaf: usize) -> &[T] {
        self.leaves.get(leaf).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Total number of values across all leaves
    pub fn len(&self) -> usize {
        self.leaves.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.iter().all(Vec::is_empty)
    }

    /// All values with their in-chunk position, leaf order then slot order
    pub fn iter(&self) -> impl Iterator<Item = (LeafSlot, &T)> {
        self.leaves.iter().enumerate().flat_map(|(leaf, values)| {
            values
                .iter()
                .enumerate()
                .map(move |(slot, value)| (LeafSlot::new(leaf, slot), value))
        })
    }
}

/// Sparse 3D chunk index. Depth 0 degrades to one leaf per chunk.
#[derive(Debug, Clone)]
pub struct ChunkIndex<T> {
    chunk_size: f32,
    depth: u32,
    dimension: usize,
    chunks: HashMap<ChunkCoord, Chunk<T>>,
    columns: ColumnIndex,
}

impl<T> ChunkIndex<T> {
    /// Create an empty index. `dimension = 2^depth`.
    pub fn new(chunk_size: f32, depth: u32) -> Self {
        Self {
            chunk_size,
            depth,
            dimension: 1usize << depth,
            chunks: HashMap::new(),
            columns: ColumnIndex::new(),
        }
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Leaves per axis
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Leaves per chunk
    pub fn leaf_count(&self) -> usize {
        self.dimension * self.dimension * self.dimension
    }

    /// World-space edge length of one leaf
    pub fn leaf_width(&self) -> f32 {
        self.chunk_size / self.dimension as f32
    }

    /// Flatten a leaf cell, `None` when outside the chunk
    pub fn leaf_index(&self, cell: IVec3) -> Option<usize> {
        let dim = self.dimension as i32;
        let inside = |c: i32| (0..dim).contains(&c);
        if !(inside(cell.x) && inside(cell.y) && inside(cell.z)) {
            return None;
        }
        let dim = self.dimension;
        Some(cell.x as usize * dim * dim + cell.y as usize * dim + cell.z as usize)
    }

    /// Inverse of [`leaf_index`](Self::leaf_index)
    pub fn leaf_coords(&self, leaf: usize) -> IVec3 {
        let dim = self.dimension;
        IVec3::new(
            (leaf / (dim * dim)) as i32,
            ((leaf / dim) % dim) as i32,
            (leaf % dim) as i32,
        )
    }

    /// Chunk and leaf cell a world position routes to
    pub fn locate_cell(&self, pos: Vec3) -> (ChunkCoord, IVec3) {
        let chunk = ChunkCoord::from_world_pos(pos, self.chunk_size);
        let mut offset = pos - chunk.world_origin(self.chunk_size);
        let mut half = self.chunk_size * 0.5;
        let mut cell = IVec3::ZERO;

        for _ in 0..self.depth {
            cell *= 2;
            if offset.x >= half {
                cell.x += 1;
                offset.x -= half;
            }
            if offset.y >= half {
                cell.y += 1;
                offset.y -= half;
            }
            if offset.z >= half {
                cell.z += 1;
                offset.z -= half;
            }
            half *= 0.5;
        }

        // Float error at the upper chunk face can push a cell past the edge
        let max = self.dimension as i32 - 1;
        (chunk, cell.clamp(IVec3::ZERO, IVec3::splat(max)))
    }

    /// Chunk and flattened leaf index a world position routes to
    pub fn locate(&self, pos: Vec3) -> (ChunkCoord, usize) {
        let (chunk, cell) = self.locate_cell(pos);
        let dim = self.dimension;
        let leaf = cell.x as usize * dim * dim + cell.y as usize * dim + cell.z as usize;
        (chunk, leaf)
    }

    /// Append a value at a world position and return its locator
    pub fn add(&mut self, value: T, pos: Vec3) -> Locator {
        let (coord, leaf) = self.locate(pos);
        let leaf_count = self.leaf_count();
        let columns = &mut self.columns;
        let chunk = self.chunks.entry(coord).or_insert_with(|| {
            columns.insert(coord);
            Chunk::with_leaves(leaf_count)
        });
        let list = &mut chunk.leaves[leaf];
        list.push(value);
        Locator::new(coord, leaf, list.len() - 1)
    }

    pub fn get(&self, locator: &Locator) -> Result<&T> {
        let chunk = self.chunk(locator.chunk)?;
        chunk
            .leaves
            .get(locator.leaf)
            .and_then(|leaf| leaf.get(locator.slot))
            .ok_or(Error::SlotNotFound(*locator))
    }

    pub fn get_mut(&mut self, locator: &Locator) -> Result<&mut T> {
        let chunk = self
            .chunks
            .get_mut(&locator.chunk)
            .ok_or(Error::ChunkNotFound(locator.chunk))?;
        chunk
            .leaves
            .get_mut(locator.leaf)
            .and_then(|leaf| leaf.get_mut(locator.slot))
            .ok_or(Error::SlotNotFound(*locator))
    }

    /// Whole leaf named by a locator. An absent leaf is empty, an absent
    /// chunk is an error.
    pub fn leaf(&self, locator: &Locator) -> Result<&[T]> {
        Ok(self.chunk(locator.chunk)?.leaf(locator.leaf))
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Result<&Chunk<T>> {
        self.chunks.get(&coord).ok_or(Error::ChunkNotFound(coord))
    }

    pub fn contains_chunk(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Every value in a chunk, leaf order then slot order
    pub fn chunk_values(&self, coord: ChunkCoord) -> Result<Vec<&T>> {
        Ok(self.chunk(coord)?.iter().map(|(_, value)| value).collect())
    }

    /// Delete a whole chunk and its column entry
    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> Option<Chunk<T>> {
        let removed = self.chunks.remove(&coord);
        if removed.is_some() {
            self.columns.remove(coord);
        }
        removed
    }

    /// Chunks present under a column, bottom to top
    pub fn chunks_in_column(&self, column: ColumnCoord) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.columns.chunks(column)
    }

    pub fn chunk_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total number of stored values
    pub fn len(&self) -> usize {
        self.chunks.values().map(Chunk::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.values().all(Chunk::is_empty)
    }

    /// Every stored value with its locator, in no particular chunk order
    pub fn iter(&self) -> impl Iterator<Item = (Locator, &T)> {
        self.chunks.iter().flat_map(|(&coord, chunk)| {
            chunk
                .iter()
                .map(move |(pos, value)| (Locator::new(coord, pos.leaf, pos.slot), value))
        })
    }
}

impl<T: PartialEq> ChunkIndex<T> {
    /// Remove the first value equal to `value` from the locator's leaf.
    /// Absent chunk, leaf or value is a no-op.
    pub fn remove_from_leaf(&mut self, locator: &Locator, value: &T) -> Option<T> {
        let leaf = self.chunks.get_mut(&locator.chunk)?.leaves.get_mut(locator.leaf)?;
        let pos = leaf.iter().position(|v| v == value)?;
        Some(leaf.remove(pos))
    }
}
