//! XZ column grouping of chunk coordinates

use std::collections::HashMap;

use super::coord::{ChunkCoord, ColumnCoord};

/// Groups present chunk coordinates by column so that every Y level under a
/// column can be listed without scanning the whole index.
///
/// Heights are kept sorted per column.
#[derive(Debug, Default, Clone)]
pub struct ColumnIndex {
    columns: HashMap<ColumnCoord, Vec<i32>>,
}

impl ColumnIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk as present. Returns false if it already was.
    pub fn insert(&mut self, coord: ChunkCoord) -> bool {
        let heights = self.columns.entry(coord.column()).or_default();
        match heights.binary_search(&coord.y) {
            Ok(_) => false,
            Err(pos) => {
                heights.insert(pos, coord.y);
                true
            }
        }
    }

    /// Forget a chunk. Empty columns are dropped.
    pub fn remove(&mut self, coord: ChunkCoord) -> bool {
        let column = coord.column();
        let Some(heights) = self.columns.get_mut(&column) else {
            return false;
        };
        let removed = match heights.binary_search(&coord.y) {
            Ok(pos) => {
                heights.remove(pos);
                true
            }
            Err(_) => false,
        };
        if heights.is_empty() {
            self.columns.remove(&column);
        }
        removed
    }

    /// Present heights in a column, ascending
    pub fn heights(&self, column: ColumnCoord) -> &[i32] {
        self.columns.get(&column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Present chunks in a column, bottom to top
    pub fn chunks(&self, column: ColumnCoord) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.heights(column).iter().map(move |&y| column.at_height(y))
    }

    pub fn contains_column(&self, column: ColumnCoord) -> bool {
        self.columns.contains_key(&column)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }
}
