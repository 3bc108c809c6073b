//! Chunk and column coordinates

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;

/// Integer chunk coordinate, `floor(world / chunk_size)` per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Chunk containing a world position
    pub fn from_world_pos(pos: Vec3, chunk_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_size).floor() as i32,
            y: (pos.y / chunk_size).floor() as i32,
            z: (pos.z / chunk_size).floor() as i32,
        }
    }

    /// World-space position of the chunk's minimum corner
    pub fn world_origin(&self, chunk_size: f32) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32) * chunk_size
    }

    /// XZ projection
    pub fn column(&self) -> ColumnCoord {
        ColumnCoord::new(self.x, self.z)
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// XZ chunk column. Every chunk with the same x and z shares a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ColumnCoord {
    pub x: i32,
    pub z: i32,
}

impl ColumnCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chebyshev (chessboard) distance in columns
    pub fn chebyshev_distance(&self, other: ColumnCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Chunk at height `y` in this column
    pub fn at_height(&self, y: i32) -> ChunkCoord {
        ChunkCoord::new(self.x, y, self.z)
    }
}

impl fmt::Display for ColumnCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

impl From<ChunkCoord> for ColumnCoord {
    fn from(coord: ChunkCoord) -> Self {
        coord.column()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_world_pos_floors() {
        assert_eq!(ChunkCoord::from_world_pos(Vec3::new(5.0, 0.0, 9.99), 10.0), ChunkCoord::new(0, 0, 0));
        assert_eq!(ChunkCoord::from_world_pos(Vec3::new(-0.1, 10.0, 25.0), 10.0), ChunkCoord::new(-1, 1, 2));
    }

    #[test]
    fn test_world_origin() {
        assert_eq!(ChunkCoord::new(-1, 2, 3).world_origin(4.0), Vec3::new(-4.0, 8.0, 12.0));
    }

    #[test]
    fn test_column_projection() {
        let coord = ChunkCoord::new(3, -7, 4);
        assert_eq!(coord.column(), ColumnCoord::new(3, 4));
        assert_eq!(coord.column().at_height(-7), coord);
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = ColumnCoord::new(0, 0);
        assert_eq!(a.chebyshev_distance(ColumnCoord::new(2, -1)), 2);
        assert_eq!(a.chebyshev_distance(ColumnCoord::new(-3, 3)), 3);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(ChunkCoord::new(1, -2, 3).to_string(), "(1, -2, 3)");
        assert_eq!(ColumnCoord::new(1, 3).to_string(), "(1, 3)");
    }
}
