//! Axis-aligned bounding box

use crate::core::types::Vec3;
use crate::spatial::ChunkCoord;

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty set
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Aabb::new(first, first), |mut aabb, p| {
            aabb.expand(p);
            aabb
        }))
    }

    /// Inclusive on every face
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Every chunk coordinate the box touches, faces included
    pub fn overlapped_chunks(&self, chunk_size: f32) -> impl Iterator<Item = ChunkCoord> {
        let lo = ChunkCoord::from_world_pos(self.min, chunk_size);
        let hi = ChunkCoord::from_world_pos(self.max, chunk_size);
        (lo.x..=hi.x).flat_map(move |x| {
            (lo.y..=hi.y).flat_map(move |y| (lo.z..=hi.z).map(move |z| ChunkCoord::new(x, y, z)))
        })
    }
}
