//! Source entities and their registry
//!
//! A source entity is one static geometry object handed over by the
//! geometry provider. The registry remembers every identity it has ever
//! seen, owns the entities still being converted, and keeps a depth-0
//! occupancy index of the chunks each live entity's bounds overlap.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Mat4, Quat, Result, Vec3};
use crate::math::Aabb;
use crate::scene::GeometryProvider;
use crate::spatial::{ChunkIndex, ColumnCoord, Locator};

/// Stable identity of a source entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bit set of geometry layers (0..32)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn from_layer(layer: u8) -> Self {
        LayerMask(1u32.checked_shl(layer as u32).unwrap_or(0))
    }

    pub fn contains_layer(&self, layer: u8) -> bool {
        self.0 & Self::from_layer(layer).0 != 0
    }

    pub fn with_layer(self, layer: u8) -> Self {
        LayerMask(self.0 | Self::from_layer(layer).0)
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Raw geometry as supplied by a [`GeometryProvider`]
#[derive(Debug, Clone)]
pub struct SourceGeometry {
    pub id: EntityId,
    /// Local-space vertex positions
    pub vertices: Vec<Vec3>,
    /// Index triples into `vertices`
    pub triangles: Vec<[u32; 3]>,
    /// World-space bounds
    pub bounds: Aabb,
    /// Local to world
    pub transform: Mat4,
    pub layer: u8,
}

impl SourceGeometry {
    /// Build from local geometry, deriving world bounds from the transformed vertices
    pub fn new(id: EntityId, vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>, transform: Mat4, layer: u8) -> Self {
        let origin = transform.transform_point3(Vec3::ZERO);
        let bounds = Aabb::from_points(vertices.iter().map(|&v| transform.transform_point3(v)))
            .unwrap_or(Aabb::new(origin, origin));
        Self {
            id,
            vertices,
            triangles,
            bounds,
            transform,
            layer,
        }
    }

    /// Oriented box: 8 vertices, 12 outward-facing triangles
    pub fn from_box(id: EntityId, center: Vec3, half_extents: Vec3, rotation: Quat, layer: u8) -> Self {
        let vertices = (0..8u8)
            .map(|i| {
                Vec3::new(
                    if i & 1 != 0 { half_extents.x } else { -half_extents.x },
                    if i & 2 != 0 { half_extents.y } else { -half_extents.y },
                    if i & 4 != 0 { half_extents.z } else { -half_extents.z },
                )
            })
            .collect();
        let triangles = vec![
            [2, 6, 3], [3, 6, 7], // +Y
            [0, 1, 4], [1, 5, 4], // -Y
            [1, 3, 5], [3, 7, 5], // +X
            [0, 4, 2], [2, 4, 6], // -X
            [4, 5, 6], [5, 7, 6], // +Z
            [0, 2, 1], [1, 2, 3], // -Z
        ];
        let transform = Mat4::from_rotation_translation(rotation, center);
        Self::new(id, vertices, triangles, transform, layer)
    }

    /// Regular heightfield of `columns × rows` samples, row-major in Z,
    /// `origin` at sample (0, 0). Cells are split into two upward-facing triangles.
    pub fn from_heightfield(
        id: EntityId,
        origin: Vec3,
        cell_size: f32,
        columns: usize,
        rows: usize,
        heights: &[f32],
        layer: u8,
    ) -> Self {
        let mut vertices = Vec::with_capacity(columns * rows);
        for j in 0..rows {
            for i in 0..columns {
                let h = heights.get(j * columns + i).copied().unwrap_or(0.0);
                vertices.push(Vec3::new(i as f32 * cell_size, h, j as f32 * cell_size));
            }
        }

        let mut triangles = Vec::new();
        for j in 0..rows.saturating_sub(1) {
            for i in 0..columns.saturating_sub(1) {
                let v00 = (j * columns + i) as u32;
                let v10 = v00 + 1;
                let v01 = v00 + columns as u32;
                let v11 = v01 + 1;
                triangles.push([v00, v01, v10]);
                triangles.push([v10, v01, v11]);
            }
        }

        Self::new(id, vertices, triangles, Mat4::from_translation(origin), layer)
    }
}

/// Build position `(level, order)` an entity was last enqueued for.
///
/// Levels run outer to inner, so a lower level is later; within a level a
/// higher order is later. `a > b` means `a` comes after `b` in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelinePosition {
    pub level: usize,
    pub order: usize,
}

impl PipelinePosition {
    pub fn new(level: usize, order: usize) -> Self {
        Self { level, order }
    }
}

impl Ord for PipelinePosition {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .level
            .cmp(&self.level)
            .then(self.order.cmp(&other.order))
    }
}

impl PartialOrd for PipelinePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An entity being converted into navmesh vertices and triangles
#[derive(Debug, Clone)]
pub struct SourceEntity {
    pub id: EntityId,
    /// Local-space until transformed, world-space after
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub bounds: Aabb,
    pub transform: Mat4,
    /// One locator per inserted vertex, rewritten by merging
    pub vertex_locators: Vec<Locator>,
    /// Corner locators per triangle, derived after merging
    pub corner_locators: Vec<[Locator; 3]>,
    /// Latest build position this entity was enqueued for
    pub last_enqueued: Option<PipelinePosition>,
}

impl SourceEntity {
    pub fn from_geometry(geometry: SourceGeometry) -> Self {
        Self {
            id: geometry.id,
            vertices: geometry.vertices,
            triangles: geometry.triangles,
            bounds: geometry.bounds,
            transform: geometry.transform,
            vertex_locators: Vec::new(),
            corner_locators: Vec::new(),
            last_enqueued: None,
        }
    }

    /// Whether enqueuing at `position` would move this entity forward
    pub fn should_enqueue(&self, position: PipelinePosition) -> bool {
        self.last_enqueued.is_none_or(|last| position > last)
    }

    /// Resolve per-triangle corners from the (merged) vertex locators.
    /// Triangles indexing past the inserted vertices are dropped.
    pub fn derive_corner_locators(&mut self) {
        let locators = &self.vertex_locators;
        let lookup = |i: u32| locators.get(i as usize).copied();
        self.corner_locators = self
            .triangles
            .iter()
            .filter_map(|&[a, b, c]| Some([lookup(a)?, lookup(b)?, lookup(c)?]))
            .collect();
        let dropped = self.triangles.len() - self.corner_locators.len();
        if dropped > 0 {
            log::debug!("Entity {}: dropped {} triangles with missing vertices", self.id, dropped);
        }
    }
}

/// Owns source entities and the chunk occupancy of their bounds
#[derive(Debug)]
pub struct EntityRegistry {
    known: HashSet<EntityId>,
    entities: HashMap<EntityId, SourceEntity>,
    occupancy: ChunkIndex<EntityId>,
}

impl EntityRegistry {
    pub fn new(chunk_size: f32) -> Self {
        Self {
            known: HashSet::new(),
            entities: HashMap::new(),
            occupancy: ChunkIndex::new(chunk_size, 0),
        }
    }

    /// Pull every unknown entity on `mask` from the provider.
    /// Returns the newly registered ids.
    pub fn discover(&mut self, provider: &dyn GeometryProvider, mask: LayerMask) -> Vec<EntityId> {
        let mut added = Vec::new();
        for id in provider.entity_ids(mask) {
            if self.known.contains(&id) {
                continue;
            }
            let Some(geometry) = provider.geometry(id) else {
                log::debug!("Entity {} listed but has no geometry", id);
                continue;
            };
            if !mask.contains_layer(geometry.layer) {
                continue;
            }
            if self.register(geometry) {
                added.push(id);
            }
        }
        if !added.is_empty() {
            log::info!("Discovered {} new entities ({} live)", added.len(), self.entities.len());
        }
        added
    }

    /// Columns under the chunks an entity's bounds overlap, no duplicates
    pub fn columns_of(&self, id: EntityId) -> Result<Vec<ColumnCoord>> {
        let bounds = self.get(id)?.bounds;
        let mut columns = Vec::new();
        for chunk in bounds.overlapped_chunks(self.occupancy.chunk_size()) {
            let column = chunk.column();
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        Ok(columns)
    }

    /// Register one entity and mark the chunks its bounds overlap.
    /// Returns false if the identity was seen before.
    pub fn register(&mut self, geometry: SourceGeometry) -> bool {
        if !self.known.insert(geometry.id) {
            return false;
        }
        let id = geometry.id;
        let chunk_size = self.occupancy.chunk_size();
        for chunk in geometry.bounds.overlapped_chunks(chunk_size) {
            self.occupancy.add(id, chunk.world_origin(chunk_size));
        }
        self.entities.insert(id, SourceEntity::from_geometry(geometry));
        true
    }

    pub fn get(&self, id: EntityId) -> Result<&SourceEntity> {
        self.entities.get(&id).ok_or(Error::EntityNotFound(id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut SourceEntity> {
        self.entities.get_mut(&id).ok_or(Error::EntityNotFound(id))
    }

    /// Live entities overlapping any chunk of a column, first-seen order, no duplicates
    pub fn entities_in_column(&self, column: ColumnCoord) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for chunk in self.occupancy.chunks_in_column(column) {
            let Ok(values) = self.occupancy.chunk_values(chunk) else {
                continue;
            };
            for &id in values {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    /// Remove an entity's occupancy records, dropping chunks left empty
    pub fn vacate(&mut self, id: EntityId) -> Result<()> {
        let bounds = self.get(id)?.bounds;
        for chunk in bounds.overlapped_chunks(self.occupancy.chunk_size()) {
            self.occupancy.remove_from_leaf(&Locator::new(chunk, 0, 0), &id);
            if self.occupancy.chunk(chunk).is_ok_and(|c| c.is_empty()) {
                self.occupancy.remove_chunk(chunk);
            }
        }
        Ok(())
    }

    /// Vacate and drop a finished entity. Its identity stays known.
    pub fn retire(&mut self, id: EntityId) -> Result<SourceEntity> {
        self.vacate(id)?;
        let entity = self.entities.remove(&id).ok_or(Error::EntityNotFound(id))?;
        log::debug!("Entity {} retired", id);
        Ok(entity)
    }

    pub fn is_known(&self, id: EntityId) -> bool {
        self.known.contains(&id)
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Entities still being converted
    pub fn live_count(&self) -> usize {
        self.entities.len()
    }

    /// Every identity ever registered
    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    pub fn occupancy(&self) -> &ChunkIndex<EntityId> {
        &self.occupancy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::ChunkCoord;

    #[test]
    fn test_pipeline_position_order() {
        let l3o0 = PipelinePosition::new(3, 0);
        let l3o2 = PipelinePosition::new(3, 2);
        let l1o0 = PipelinePosition::new(1, 0);
        assert!(l3o2 > l3o0);
        assert!(l1o0 > l3o2);
        assert!(l1o0 > l3o0);
        assert_eq!(l1o0.cmp(&l1o0), Ordering::Equal);
    }

    #[test]
    fn test_should_enqueue_only_forward() {
        let geometry = SourceGeometry::from_box(EntityId(1), Vec3::ZERO, Vec3::ONE, Quat::IDENTITY, 0);
        let mut entity = SourceEntity::from_geometry(geometry);
        assert!(entity.should_enqueue(PipelinePosition::new(3, 0)));
        entity.last_enqueued = Some(PipelinePosition::new(3, 2));
        assert!(!entity.should_enqueue(PipelinePosition::new(3, 1)));
        assert!(!entity.should_enqueue(PipelinePosition::new(3, 2)));
        assert!(entity.should_enqueue(PipelinePosition::new(1, 0)));
    }

    #[test]
    fn test_box_geometry() {
        let geometry = SourceGeometry::from_box(EntityId(1), Vec3::new(10.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 3.0), Quat::IDENTITY, 0);
        assert_eq!(geometry.vertices.len(), 8);
        assert_eq!(geometry.triangles.len(), 12);
        assert_eq!(geometry.bounds.min, Vec3::new(8.0, 0.0, -3.0));
        assert_eq!(geometry.bounds.max, Vec3::new(12.0, 2.0, 3.0));

        // Top faces point up, bottom faces down
        let normal = |t: [u32; 3]| {
            let [a, b, c] = t.map(|i| geometry.vertices[i as usize]);
            (b - a).cross(c - a).normalize()
        };
        assert!(normal(geometry.triangles[0]).y > 0.99);
        assert!(normal(geometry.triangles[1]).y > 0.99);
        assert!(normal(geometry.triangles[2]).y < -0.99);
        assert!(normal(geometry.triangles[4]).x > 0.99);
    }

    #[test]
    fn test_heightfield_geometry() {
        let heights = [0.0, 1.0, 2.0, 0.0, 1.0, 2.0];
        let geometry = SourceGeometry::from_heightfield(EntityId(2), Vec3::new(5.0, 0.0, 5.0), 2.0, 3, 2, &heights, 0);
        assert_eq!(geometry.vertices.len(), 6);
        assert_eq!(geometry.triangles.len(), 4);
        assert_eq!(geometry.bounds.min, Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(geometry.bounds.max, Vec3::new(9.0, 2.0, 7.0));
        for t in &geometry.triangles {
            let [a, b, c] = t.map(|i| geometry.vertices[i as usize]);
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn test_layer_mask() {
        let mask = LayerMask::from_layer(2).with_layer(5);
        assert!(mask.contains_layer(2));
        assert!(mask.contains_layer(5));
        assert!(!mask.contains_layer(0));
        assert!(LayerMask::ALL.contains_layer(31));
        assert!(!LayerMask::NONE.contains_layer(0));
        assert!(!mask.contains_layer(40));
    }

    #[test]
    fn test_register_occupies_overlapped_chunks() {
        let mut registry = EntityRegistry::new(10.0);
        let geometry = SourceGeometry::from_box(EntityId(1), Vec3::new(10.0, 5.0, 5.0), Vec3::new(2.0, 1.0, 1.0), Quat::IDENTITY, 0);
        assert!(registry.register(geometry.clone()));
        assert!(!registry.register(geometry));

        assert_eq!(registry.entities_in_column(ColumnCoord::new(0, 0)), vec![EntityId(1)]);
        assert_eq!(registry.entities_in_column(ColumnCoord::new(1, 0)), vec![EntityId(1)]);
        assert!(registry.entities_in_column(ColumnCoord::new(2, 0)).is_empty());
        assert_eq!(registry.occupancy().chunk_count(), 2);
    }

    #[test]
    fn test_retire_vacates_but_stays_known() {
        let mut registry = EntityRegistry::new(10.0);
        let id = EntityId(9);
        registry.register(SourceGeometry::from_box(id, Vec3::new(5.0, 5.0, 5.0), Vec3::ONE, Quat::IDENTITY, 0));
        registry.register(SourceGeometry::from_box(EntityId(10), Vec3::new(5.0, 5.0, 5.0), Vec3::ONE, Quat::IDENTITY, 0));

        let entity = registry.retire(id).unwrap();
        assert_eq!(entity.id, id);
        assert!(registry.is_known(id));
        assert!(!registry.is_live(id));
        assert!(matches!(registry.get(id), Err(Error::EntityNotFound(_))));
        assert_eq!(registry.entities_in_column(ColumnCoord::new(0, 0)), vec![EntityId(10)]);

        registry.retire(EntityId(10)).unwrap();
        assert!(!registry.occupancy().contains_chunk(ChunkCoord::new(0, 0, 0)));
        assert!(registry.retire(id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_derive_corner_locators_skips_bad_indices() {
        let geometry = SourceGeometry::new(
            EntityId(3),
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            vec![[0, 2, 1], [0, 1, 7]],
            Mat4::IDENTITY,
            0,
        );
        let mut entity = SourceEntity::from_geometry(geometry);
        let chunk = ChunkCoord::new(0, 0, 0);
        entity.vertex_locators = (0..3).map(|i| Locator::new(chunk, 0, i)).collect();
        entity.derive_corner_locators();
        assert_eq!(entity.corner_locators.len(), 1);
        assert_eq!(entity.corner_locators[0][1].slot, 2);
    }
}
