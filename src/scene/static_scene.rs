//! In-memory scene answering geometry, ground and clearance queries

use std::collections::HashMap;

use crate::core::types::{Quat, Vec3};
use crate::math::{Aabb, Ray};
use crate::navmesh::{EntityId, LayerMask, SourceGeometry};

use super::{ClearanceTester, GeometryProvider, GroundProjector};

struct SceneEntry {
    geometry: SourceGeometry,
    /// World-space copy of the vertices for ray casts
    world: Vec<Vec3>,
}

/// Static triangle soup with per-entity bounds
#[derive(Default)]
pub struct StaticScene {
    entries: Vec<SceneEntry>,
    by_id: HashMap<EntityId, usize>,
    next_id: u64,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entity
    pub fn add(&mut self, geometry: SourceGeometry) -> EntityId {
        let id = geometry.id;
        self.next_id = self.next_id.max(id.0 + 1);
        let world = geometry
            .vertices
            .iter()
            .map(|&v| geometry.transform.transform_point3(v))
            .collect();
        let entry = SceneEntry { geometry, world };
        match self.by_id.get(&id) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.by_id.insert(id, self.entries.len());
                self.entries.push(entry);
            }
        }
        id
    }

    /// Next unused entity id
    pub fn next_id(&self) -> EntityId {
        EntityId(self.next_id)
    }

    /// Add an oriented box with a fresh id
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, rotation: Quat, layer: u8) -> EntityId {
        let id = self.next_id();
        self.add(SourceGeometry::from_box(id, center, half_extents, rotation, layer))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bounds of everything in the scene
    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.entries.iter().map(|e| e.geometry.bounds);
        let first = iter.next()?;
        Some(iter.fold(first, |acc, b| acc.union(&b)))
    }

    /// Closest hit along a ray within `max_distance`: distance and point
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<(f32, Vec3)> {
        let mut best: Option<f32> = None;
        for entry in &self.entries {
            let Some(t_near) = ray.entry_distance(&entry.geometry.bounds) else {
                continue;
            };
            if t_near > max_distance || best.is_some_and(|b| t_near > b) {
                continue;
            }
            for tri in &entry.geometry.triangles {
                let corner = |i: u32| entry.world.get(i as usize).copied();
                let (Some(a), Some(b), Some(c)) = (corner(tri[0]), corner(tri[1]), corner(tri[2])) else {
                    continue;
                };
                if let Some(t) = ray.intersects_triangle(a, b, c) {
                    if t <= max_distance && best.is_none_or(|b| t < b) {
                        best = Some(t);
                    }
                }
            }
        }
        best.map(|t| (t, ray.at(t)))
    }

    fn segment_blocked(&self, from: Vec3, to: Vec3) -> bool {
        let Some((ray, length)) = Ray::between(from, to) else {
            return false;
        };
        self.raycast(&ray, length).is_some()
    }
}

impl GeometryProvider for StaticScene {
    fn entity_ids(&self, mask: LayerMask) -> Vec<EntityId> {
        self.entries
            .iter()
            .filter(|e| mask.contains_layer(e.geometry.layer))
            .map(|e| e.geometry.id)
            .collect()
    }

    fn geometry(&self, id: EntityId) -> Option<SourceGeometry> {
        let &slot = self.by_id.get(&id)?;
        Some(self.entries[slot].geometry.clone())
    }
}

impl GroundProjector for StaticScene {
    fn project_down(&self, pos: Vec3, max_distance: f32) -> Option<Vec3> {
        self.raycast(&Ray::new(pos, Vec3::NEG_Y), max_distance)
            .map(|(_, point)| point)
    }
}

impl ClearanceTester for StaticScene {
    fn is_clear(&self, from: Vec3, to: Vec3, width: f32, height: f32) -> bool {
        if self.segment_blocked(from, to) {
            return false;
        }

        let flat = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
        if width > 0.0 && flat.length_squared() > f32::EPSILON {
            // Horizontal perpendicular, scaled to the agent's half width
            let side = Vec3::new(-flat.z, 0.0, flat.x).normalize() * (width * 0.5);
            if self.segment_blocked(from + side, to + side) || self.segment_blocked(from - side, to - side) {
                return false;
            }
        }

        if height > 0.0 {
            let up = Vec3::Y * (height * 0.5);
            if self.segment_blocked(from + up, to + up) {
                return false;
            }
        }
        true
    }
}
