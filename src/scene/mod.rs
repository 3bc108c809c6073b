//! External collaborators of the navmesh builder
//!
//! The builder never talks to a physics backend directly. It asks a
//! [`GeometryProvider`] for static geometry, a [`GroundProjector`] for
//! walkable surface points and a [`ClearanceTester`] for line-of-sight.
//! [`StaticScene`] implements all three over in-memory triangles.

pub mod static_scene;
pub mod terrain;

pub use static_scene::StaticScene;
pub use terrain::{TerrainGenerator, TerrainParams};

use crate::core::types::Vec3;
use crate::navmesh::{EntityId, LayerMask, SourceGeometry};

/// Enumerates static geometry objects
pub trait GeometryProvider {
    /// Identities of every entity on a layer in `mask`
    fn entity_ids(&self, mask: LayerMask) -> Vec<EntityId>;

    /// Geometry of one entity, `None` if it no longer exists
    fn geometry(&self, id: EntityId) -> Option<SourceGeometry>;
}

/// Vertical probe onto walkable surfaces
pub trait GroundProjector {
    /// First surface point straight below `pos`, within `max_distance`
    fn project_down(&self, pos: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// Straight-line traversal test
pub trait ClearanceTester {
    /// Whether an agent of `width` × `height` can move from `from` to `to`
    /// in a straight line. Zero extents test a bare segment.
    fn is_clear(&self, from: Vec3, to: Vec3, width: f32, height: f32) -> bool;
}
