//! Whole-entity geometry passes: slope culling and world transform

use rayon::prelude::*;

use crate::core::types::Vec3;
use crate::navmesh::entity::SourceEntity;
use crate::navmesh::stage::StepOutcome;

/// Angle in degrees between a triangle's face normal and +Y.
/// Degenerate triangles report 0.
pub fn slope_deg(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let normal = (b - a).cross(c - a);
    if normal.length_squared() <= f32::EPSILON * f32::EPSILON {
        return 0.0;
    }
    normal.angle_between(Vec3::Y).to_degrees()
}

/// Snap X and Z to the nearest multiple of `grid`, ties to even
pub fn snap_xz(v: Vec3, grid: f32) -> Vec3 {
    Vec3::new(
        (v.x / grid).round_ties_even() * grid,
        v.y,
        (v.z / grid).round_ties_even() * grid,
    )
}

/// Drop triangles whose world-space face is steeper than `max_slope_deg`.
/// Surviving triangles keep their order.
pub fn cull_steep_triangles(entity: &mut SourceEntity, max_slope_deg: f32) -> StepOutcome {
    let transform = entity.transform;
    let world: Vec<Vec3> = entity
        .vertices
        .par_iter()
        .map(|&v| transform.transform_point3(v))
        .collect();

    let before = entity.triangles.len();
    entity.triangles = entity
        .triangles
        .par_iter()
        .filter(|tri| {
            let corner = |i: u32| world.get(i as usize).copied();
            match (corner(tri[0]), corner(tri[1]), corner(tri[2])) {
                (Some(a), Some(b), Some(c)) => slope_deg(a, b, c) <= max_slope_deg,
                // Left for corner derivation to drop
                _ => true,
            }
        })
        .copied()
        .collect();

    log::trace!(
        "Entity {}: kept {} of {} triangles",
        entity.id,
        entity.triangles.len(),
        before
    );
    StepOutcome::Complete
}

/// Move vertices to world space and quantize X/Z
pub fn transform_vertices(entity: &mut SourceEntity, snap_grid: f32) -> StepOutcome {
    let transform = entity.transform;
    entity
        .vertices
        .par_iter_mut()
        .for_each(|v| *v = snap_xz(transform.transform_point3(*v), snap_grid));
    StepOutcome::Complete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Mat4, Quat};
    use crate::navmesh::entity::{EntityId, SourceGeometry};

    #[test]
    fn test_slope_deg() {
        let flat = slope_deg(Vec3::ZERO, Vec3::Z, Vec3::X);
        assert!(flat.abs() < 1e-4);
        let wall = slope_deg(Vec3::ZERO, Vec3::Y, Vec3::X);
        assert!((wall - 90.0).abs() < 1e-3);
        let ceiling = slope_deg(Vec3::ZERO, Vec3::X, Vec3::Z);
        assert!((ceiling - 180.0).abs() < 1e-3);
        assert_eq!(slope_deg(Vec3::ZERO, Vec3::X, Vec3::X * 2.0), 0.0);
    }

    #[test]
    fn test_snap_xz_ties_to_even() {
        let snapped = snap_xz(Vec3::new(0.25, 0.3, 0.74), 0.5);
        assert_eq!(snapped, Vec3::new(0.0, 0.3, 0.5));
        let snapped = snap_xz(Vec3::new(0.75, 1.0, -0.25), 0.5);
        assert_eq!(snapped, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_cull_keeps_only_box_top() {
        let geometry = SourceGeometry::from_box(EntityId(1), Vec3::ZERO, Vec3::ONE, Quat::IDENTITY, 0);
        let mut entity = SourceEntity::from_geometry(geometry);
        cull_steep_triangles(&mut entity, 45.0);
        assert_eq!(entity.triangles, vec![[2, 6, 3], [3, 6, 7]]);
    }

    #[test]
    fn test_cull_uses_world_orientation() {
        // Box rolled 90° about Z: its local +X face ends up facing +Y
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let geometry = SourceGeometry::from_box(EntityId(1), Vec3::ZERO, Vec3::ONE, rotation, 0);
        let mut entity = SourceEntity::from_geometry(geometry);
        cull_steep_triangles(&mut entity, 10.0);
        assert_eq!(entity.triangles, vec![[1, 3, 5], [3, 7, 5]]);
    }

    #[test]
    fn test_transform_then_snap() {
        let geometry = SourceGeometry::new(
            EntityId(1),
            vec![Vec3::new(0.1, 0.1, 0.2), Vec3::new(1.3, 2.0, 0.0)],
            vec![],
            Mat4::from_translation(Vec3::new(10.0, 5.0, 0.0)),
            0,
        );
        let mut entity = SourceEntity::from_geometry(geometry);
        transform_vertices(&mut entity, 0.5);
        assert!((entity.vertices[0] - Vec3::new(10.0, 5.1, 0.0)).length() < 1e-5);
        assert!((entity.vertices[1] - Vec3::new(11.5, 7.0, 0.0)).length() < 1e-5);
    }
}
