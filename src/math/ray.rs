//! Rays and segment casts against boxes and triangles

use crate::core::types::Vec3;
use super::aabb::Aabb;

/// Half-line from `origin` along a unit `direction`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// `direction` is expected to be normalized
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray from `from` towards `to`, with the segment length as second value.
    /// `None` when the two points coincide.
    pub fn between(from: Vec3, to: Vec3) -> Option<(Self, f32)> {
        let delta = to - from;
        let length = delta.length();
        if length <= f32::EPSILON {
            return None;
        }
        Some((Ray::new(from, delta / length), length))
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance at which the ray enters the box, 0 when it starts inside.
    /// Axis-parallel rays are handled per slab.
    pub fn entry_distance(&self, aabb: &Aabb) -> Option<f32> {
        let mut near = 0.0f32;
        let mut far = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let dir = self.direction[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

            if dir.abs() <= f32::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let (t0, t1) = ((lo - origin) / dir, (hi - origin) / dir);
            near = near.max(t0.min(t1));
            far = far.min(t0.max(t1));
            if near > far {
                return None;
            }
        }
        Some(near)
    }

    /// Möller–Trumbore, double sided. Returns the hit distance along the ray;
    /// edges count as hits.
    pub fn intersects_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        const EPS: f32 = 1e-7;

        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPS {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between() {
        let (ray, len) = Ray::between(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0)).unwrap();
        assert_eq!(ray.direction, Vec3::Z);
        assert!((len - 4.0).abs() < 1e-6);
        assert_eq!(ray.at(len), Vec3::new(0.0, 0.0, 4.0));
        assert!(Ray::between(Vec3::ONE, Vec3::ONE).is_none());
    }

    #[test]
    fn test_entry_distance() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let hit = Ray::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::X);
        assert!((hit.entry_distance(&aabb).unwrap() - 2.0).abs() < 1e-6);

        let inside = Ray::new(Vec3::splat(0.5), Vec3::X);
        assert_eq!(inside.entry_distance(&aabb), Some(0.0));

        let away = Ray::new(Vec3::new(-2.0, 0.5, 0.5), Vec3::NEG_X);
        assert!(away.entry_distance(&aabb).is_none());
    }

    #[test]
    fn test_entry_distance_axis_parallel() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 0.0, 1.0));
        // Straight down through the top face, x and z components are zero
        let down = Ray::new(Vec3::new(1.0, 5.0, 0.0), Vec3::NEG_Y);
        assert!((down.entry_distance(&aabb).unwrap() - 5.0).abs() < 1e-6);
        let beside = Ray::new(Vec3::new(1.5, 5.0, 0.0), Vec3::NEG_Y);
        assert!(beside.entry_distance(&aabb).is_none());
    }

    #[test]
    fn test_intersects_triangle_down() {
        let ray = Ray::new(Vec3::new(0.25, 5.0, 0.25), Vec3::NEG_Y);
        let t = ray
            .intersects_triangle(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0))
            .unwrap();
        assert!((t - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_intersects_triangle_miss_and_behind() {
        let tri = [Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)];
        let outside = Ray::new(Vec3::new(2.0, 5.0, 2.0), Vec3::NEG_Y);
        assert!(outside.intersects_triangle(tri[0], tri[1], tri[2]).is_none());
        let behind = Ray::new(Vec3::new(0.25, -1.0, 0.25), Vec3::NEG_Y);
        assert!(behind.intersects_triangle(tri[0], tri[1], tri[2]).is_none());
    }
}
