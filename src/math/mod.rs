//! Geometric helpers shared by the builder and the scene

pub mod aabb;
pub mod ray;

pub use aabb::Aabb;
pub use ray::Ray;
