//! Walkable triangle node

use crate::core::types::Vec3;
use crate::spatial::Locator;

/// A walkable triangle in the navigation graph
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleNode {
    /// Mean of the three merged corner positions
    pub center: Vec3,
    /// Vertex-index locators of the corners
    pub corners: [Locator; 3],
    /// Triangle-index locators of adjacent triangles
    neighbors: Vec<Locator>,
}

impl TriangleNode {
    pub fn new(center: Vec3, corners: [Locator; 3]) -> Self {
        Self {
            center,
            corners,
            neighbors: Vec::new(),
        }
    }

    pub fn neighbors(&self) -> &[Locator] {
        &self.neighbors
    }

    /// Add a neighbor once. Returns false if it was already present.
    pub fn add_neighbor(&mut self, neighbor: Locator) -> bool {
        if self.neighbors.contains(&neighbor) {
            return false;
        }
        self.neighbors.push(neighbor);
        true
    }

    pub fn is_linked_to(&self, other: &Locator) -> bool {
        self.neighbors.contains(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::ChunkCoord;

    #[test]
    fn test_add_neighbor_is_idempotent() {
        let chunk = ChunkCoord::new(0, 0, 0);
        let corners = [Locator::new(chunk, 0, 0), Locator::new(chunk, 0, 1), Locator::new(chunk, 0, 2)];
        let mut node = TriangleNode::new(Vec3::ZERO, corners);
        let other = Locator::new(chunk, 1, 0);
        assert!(node.add_neighbor(other));
        assert!(!node.add_neighbor(other));
        assert_eq!(node.neighbors(), &[other]);
        assert!(node.is_linked_to(&other));
    }
}
