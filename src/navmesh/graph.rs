//! Shared navmesh indices
//!
//! The build pipeline is the only writer. Path queries borrow the triangle
//! index immutably and must tolerate a graph that is still being linked.

use serde::{Deserialize, Serialize};

use crate::core::types::{Result, Vec3};
use crate::spatial::{ChunkIndex, ChunkKeyedMap, LeafSlot, Locator};

use super::config::NavConfig;
use super::node::TriangleNode;

/// Vertex and triangle indices plus the bookkeeping maps between them
#[derive(Debug)]
pub struct NavGraph {
    /// Quantized world-space vertices
    pub vertices: ChunkIndex<Vec3>,
    /// `(vertex chunk, leaf, later slot) -> earlier slot` for near-duplicates
    pub merge_map: ChunkKeyedMap<LeafSlot, usize>,
    /// `(vertex chunk, leaf) -> slots already mapped`
    pub merge_marks: ChunkKeyedMap<usize, usize>,
    pub triangles: ChunkIndex<TriangleNode>,
    /// Vertex locator -> triangles using it, consumed by linking
    pub corner_map: ChunkKeyedMap<LeafSlot, Vec<Locator>>,
}

/// Size summary of the graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub vertices: usize,
    pub vertex_chunks: usize,
    pub triangles: usize,
    pub triangle_chunks: usize,
    /// Undirected neighbor edges
    pub links: usize,
    pub pending_merges: usize,
    pub pending_corners: usize,
}

impl NavGraph {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            vertices: ChunkIndex::new(config.chunk_size, config.vertex_depth),
            merge_map: ChunkKeyedMap::new(config.chunk_size),
            merge_marks: ChunkKeyedMap::new(config.chunk_size),
            triangles: ChunkIndex::new(config.chunk_size, config.triangle_depth),
            corner_map: ChunkKeyedMap::new(config.chunk_size),
        }
    }

    pub fn vertex(&self, locator: &Locator) -> Result<Vec3> {
        self.vertices.get(locator).copied()
    }

    pub fn triangle(&self, locator: &Locator) -> Result<&TriangleNode> {
        self.triangles.get(locator)
    }

    /// Record `triangle` as a user of `corner`
    pub fn add_corner_use(&mut self, corner: Locator, triangle: Locator) {
        let users = self
            .corner_map
            .get_or_insert_with(corner.chunk, corner.leaf_slot(), Vec::new);
        if users.last() != Some(&triangle) {
            users.push(triangle);
        }
    }

    /// Link two triangles both ways. Self links are ignored.
    /// Returns true if either side gained a neighbor.
    pub fn link(&mut self, a: Locator, b: Locator) -> Result<bool> {
        if a == b {
            return Ok(false);
        }
        // Resolve both before mutating so a miss leaves no half-link
        self.triangles.get(&a)?;
        self.triangles.get(&b)?;
        let added_a = self.triangles.get_mut(&a)?.add_neighbor(b);
        let added_b = self.triangles.get_mut(&b)?.add_neighbor(a);
        Ok(added_a || added_b)
    }

    pub fn stats(&self) -> GraphStats {
        let directed: usize = self
            .triangles
            .iter()
            .map(|(_, node)| node.neighbors().len())
            .sum();
        GraphStats {
            vertices: self.vertices.len(),
            vertex_chunks: self.vertices.chunk_count(),
            triangles: self.triangles.len(),
            triangle_chunks: self.triangles.chunk_count(),
            links: directed / 2,
            pending_merges: self.merge_map.len(),
            pending_corners: self.corner_map.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> NavGraph {
        NavGraph::new(&NavConfig::default())
    }

    #[test]
    fn test_link_is_symmetric_and_idempotent() {
        let mut graph = graph();
        let corner = graph.vertices.add(Vec3::ZERO, Vec3::ZERO);
        let a = graph.triangles.add(TriangleNode::new(Vec3::ZERO, [corner; 3]), Vec3::ZERO);
        let b = graph.triangles.add(TriangleNode::new(Vec3::X, [corner; 3]), Vec3::X);

        assert!(graph.link(a, b).unwrap());
        assert!(!graph.link(b, a).unwrap());
        assert!(!graph.link(a, a).unwrap());
        assert!(graph.triangle(&a).unwrap().is_linked_to(&b));
        assert!(graph.triangle(&b).unwrap().is_linked_to(&a));
        assert_eq!(graph.stats().links, 1);
    }

    #[test]
    fn test_link_to_missing_leaves_no_half_edge() {
        let mut graph = graph();
        let corner = graph.vertices.add(Vec3::ZERO, Vec3::ZERO);
        let a = graph.triangles.add(TriangleNode::new(Vec3::ZERO, [corner; 3]), Vec3::ZERO);
        let missing = a.with_slot(10);
        assert!(graph.link(a, missing).unwrap_err().is_not_found());
        assert!(graph.triangle(&a).unwrap().neighbors().is_empty());
    }

    #[test]
    fn test_corner_use_dedups_consecutive() {
        let mut graph = graph();
        let corner = graph.vertices.add(Vec3::ZERO, Vec3::ZERO);
        let tri = graph.triangles.add(TriangleNode::new(Vec3::ZERO, [corner; 3]), Vec3::ZERO);
        graph.add_corner_use(corner, tri);
        graph.add_corner_use(corner, tri);
        assert_eq!(graph.corner_map.get(corner.chunk, &corner.leaf_slot()).unwrap().len(), 1);
        assert_eq!(graph.stats().pending_corners, 1);
    }
}
