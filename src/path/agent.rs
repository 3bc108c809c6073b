//! Path queries for a single agent

use std::collections::HashSet;
use std::path::Path as FsPath;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::navmesh::TriangleNode;
use crate::scene::{ClearanceTester, GroundProjector};
use crate::spatial::{ChunkIndex, Locator};

use super::astar::{self, SearchLimits, SearchStop};
use super::simplify::simplify;

/// How the raw node sequence is rebuilt after a successful search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathReconstruction {
    /// Follow parent links back from the goal
    #[default]
    BackPointers,
    /// Every expanded node in expansion order, then the goal
    ExpansionOrder,
}

/// Agent dimensions and search limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParams {
    pub width: f32,
    pub height: f32,
    /// Ground probe length and search radius around the start
    pub perception_radius: f32,
    pub max_tries: usize,
    pub time_budget_ms: u64,
    pub reconstruction: PathReconstruction,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            width: 0.5,
            height: 1.8,
            perception_radius: 50.0,
            max_tries: 2000,
            time_budget_ms: 10_000,
            reconstruction: PathReconstruction::default(),
        }
    }
}

impl AgentParams {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<FsPath>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: AgentParams = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.perception_radius <= 0.0 {
            return Err(Error::InvalidConfig("perception_radius must be positive".into()));
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(Error::InvalidConfig("agent extents must not be negative".into()));
        }
        Ok(())
    }
}

/// Why no path was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathFailure {
    #[error("start position is not above ground")]
    StartOffGround,

    #[error("destination is not above ground")]
    DestinationOffGround,

    #[error("no triangle near the start")]
    NoStartNode,

    #[error("no triangle near the destination")]
    NoDestinationNode,

    #[error("destination unreachable: {0}")]
    Unreachable(SearchStop),
}

/// A found path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    /// Simplified waypoints, first is the start node center
    pub waypoints: Vec<Vec3>,
    /// Node centers as produced by the search
    pub raw: Vec<Vec3>,
    /// Nodes expanded by the search
    pub expanded: usize,
    pub cost: f32,
    pub start_node: Locator,
    pub goal_node: Locator,
}

/// Finds paths across the triangle graph
#[derive(Debug, Clone, Default)]
pub struct PathfindingAgent {
    pub params: AgentParams,
}

impl PathfindingAgent {
    pub fn new(params: AgentParams) -> Self {
        Self { params }
    }

    /// Path from `start` to `destination`.
    ///
    /// Both points are projected onto the ground and snapped to the closest
    /// triangle center before searching.
    pub fn find_path<S: GroundProjector + ClearanceTester>(
        &self,
        start: Vec3,
        destination: Vec3,
        triangles: &ChunkIndex<TriangleNode>,
        scene: &S,
    ) -> std::result::Result<Path, PathFailure> {
        let probe = self.params.perception_radius;
        let ground_start = scene
            .project_down(start, probe)
            .ok_or(PathFailure::StartOffGround)?;
        let ground_dest = scene
            .project_down(destination, probe)
            .ok_or(PathFailure::DestinationOffGround)?;

        let start_node = nearest_node(triangles, ground_start).ok_or(PathFailure::NoStartNode)?;
        let goal_node = nearest_node(triangles, ground_dest).ok_or(PathFailure::NoDestinationNode)?;
        log::debug!("Path query {} -> {}", start_node, goal_node);

        let limits = SearchLimits {
            origin: start,
            perception_radius: self.params.perception_radius,
            max_tries: self.params.max_tries,
            time_budget: Duration::from_millis(self.params.time_budget_ms),
        };
        let result = astar::search(triangles, start_node, goal_node, &limits, self.params.reconstruction)
            .map_err(PathFailure::Unreachable)?;

        let waypoints = simplify(&result.raw, scene, self.params.width, self.params.height);
        Ok(Path {
            waypoints,
            raw: result.raw,
            expanded: result.expanded,
            cost: result.cost,
            start_node,
            goal_node,
        })
    }
}

/// Closest triangle center to `pos` over the 3×3×3 block of leaves around it
pub fn nearest_node(triangles: &ChunkIndex<TriangleNode>, pos: Vec3) -> Option<Locator> {
    let width = triangles.leaf_width();
    let mut visited = HashSet::new();
    let mut best: Option<(f32, Locator)> = None;

    for dx in -1..=1 {
        for dz in -1..=1 {
            for dy in -1..=1 {
                let probe = pos + width * Vec3::new(dx as f32, dy as f32, dz as f32);
                let (chunk, leaf) = triangles.locate(probe);
                if !visited.insert((chunk, leaf)) {
                    continue;
                }
                let cell = Locator::new(chunk, leaf, 0);
                let Ok(nodes) = triangles.leaf(&cell) else {
                    continue;
                };
                for (slot, node) in nodes.iter().enumerate() {
                    let dist = pos.distance(node.center);
                    if best.is_none_or(|(d, _)| dist < d) {
                        best = Some((dist, cell.with_slot(slot)));
                    }
                }
            }
        }
    }

    best.map(|(_, locator)| locator)
}
