//! Stage identifiers, work items and per-stage resumable state

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spatial::ChunkCoord;

use super::entity::EntityId;

/// One processing step of the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    /// Drop faces steeper than the walkable slope
    CullSteepTriangles,
    /// Local to world, snap X/Z to the grid
    TransformVertices,
    /// Append vertices to the vertex index
    InsertVertices,
    /// Find near-duplicate vertices per leaf
    BuildMergeMap,
    /// Redirect entity vertex locators through the merge map
    MergeVertices,
    /// Create triangle nodes and corner bookkeeping
    InsertTriangles,
    /// Link triangles that share a corner
    LinkNeighbors,
}

impl StageId {
    pub fn name(&self) -> &'static str {
        match self {
            StageId::CullSteepTriangles => "cull_steep_triangles",
            StageId::TransformVertices => "transform_vertices",
            StageId::InsertVertices => "insert_vertices",
            StageId::BuildMergeMap => "build_merge_map",
            StageId::MergeVertices => "merge_vertices",
            StageId::InsertTriangles => "insert_triangles",
            StageId::LinkNeighbors => "link_neighbors",
        }
    }

    /// What a backlog column expands into for this stage
    pub fn work_source(&self) -> WorkSource {
        match self {
            StageId::BuildMergeMap => WorkSource::VertexChunks,
            StageId::LinkNeighbors => WorkSource::TriangleChunks,
            _ => WorkSource::Entities,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stages per build level, indexed by level (0 = innermost ring).
/// Order within a level is execution order.
pub const STAGE_PLAN: [&[StageId]; 4] = [
    &[StageId::LinkNeighbors],
    &[StageId::MergeVertices, StageId::InsertTriangles],
    &[StageId::BuildMergeMap],
    &[StageId::CullSteepTriangles, StageId::TransformVertices, StageId::InsertVertices],
];

/// Stage at `(level, order)`; levels past the plan have no stages
pub fn stage_at(level: usize, order: usize) -> Option<StageId> {
    STAGE_PLAN.get(level)?.get(order).copied()
}

/// Where a stage's work items come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkSource {
    /// Live entities occupying the column
    Entities,
    /// Vertex-index chunks under the column
    VertexChunks,
    /// Triangle-index chunks under the column
    TriangleChunks,
}

/// A queued unit of stage work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkItem {
    Entity(EntityId),
    Chunk(ChunkCoord),
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::Entity(id) => write!(f, "entity {id}"),
            WorkItem::Chunk(coord) => write!(f, "chunk {coord}"),
        }
    }
}

/// Result of running a stage against its front item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Budget ran out; resume at this cursor next time
    Continue(usize),
    /// Item finished
    Complete,
}

/// Queue and resumable progress of one `(level, order)` stage
#[derive(Debug, Clone)]
pub struct StageState {
    pub stage: StageId,
    pub queue: VecDeque<WorkItem>,
    /// Next unprocessed index within the front item
    pub cursor: usize,
    /// Whether the last run finished its item
    pub done: bool,
}

impl StageState {
    pub fn new(stage: StageId) -> Self {
        Self {
            stage,
            queue: VecDeque::new(),
            cursor: 0,
            done: false,
        }
    }

    pub fn front(&self) -> Option<WorkItem> {
        self.queue.front().copied()
    }

    /// Record an outcome for the front item; a finished item is popped
    /// and the cursor reset
    pub fn apply(&mut self, outcome: StepOutcome) -> Option<WorkItem> {
        match outcome {
            StepOutcome::Continue(cursor) => {
                self.cursor = cursor;
                self.done = false;
                None
            }
            StepOutcome::Complete => {
                self.cursor = 0;
                self.done = true;
                self.queue.pop_front()
            }
        }
    }
}
