//! Stage implementations and dispatch
//!
//! Every resumable stage takes the cursor it stopped at, processes items
//! until its [`WorkBudget`] trips, and returns either the next unprocessed
//! index or [`StepOutcome::Complete`]. At least one item is processed per run.

pub mod geometry;
pub mod vertices;
pub mod triangles;

use crate::core::types::Result;
use crate::scene::ClearanceTester;
use crate::streaming::WorkBudget;

use super::config::NavConfig;
use super::entity::EntityRegistry;
use super::graph::NavGraph;
use super::stage::{StageId, StepOutcome, WorkItem};

/// Everything a stage may touch during one run
pub struct StageContext<'a> {
    pub config: &'a NavConfig,
    pub registry: &'a mut EntityRegistry,
    pub graph: &'a mut NavGraph,
    pub clearance: Option<&'a dyn ClearanceTester>,
}

/// Run `stage` against `item`, resuming at `cursor`
pub fn run(
    stage: StageId,
    item: WorkItem,
    cursor: usize,
    budget: &mut WorkBudget,
    ctx: &mut StageContext<'_>,
) -> Result<StepOutcome> {
    match (stage, item) {
        (StageId::CullSteepTriangles, WorkItem::Entity(id)) => {
            let entity = ctx.registry.get_mut(id)?;
            Ok(geometry::cull_steep_triangles(entity, ctx.config.max_slope_deg))
        }
        (StageId::TransformVertices, WorkItem::Entity(id)) => {
            let entity = ctx.registry.get_mut(id)?;
            Ok(geometry::transform_vertices(entity, ctx.config.snap_grid))
        }
        (StageId::InsertVertices, WorkItem::Entity(id)) => {
            let entity = ctx.registry.get_mut(id)?;
            Ok(vertices::insert_vertices(entity, &mut ctx.graph.vertices, cursor, budget))
        }
        (StageId::BuildMergeMap, WorkItem::Chunk(coord)) => {
            vertices::build_merge_map(coord, ctx.graph, ctx.config.merge_threshold, cursor, budget)
        }
        (StageId::MergeVertices, WorkItem::Entity(id)) => {
            let entity = ctx.registry.get_mut(id)?;
            vertices::merge_vertices(entity, ctx.graph, ctx.config.merge_threshold, cursor, budget)
        }
        (StageId::InsertTriangles, WorkItem::Entity(id)) => {
            triangles::insert_triangles(id, ctx.registry, ctx.graph, cursor, budget)
        }
        (StageId::LinkNeighbors, WorkItem::Chunk(coord)) => {
            let gate = ctx
                .clearance
                .filter(|_| ctx.config.link_requires_clearance)
                .map(|tester| (tester, ctx.config.link_probe_height));
            triangles::link_neighbors(coord, ctx.graph, gate, cursor, budget)
        }
        (stage, item) => {
            log::warn!("Stage {} cannot process {}, dropping it", stage, item);
            Ok(StepOutcome::Complete)
        }
    }
}

/// Count the item just finished and yield if more remain and the budget is spent
pub(crate) fn checkpoint(budget: &mut WorkBudget, next: usize, len: usize) -> Option<StepOutcome> {
    budget.record_item();
    (next < len && budget.exhausted()).then_some(StepOutcome::Continue(next))
}
