//! Triangle node creation and neighbor linking

use crate::core::types::{Result, Vec3};
use crate::navmesh::entity::{EntityId, EntityRegistry};
use crate::navmesh::graph::NavGraph;
use crate::navmesh::node::TriangleNode;
use crate::navmesh::stage::StepOutcome;
use crate::scene::ClearanceTester;
use crate::spatial::{ChunkCoord, Locator};
use crate::streaming::WorkBudget;

use super::checkpoint;

/// Insert a node per triangle of the entity and record corner usage.
///
/// Triangles whose corners cannot be resolved are skipped. Resumable per
/// triangle. On completion the entity is vacated and retired.
pub fn insert_triangles(
    id: EntityId,
    registry: &mut EntityRegistry,
    graph: &mut NavGraph,
    cursor: usize,
    budget: &mut WorkBudget,
) -> Result<StepOutcome> {
    let entity = registry.get(id)?;
    let len = entity.corner_locators.len();

    for t in cursor..len {
        let corners = entity.corner_locators[t];
        match corner_positions(graph, &corners) {
            Ok([a, b, c]) => {
                let center = (a + b + c) / 3.0;
                let node = graph.triangles.add(TriangleNode::new(center, corners), center);
                for corner in corners {
                    graph.add_corner_use(corner, node);
                }
            }
            Err(err) if err.is_not_found() => {
                log::trace!("Entity {}: skipping triangle {}: {}", id, t, err);
            }
            Err(err) => return Err(err),
        }
        if let Some(outcome) = checkpoint(budget, t + 1, len) {
            return Ok(outcome);
        }
    }

    registry.retire(id)?;
    Ok(StepOutcome::Complete)
}

fn corner_positions(graph: &NavGraph, corners: &[Locator; 3]) -> Result<[Vec3; 3]> {
    Ok([
        graph.vertex(&corners[0])?,
        graph.vertex(&corners[1])?,
        graph.vertex(&corners[2])?,
    ])
}

/// Link every pair of triangles sharing a corner, for the triangles of one chunk.
///
/// A corner's triangle list is consumed by the first triangle that visits
/// it, which links the whole list at once. With `gate`, a pair is only
/// linked when the clearance tester sees a free line between the centers
/// lifted by the given height. Resumable per leaf.
pub fn link_neighbors(
    coord: ChunkCoord,
    graph: &mut NavGraph,
    gate: Option<(&dyn ClearanceTester, f32)>,
    cursor: usize,
    budget: &mut WorkBudget,
) -> Result<StepOutcome> {
    let leaf_count = graph.triangles.chunk(coord)?.leaf_count();

    for leaf in cursor..leaf_count {
        let slots = graph.triangles.chunk(coord)?.leaf(leaf).len();
        if slots == 0 {
            continue;
        }

        for slot in 0..slots {
            let corners = graph.triangles.get(&Locator::new(coord, leaf, slot))?.corners;
            for corner in corners {
                let Some(users) = graph.corner_map.remove(corner.chunk, &corner.leaf_slot()) else {
                    continue;
                };
                for (k, &a) in users.iter().enumerate() {
                    for &b in &users[k + 1..] {
                        link_pair(graph, a, b, gate)?;
                    }
                }
            }
        }

        if let Some(outcome) = checkpoint(budget, leaf + 1, leaf_count) {
            return Ok(outcome);
        }
    }
    Ok(StepOutcome::Complete)
}

fn link_pair(graph: &mut NavGraph, a: Locator, b: Locator, gate: Option<(&dyn ClearanceTester, f32)>) -> Result<()> {
    if let Some((tester, lift)) = gate {
        let up = Vec3::Y * lift;
        let from = graph.triangle(&a)?.center + up;
        let to = graph.triangle(&b)?.center + up;
        if !tester.is_clear(from, to, 0.0, 0.0) {
            log::trace!("Link {} - {} blocked", a, b);
            return Ok(());
        }
    }
    match graph.link(a, b) {
        Ok(_) => Ok(()),
        Err(err) if err.is_not_found() => {
            log::trace!("Link {} - {} skipped: {}", a, b, err);
            Ok(())
        }
        Err(err) => Err(err),
    }
}
