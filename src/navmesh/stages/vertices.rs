//! Vertex insertion and welding

use crate::core::types::{Result, Vec3};
use crate::navmesh::entity::SourceEntity;
use crate::navmesh::graph::NavGraph;
use crate::navmesh::stage::StepOutcome;
use crate::spatial::{ChunkCoord, ChunkIndex, ChunkKeyedMap, LeafSlot};
use crate::streaming::WorkBudget;

use super::checkpoint;

/// Same snapped X/Z and vertically closer than `threshold`
pub fn is_near(a: Vec3, b: Vec3, threshold: f32) -> bool {
    a.x == b.x && a.z == b.z && (a.y - b.y).abs() < threshold
}

/// Append the entity's world-space vertices to the vertex index,
/// recording one locator per vertex. Resumable per vertex.
pub fn insert_vertices(
    entity: &mut SourceEntity,
    index: &mut ChunkIndex<Vec3>,
    cursor: usize,
    budget: &mut WorkBudget,
) -> StepOutcome {
    if cursor == 0 {
        entity.vertex_locators.clear();
        entity.vertex_locators.reserve(entity.vertices.len());
    }
    debug_assert_eq!(entity.vertex_locators.len(), cursor);

    let len = entity.vertices.len();
    for i in cursor..len {
        let vertex = entity.vertices[i];
        entity.vertex_locators.push(index.add(vertex, vertex));
        if let Some(outcome) = checkpoint(budget, i + 1, len) {
            return outcome;
        }
    }
    StepOutcome::Complete
}

/// Earliest vertex of a leaf that `j` welds to.
///
/// `j` maps to the first earlier vertex it is near, which in turn maps to
/// its own first near vertex, down to a vertex with none.
fn weld_root(values: &[Vec3], mut j: usize, threshold: f32) -> usize {
    while let Some(i) = values[..j].iter().position(|&v| is_near(v, values[j], threshold)) {
        j = i;
    }
    j
}

/// Record merge entries for the slots of one leaf appended since it was
/// last mapped. Slots already mapped are never revisited, so every entry
/// belongs to a vertex whose entity has not merged yet.
fn map_leaf(graph: &mut NavGraph, coord: ChunkCoord, leaf: usize, threshold: f32) -> Result<()> {
    let values = graph.vertices.chunk(coord)?.leaf(leaf);
    let mapped = graph.merge_marks.get(coord, &leaf).copied().unwrap_or(0);
    if mapped >= values.len() {
        return Ok(());
    }

    for j in mapped.max(1)..values.len() {
        let target = weld_root(values, j, threshold);
        if target != j {
            graph.merge_map.insert(coord, LeafSlot::new(leaf, j), target);
        }
    }
    graph.merge_marks.insert(coord, leaf, values.len());
    Ok(())
}

/// Record near-duplicate vertices of one chunk in the merge map.
///
/// Within each leaf, vertex `j` maps to the first earlier vertex `i` it is
/// near. If `i` itself maps further, `j` follows it to the same target.
/// Re-running on a chunk only maps vertices added since. Resumable per leaf.
pub fn build_merge_map(
    coord: ChunkCoord,
    graph: &mut NavGraph,
    threshold: f32,
    cursor: usize,
    budget: &mut WorkBudget,
) -> Result<StepOutcome> {
    let leaf_count = graph.vertices.chunk(coord)?.leaf_count();

    for leaf in cursor..leaf_count {
        if graph.vertices.chunk(coord)?.leaf(leaf).is_empty() {
            continue;
        }
        map_leaf(graph, coord, leaf, threshold)?;

        if let Some(outcome) = checkpoint(budget, leaf + 1, leaf_count) {
            return Ok(outcome);
        }
    }
    Ok(StepOutcome::Complete)
}

/// Redirect vertex locators through the merge map, consuming entries.
///
/// Leaves holding the entity's vertices that have not been mapped yet, such
/// as those in columns outside the merge ring, are mapped first. Resumable
/// per vertex; on completion derives triangle corners.
pub fn merge_vertices(
    entity: &mut SourceEntity,
    graph: &mut NavGraph,
    threshold: f32,
    cursor: usize,
    budget: &mut WorkBudget,
) -> Result<StepOutcome> {
    let len = entity.vertex_locators.len();
    for i in cursor..len {
        let locator = entity.vertex_locators[i];
        match map_leaf(graph, locator.chunk, locator.leaf, threshold) {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                log::trace!("Entity {}: vertex {} has no chunk: {}", entity.id, i, err);
            }
            Err(err) => return Err(err),
        }
        if let Some(target) = graph.merge_map.remove(locator.chunk, &locator.leaf_slot()) {
            entity.vertex_locators[i] = locator.with_slot(target);
        }
        if let Some(outcome) = checkpoint(budget, i + 1, len) {
            return Ok(outcome);
        }
    }
    entity.derive_corner_locators();
    Ok(StepOutcome::Complete)
}
