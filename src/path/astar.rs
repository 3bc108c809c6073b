//! A* over triangle centers

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::navmesh::TriangleNode;
use crate::spatial::{ChunkIndex, Locator};

use super::agent::PathReconstruction;

/// Why a search gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStop {
    OpenListExhausted,
    TryLimit,
    TimeBudget,
}

impl fmt::Display for SearchStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStop::OpenListExhausted => write!(f, "open list exhausted"),
            SearchStop::TryLimit => write!(f, "try limit reached"),
            SearchStop::TimeBudget => write!(f, "time budget exceeded"),
        }
    }
}

/// Bounds on a single search
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    /// Agent position; neighbors farther than `perception_radius` from it are ignored
    pub origin: Vec3,
    pub perception_radius: f32,
    pub max_tries: usize,
    pub time_budget: Duration,
}

/// A successful search
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Node centers from start to goal, goal included
    pub raw: Vec<Vec3>,
    /// Accumulated distance to the goal
    pub cost: f32,
    /// Number of nodes moved to the closed list
    pub expanded: usize,
}

struct SearchNode {
    locator: Locator,
    pos: Vec3,
    prev: Option<usize>,
    g: f32,
    h: f32,
}

impl SearchNode {
    fn f(&self) -> f32 {
        self.g + self.h
    }
}

/// Search from `start` to `goal`.
///
/// The open list is scanned linearly and the first minimum F wins. The
/// search succeeds as soon as the goal is discovered as a neighbor.
pub fn search(
    triangles: &ChunkIndex<TriangleNode>,
    start: Locator,
    goal: Locator,
    limits: &SearchLimits,
    reconstruction: PathReconstruction,
) -> Result<SearchResult, SearchStop> {
    let started = Instant::now();
    let Ok(goal_node) = triangles.get(&goal) else {
        return Err(SearchStop::OpenListExhausted);
    };
    let goal_pos = goal_node.center;
    let Ok(start_node) = triangles.get(&start) else {
        return Err(SearchStop::OpenListExhausted);
    };
    if start == goal {
        return Ok(SearchResult {
            raw: vec![goal_pos],
            cost: 0.0,
            expanded: 0,
        });
    }

    let mut nodes = vec![SearchNode {
        locator: start,
        pos: start_node.center,
        prev: None,
        g: 0.0,
        h: start_node.center.distance(goal_pos),
    }];

    let mut open: Vec<usize> = vec![0];
    let mut closed: Vec<usize> = Vec::new();
    let mut queued: HashSet<Locator> = HashSet::from([start]);
    let mut reached: Option<usize> = None;
    let mut tries = 0usize;

    loop {
        let mut best = 0;
        for (i, &node) in open.iter().enumerate().skip(1) {
            if nodes[node].f() < nodes[open[best]].f() {
                best = i;
            }
        }
        let current = open.remove(best);

        if let Ok(triangle) = triangles.get(&nodes[current].locator) {
            for &neighbor in triangle.neighbors() {
                if !queued.insert(neighbor) {
                    continue;
                }
                let Ok(neighbor_node) = triangles.get(&neighbor) else {
                    continue;
                };
                let pos = neighbor_node.center;
                if limits.origin.distance(pos) > limits.perception_radius {
                    continue;
                }

                let g = nodes[current].g + nodes[current].pos.distance(pos);
                nodes.push(SearchNode {
                    locator: neighbor,
                    pos,
                    prev: Some(current),
                    g,
                    h: pos.distance(goal_pos),
                });
                open.push(nodes.len() - 1);

                if neighbor == goal {
                    reached = Some(nodes.len() - 1);
                    break;
                }
            }
        }

        closed.push(current);
        tries += 1;

        if let Some(goal_index) = reached {
            log::debug!("Path found after {} expansions", closed.len());
            let raw = match reconstruction {
                PathReconstruction::BackPointers => {
                    let mut raw = Vec::new();
                    let mut cursor = Some(goal_index);
                    while let Some(i) = cursor {
                        raw.push(nodes[i].pos);
                        cursor = nodes[i].prev;
                    }
                    raw.reverse();
                    raw
                }
                PathReconstruction::ExpansionOrder => closed
                    .iter()
                    .map(|&i| nodes[i].pos)
                    .chain(std::iter::once(goal_pos))
                    .collect(),
            };
            return Ok(SearchResult {
                raw,
                cost: nodes[goal_index].g,
                expanded: closed.len(),
            });
        }

        let stop = if tries > limits.max_tries {
            Some(SearchStop::TryLimit)
        } else if open.is_empty() {
            Some(SearchStop::OpenListExhausted)
        } else if started.elapsed() > limits.time_budget {
            Some(SearchStop::TimeBudget)
        } else {
            None
        };
        if let Some(stop) = stop {
            log::debug!("Search stopped after {} expansions: {}", closed.len(), stop);
            return Err(stop);
        }
    }
}
