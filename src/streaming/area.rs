//! Concentric rings of chunk columns around an observer
//!
//! Ring `i` covers the Chebyshev band `(cum(i-1), cum(i)]` around the
//! observer's column, where `cum(i)` is the sum of the first `i + 1` widths.
//! Ring 0 also holds the observer's own column. Membership is recomputed in
//! full whenever the observer crosses into another column.
//!
//! Rings are sticky: a column the observer walks away from keeps its ring.
//! A ring records the deepest build level a column has been scheduled for,
//! so columns only ever migrate inward.

use std::collections::HashSet;

use crate::core::types::Vec3;
use crate::spatial::{ChunkCoord, ColumnCoord};

use super::change::ChangeDetector;

/// Tracks ring membership and the per-ring backlog of newly added columns
#[derive(Debug)]
pub struct AreaTracker {
    chunk_size: f32,
    widths: Vec<i32>,
    current_chunk: ChunkCoord,
    column: ChangeDetector<ColumnCoord>,
    rings: Vec<HashSet<ColumnCoord>>,
    pending: Vec<Vec<ColumnCoord>>,
    /// Set once the first recompute has run
    primed: bool,
}

impl AreaTracker {
    /// Create a tracker and compute the initial rings around `observer`
    pub fn new(chunk_size: f32, ring_widths: &[u32], observer: Vec3) -> Self {
        let current_chunk = ChunkCoord::from_world_pos(observer, chunk_size);
        let levels = ring_widths.len();
        let mut tracker = Self {
            chunk_size,
            widths: ring_widths.iter().map(|&w| w as i32).collect(),
            current_chunk,
            column: ChangeDetector::new(current_chunk.column()),
            rings: vec![HashSet::new(); levels],
            pending: vec![Vec::new(); levels],
            primed: false,
        };
        tracker.recompute();
        tracker
    }

    /// Sample the observer. Returns true when the rings were recomputed.
    pub fn update(&mut self, observer: Vec3) -> bool {
        self.current_chunk = ChunkCoord::from_world_pos(observer, self.chunk_size);
        if self.column.update(self.current_chunk.column()) {
            log::debug!("Observer entered column {}, recomputing rings", self.current_chunk.column());
            self.recompute();
            true
        } else {
            false
        }
    }

    fn recompute(&mut self) {
        let center = self.current_chunk.column();
        let levels = self.rings.len();
        let mut inner = -1;
        let mut outer = 0;

        for level in 0..levels {
            outer += self.widths[level];
            for z in (center.z - outer)..=(center.z + outer) {
                for x in (center.x - outer)..=(center.x + outer) {
                    let pos = ColumnCoord::new(x, z);
                    if center.chebyshev_distance(pos) <= inner {
                        continue;
                    }
                    if self.rings[..level].iter().any(|ring| ring.contains(&pos)) {
                        continue;
                    }

                    let mut previous = None;
                    for (k, ring) in self.rings.iter_mut().enumerate().skip(level + 1) {
                        if ring.remove(&pos) {
                            previous = Some(k);
                        }
                    }

                    if self.rings[level].insert(pos) {
                        // A jump can place a never-seen column straight into an
                        // inner ring; it still owes the work of every outer level.
                        let owed_to = match previous {
                            Some(k) => k,
                            None if self.primed => levels,
                            None => level + 1,
                        };
                        for backlog in &mut self.pending[level..owed_to] {
                            backlog.push(pos);
                        }
                    }
                }
            }
            inner = outer;
        }

        self.primed = true;
    }

    /// Move pending per-level columns into caller buffers and clear them.
    ///
    /// With `initial`, each level first absorbs the (already accumulated)
    /// backlog of the level below, so the outermost level receives the whole
    /// footprint. Used once to seed a fresh pipeline.
    pub fn dump_into(&mut self, out: &mut [Vec<ColumnCoord>], initial: bool) {
        for level in 0..self.pending.len() {
            if initial && level > 0 {
                let (lower, upper) = self.pending.split_at_mut(level);
                upper[0].extend_from_slice(&lower[level - 1]);
            }
            if let Some(buffer) = out.get_mut(level) {
                buffer.extend_from_slice(&self.pending[level]);
            }
        }
        for backlog in &mut self.pending {
            backlog.clear();
        }
    }

    /// Push an already tracked column onto every backlog from the outermost
    /// level down to its ring, skipping backlogs that already hold it.
    ///
    /// For geometry that appears in a column after the column was swept.
    /// Returns false if the column is not in any ring.
    pub fn reschedule(&self, column: ColumnCoord, out: &mut [Vec<ColumnCoord>]) -> bool {
        let Some(ring) = self.ring_of(column) else {
            return false;
        };
        for backlog in out.iter_mut().skip(ring) {
            if !backlog.contains(&column) {
                backlog.push(column);
            }
        }
        true
    }

    /// Whether the last update moved the observer into another column
    pub fn is_dirty(&self) -> bool {
        self.column.is_changed()
    }

    pub fn current_chunk(&self) -> ChunkCoord {
        self.current_chunk
    }

    pub fn level_count(&self) -> usize {
        self.rings.len()
    }

    pub fn ring(&self, level: usize) -> Option<&HashSet<ColumnCoord>> {
        self.rings.get(level)
    }

    /// Ring currently holding a column
    pub fn ring_of(&self, column: ColumnCoord) -> Option<usize> {
        self.rings.iter().position(|ring| ring.contains(&column))
    }

    /// Columns waiting to be dumped at a level
    pub fn pending_len(&self, level: usize) -> usize {
        self.pending.get(level).map_or(0, Vec::len)
    }

    /// Outer Chebyshev radius of a ring's band
    pub fn cumulative_width(&self, level: usize) -> i32 {
        self.widths.iter().take(level + 1).sum()
    }

    /// Sorted copy of every ring, for inspection
    pub fn snapshot(&self) -> Vec<Vec<ColumnCoord>> {
        self.rings
            .iter()
            .map(|ring| {
                let mut columns: Vec<_> = ring.iter().copied().collect();
                columns.sort();
                columns
            })
            .collect()
    }
}
