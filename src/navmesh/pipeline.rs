//! Time-sliced build scheduler
//!
//! Levels map 1:1 to tracker rings and run outer (highest index) to inner.
//! Each step scans the levels from the outside in and stops at the first one
//! with anything to do: a non-empty area backlog is expanded into work items
//! for every stage of that level, otherwise the first stage with queued work
//! runs against its front item under a fresh [`WorkBudget`]. Exactly one of
//! these happens per step.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::spatial::ColumnCoord;
use crate::streaming::WorkBudget;

use super::entity::PipelinePosition;
use super::stage::{StageId, StageState, StepOutcome, WorkItem, WorkSource, STAGE_PLAN};
use super::stages::{self, StageContext};

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepAction {
    /// Nothing queued anywhere
    Idle,
    /// A level's backlog was turned into work items
    Enqueued { level: usize, columns: usize, items: usize },
    /// A stage ran against its front item
    Ran {
        level: usize,
        order: usize,
        stage: StageId,
        item: WorkItem,
        outcome: StepOutcome,
    },
}

/// Result of [`BuildPipeline::step`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub action: StepAction,
    pub elapsed_ms: f32,
}

/// Cumulative pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub steps: u64,
    pub items_enqueued: u64,
    pub items_completed: u64,
    /// Steps that ended with a checkpoint
    pub resumptions: u64,
    /// Lookup misses absorbed as completed items
    pub absorbed_misses: u64,
    pub budget_overruns: u64,
}

/// Per-level stage queues plus the area backlog feeding them
#[derive(Debug)]
pub struct BuildPipeline {
    stages: Vec<Vec<StageState>>,
    backlogs: Vec<Vec<ColumnCoord>>,
    stats: PipelineStats,
}

impl BuildPipeline {
    /// Pipeline with `level_count` levels. Levels beyond the stage plan
    /// have no stages and simply drain their backlog.
    pub fn new(level_count: usize) -> Self {
        let stages = (0..level_count)
            .map(|level| {
                STAGE_PLAN
                    .get(level)
                    .map(|plan| plan.iter().map(|&stage| StageState::new(stage)).collect())
                    .unwrap_or_default()
            })
            .collect();
        Self {
            stages,
            backlogs: vec![Vec::new(); level_count],
            stats: PipelineStats::default(),
        }
    }

    pub fn level_count(&self) -> usize {
        self.stages.len()
    }

    /// Area backlog buffers, one per level, for the tracker to dump into
    pub fn backlogs_mut(&mut self) -> &mut [Vec<ColumnCoord>] {
        &mut self.backlogs
    }

    pub fn backlog_len(&self, level: usize) -> usize {
        self.backlogs.get(level).map_or(0, Vec::len)
    }

    /// Queue length of every stage, per level
    pub fn queue_depths(&self) -> Vec<Vec<(StageId, usize)>> {
        self.stages
            .iter()
            .map(|level| level.iter().map(|s| (s.stage, s.queue.len())).collect())
            .collect()
    }

    pub fn stage_state(&self, level: usize, order: usize) -> Option<&StageState> {
        self.stages.get(level)?.get(order)
    }

    /// No backlog and no queued work
    pub fn is_idle(&self) -> bool {
        self.backlogs.iter().all(Vec::is_empty)
            && self.stages.iter().flatten().all(|s| s.queue.is_empty())
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Advance the build by one unit of work
    pub fn step(&mut self, ctx: &mut StageContext<'_>) -> StepReport {
        let started = Instant::now();
        self.stats.steps += 1;

        let mut action = StepAction::Idle;
        for level in (0..self.level_count()).rev() {
            if !self.backlogs[level].is_empty() {
                action = self.expand_backlog(level, ctx);
                break;
            }
            if let Some(order) = self.stages[level].iter().position(|s| !s.queue.is_empty()) {
                action = self.run_stage(level, order, ctx);
                break;
            }
        }

        StepReport {
            action,
            elapsed_ms: started.elapsed().as_secs_f32() * 1000.0,
        }
    }

    fn expand_backlog(&mut self, level: usize, ctx: &mut StageContext<'_>) -> StepAction {
        let columns = std::mem::take(&mut self.backlogs[level]);
        let mut items = 0;

        for (order, state) in self.stages[level].iter_mut().enumerate() {
            let position = PipelinePosition::new(level, order);
            for &column in &columns {
                match state.stage.work_source() {
                    WorkSource::Entities => {
                        for id in ctx.registry.entities_in_column(column) {
                            let Ok(entity) = ctx.registry.get_mut(id) else {
                                continue;
                            };
                            if !entity.should_enqueue(position) {
                                continue;
                            }
                            entity.last_enqueued = Some(position);
                            state.queue.push_back(WorkItem::Entity(id));
                            items += 1;
                        }
                    }
                    WorkSource::VertexChunks => {
                        for chunk in ctx.graph.vertices.chunks_in_column(column) {
                            state.queue.push_back(WorkItem::Chunk(chunk));
                            items += 1;
                        }
                    }
                    WorkSource::TriangleChunks => {
                        for chunk in ctx.graph.triangles.chunks_in_column(column) {
                            state.queue.push_back(WorkItem::Chunk(chunk));
                            items += 1;
                        }
                    }
                }
            }
        }

        self.stats.items_enqueued += items as u64;
        log::debug!("Level {}: {} columns -> {} work items", level, columns.len(), items);
        StepAction::Enqueued {
            level,
            columns: columns.len(),
            items,
        }
    }

    fn run_stage(&mut self, level: usize, order: usize, ctx: &mut StageContext<'_>) -> StepAction {
        let state = &mut self.stages[level][order];
        let stage = state.stage;
        // Caller picked a non-empty queue
        let Some(item) = state.front() else {
            return StepAction::Idle;
        };

        let mut budget = WorkBudget::new(ctx.config.work_budget_ms, ctx.config.max_items_per_step);
        let outcome = match stages::run(stage, item, state.cursor, &mut budget, ctx) {
            Ok(outcome) => outcome,
            Err(err) if err.is_not_found() => {
                log::debug!("{} on {}: {}, skipping", stage, item, err);
                self.stats.absorbed_misses += 1;
                StepOutcome::Complete
            }
            Err(err) => {
                log::warn!("{} on {} failed: {}, dropping item", stage, item, err);
                StepOutcome::Complete
            }
        };

        if let Some(over) = budget.overrun() {
            self.stats.budget_overruns += 1;
            log::warn!(
                "{} on {} ran {:.2}ms, {:.2}ms over budget",
                stage,
                item,
                budget.elapsed_ms(),
                over.as_secs_f32() * 1000.0
            );
        }

        match state.apply(outcome) {
            Some(_) => self.stats.items_completed += 1,
            None => self.stats.resumptions += 1,
        }
        log::trace!("L{} {} on {}: {:?} after {} items", level, stage, item, outcome, budget.items());

        StepAction::Ran {
            level,
            order,
            stage,
            item,
            outcome,
        }
    }
}
